//! Makefile-driven documentation builds
//!
//! Each build gets a private staging directory under the work dir:
//!
//! ```text
//! <work_dir>/<uuid>/src/   extracted release archive
//! <work_dir>/<uuid>/out/   DESTINATION_FOLDER handed to the build
//! ```
//!
//! On success `out/` is renamed onto the destination. The staging directory
//! is removed on every exit path, cancellation included.

use super::archive;
use super::{build_error_output, BuildParams, BuildPipeline};
use crate::config::schema::BuildConfig;
use crate::error::{DocError, DocResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Runs the configured command (default `make build`) inside each release
#[derive(Debug, Clone)]
pub struct MakePipeline {
    work_dir: PathBuf,
    command: Vec<String>,
    download_timeout: Duration,
}

impl MakePipeline {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            command: config.command.clone(),
            download_timeout: config.timeout(),
        }
    }

    /// Use a different command, e.g. `["make", "docs"]`
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    async fn build_in(
        &self,
        staging: &Staging,
        source_location: &str,
        destination: &Path,
        params: &BuildParams,
    ) -> DocResult<()> {
        let src = staging.dir.join("src");
        let out = staging.dir.join("out");
        for dir in [&src, &out] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| DocError::io(format!("creating {}", dir.display()), e))?;
        }

        let location = source_location.to_string();
        let extract_dir = src.clone();
        let timeout = self.download_timeout;
        let abandoned = staging.abandoned.clone();
        let staging_dir = staging.dir.clone();
        let root = tokio::task::spawn_blocking(move || {
            let result = archive::fetch_and_extract(&location, &extract_dir, timeout)
                .and_then(|()| archive::build_root(&extract_dir));
            // The build was dropped mid-extraction and its guard already ran;
            // whatever was unpacked since then is ours to remove
            if abandoned.load(Ordering::SeqCst) {
                remove_staging(&staging_dir);
            }
            result
        })
        .await
        .map_err(|e| DocError::Internal(format!("archive task failed: {}", e)))??;

        self.run_command(&root, &out, params).await?;
        publish(&out, destination).await
    }

    async fn run_command(&self, root: &Path, out: &Path, params: &BuildParams) -> DocResult<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| DocError::Internal("build.command is empty".to_string()))?;
        let command_line = self.command.join(" ");

        debug!("Running {} in {}", command_line, root.display());
        let output = Command::new(program)
            .args(args)
            .current_dir(root)
            .env("DESTINATION_FOLDER", out)
            .env("BASE_URL", &params.base_url)
            .env("SHARED_REPO_FOLDER", &params.shared_resource_folder)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DocError::command_failed(&command_line, e))?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocError::command_exec(
                format!("{} ({})", command_line, output.status),
                build_error_output(&stdout, &stderr),
            ));
        }

        Ok(())
    }
}

/// Move a finished build onto `destination`.
///
/// If another build published first, the staged copy is left to be cleaned
/// up with the staging directory.
async fn publish(out: &Path, destination: &Path) -> DocResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DocError::io(format!("creating {}", parent.display()), e))?;
    }

    if destination.exists() {
        info!("{} already published, discarding build", destination.display());
        return Ok(());
    }

    match fs::rename(out, destination).await {
        Ok(()) => Ok(()),
        Err(_) if destination.is_dir() => Ok(()),
        Err(e) => Err(DocError::io(
            format!("publishing {} to {}", out.display(), destination.display()),
            e,
        )),
    }
}

/// Removes the staging directory when dropped.
///
/// Extraction runs on a blocking thread that outlives a cancelled build;
/// `abandoned` tells it to clean up after itself once it finishes.
struct Staging {
    dir: PathBuf,
    abandoned: Arc<AtomicBool>,
}

impl Staging {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            abandoned: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        // Flag first so a still-running extraction sees it after its last write
        self.abandoned.store(true, Ordering::SeqCst);
        remove_staging(&self.dir);
    }
}

fn remove_staging(dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove staging dir {}: {}", dir.display(), e);
        }
    }
}

#[async_trait]
impl BuildPipeline for MakePipeline {
    async fn build(
        &self,
        source_location: &str,
        destination: &Path,
        params: &BuildParams,
    ) -> DocResult<()> {
        let staging = Staging::new(self.work_dir.join(Uuid::new_v4().to_string()));
        info!("Building {} into {}", source_location, destination.display());
        self.build_in(&staging, source_location, destination, params)
            .await
    }

    fn pipeline_name(&self) -> &'static str {
        "make"
    }
}
