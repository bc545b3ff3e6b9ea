//! Release archive download and extraction

use crate::error::{DocError, DocResult};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("docsrv/", env!("CARGO_PKG_VERSION"));

/// Download (or open) a `.tar.gz` and unpack it into `dest`.
///
/// `http://` and `https://` locations are downloaded; `file://` locations and
/// anything else are read from the local filesystem. Blocking; run it on
/// `spawn_blocking`.
pub(super) fn fetch_and_extract(
    source_location: &str,
    dest: &Path,
    timeout: Duration,
) -> DocResult<()> {
    let reader = open(source_location, timeout)?;
    let mut archive = tar::Archive::new(GzDecoder::new(reader));

    archive
        .unpack(dest)
        .map_err(|e| DocError::ArchiveExtract {
            source_location: source_location.to_string(),
            reason: e.to_string(),
        })?;

    debug!("Extracted {} into {}", source_location, dest.display());
    Ok(())
}

fn open(source_location: &str, timeout: Duration) -> DocResult<Box<dyn Read>> {
    if source_location.starts_with("http://") || source_location.starts_with("https://") {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        let agent: ureq::Agent = config.into();

        debug!("Downloading {}", source_location);
        let response = agent
            .get(source_location)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| DocError::Download {
                url: source_location.to_string(),
                reason: e.to_string(),
            })?;
        return Ok(Box::new(response.into_body().into_reader()));
    }

    let path = source_location
        .strip_prefix("file://")
        .unwrap_or(source_location);
    let file = File::open(path)
        .map_err(|e| DocError::io(format!("opening archive {}", path), e))?;
    Ok(Box::new(file))
}

/// Directory the build should run in.
///
/// Hosting services wrap tarball contents in a single `<repo>-<sha>/`
/// directory; descend into it unless a Makefile sits at the top level.
pub(super) fn build_root(extracted: &Path) -> DocResult<PathBuf> {
    if extracted.join("Makefile").is_file() {
        return Ok(extracted.to_path_buf());
    }

    let entries: Vec<PathBuf> = std::fs::read_dir(extracted)
        .map_err(|e| DocError::io(format!("reading {}", extracted.display()), e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();

    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => Ok(extracted.to_path_buf()),
    }
}
