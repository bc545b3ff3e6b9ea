//! Configuration for docsrv
//!
//! The config file is looked up in this order:
//!
//! 1. `--config <path>` or `DOCSRV_CONFIG`
//! 2. `<config dir>/docsrv/config.toml` (`~/.config` on Linux)
//!
//! A missing file means defaults. A present file is parsed and then checked
//! for values no build could run with.

pub mod schema;

pub use schema::Config;

use crate::error::{DocError, DocResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Locates, loads and saves the docsrv config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Manager for an explicit path if one was given, else the default
    pub fn locate(explicit: Option<PathBuf>) -> Self {
        explicit.map_or_else(Self::new, Self::with_path)
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docsrv")
            .join("config.toml")
    }

    /// Base of the default docs, work and shared folders
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docsrv")
    }

    pub async fn load(&self) -> DocResult<Config> {
        if !self.config_path.exists() {
            debug!("No config at {}, using defaults", self.config_path.display());
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    pub async fn load_from_file(&self, path: &Path) -> DocResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| DocError::io(format!("reading config from {}", path.display()), e))?;

        let invalid = |reason: String| DocError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        };
        let config: Config = toml::from_str(&content).map_err(|e| invalid(e.to_string()))?;
        check(&config).map_err(|reason| invalid(reason.to_string()))?;
        Ok(config)
    }

    /// Write `config`, replacing the file in one rename
    pub async fn save(&self, config: &Config) -> DocResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DocError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        let staged = self.config_path.with_extension("toml.tmp");
        fs::write(&staged, content)
            .await
            .map_err(|e| DocError::io(format!("writing {}", staged.display()), e))?;
        fs::rename(&staged, &self.config_path).await.map_err(|e| {
            DocError::io(format!("replacing {}", self.config_path.display()), e)
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Create the docs root and work dir a build writes into
    pub async fn ensure_build_dirs(config: &Config) -> DocResult<()> {
        for dir in [&config.build.docs_root, &config.build.work_dir] {
            fs::create_dir_all(dir).await.map_err(|e| {
                DocError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Values that parse but leave docsrv unable to work
fn check(config: &Config) -> Result<(), &'static str> {
    if config.build.command.is_empty() {
        return Err("build.command is empty");
    }
    if config.build.timeout_secs == 0 {
        return Err("build.timeout_secs must be greater than zero");
    }
    if config.source.timeout_secs == 0 {
        return Err("source.timeout_secs must be greater than zero");
    }
    if !matches!(config.general.log_format.as_str(), "text" | "json") {
        return Err("general.log_format must be \"text\" or \"json\"");
    }
    Ok(())
}
