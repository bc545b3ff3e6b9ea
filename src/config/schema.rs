//! Configuration schema for docsrv
//!
//! Configuration is stored at `~/.config/docsrv/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Release source settings
    pub source: SourceConfig,

    /// Documentation build settings
    pub build: BuildConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Release source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// GitHub API base URL
    pub api_url: String,

    /// Repository owner all projects live under
    pub owner: String,

    /// Upper bound for a single upstream call, in seconds
    pub timeout_secs: u64,

    /// How long a project's release listing is trusted, in seconds
    pub catalog_ttl_secs: u64,

    /// How long a project's resolved latest release is trusted, in seconds
    pub latest_ttl_secs: u64,

    /// Maximum number of listing pages fetched per refresh
    pub max_pages: usize,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    pub fn latest_ttl(&self) -> Duration {
        Duration::from_secs(self.latest_ttl_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            owner: String::new(),
            timeout_secs: 30,
            catalog_ttl_secs: 300,
            latest_ttl_secs: 300,
            max_pages: 10,
        }
    }
}

/// Documentation build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Where built documentation is published (`<docs_root>/<project>/<version>`)
    pub docs_root: PathBuf,

    /// Scratch space for downloads and in-progress builds
    pub work_dir: PathBuf,

    /// Public URL docs are served under, used for cross-links and redirects
    pub base_url: String,

    /// Folder with assets shared by every project's docs
    pub shared_folder: PathBuf,

    /// Command run inside the extracted release
    pub command: Vec<String>,

    /// Upper bound for a whole build, in seconds
    pub timeout_secs: u64,
}

impl BuildConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        let state = crate::config::ConfigManager::state_dir();
        Self {
            docs_root: state.join("docs"),
            work_dir: state.join("work"),
            base_url: "http://localhost:8080".to_string(),
            shared_folder: state.join("shared"),
            command: vec!["make".to_string(), "build".to_string()],
            timeout_secs: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.general.log_format, "text");
        assert_eq!(config.source.api_url, "https://api.github.com");
        assert_eq!(config.source.catalog_ttl(), Duration::from_secs(300));
        assert_eq!(config.build.command, vec!["make", "build"]);
        assert!(config.build.docs_root.ends_with("docs"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            owner = "acme"
            latest_ttl_secs = 60

            [build]
            base_url = "https://docs.acme.dev"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.owner, "acme");
        assert_eq!(config.source.latest_ttl_secs, 60);
        assert_eq!(config.source.catalog_ttl_secs, 300);
        assert_eq!(config.build.base_url, "https://docs.acme.dev");
        assert_eq!(config.build.timeout_secs, 600);
    }
}
