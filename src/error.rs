//! Error types for docsrv
//!
//! All modules use `DocResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docsrv operations
pub type DocResult<T> = Result<T, DocError>;

/// All errors that can occur in docsrv
#[derive(Error, Debug)]
pub enum DocError {
    // Release source errors
    #[error("Release source unavailable for {project}: {reason}")]
    SourceUnavailable { project: String, reason: String },

    #[error("Release {tag} not found for {project}")]
    ReleaseNotFound { project: String, tag: String },

    #[error("No well-formed releases for {0}")]
    NoReleases(String),

    // Resolution errors
    #[error("Unknown project: {0}")]
    UnknownProject(String),

    #[error("Unknown version {version} for {project}")]
    UnknownVersion { project: String, version: String },

    // Build errors
    #[error("Build of {project} {version} already in progress")]
    BuildInProgress { project: String, version: String },

    #[error("Build of {project} {version} failed: {detail}")]
    BuildFailed {
        project: String,
        version: String,
        detail: String,
    },

    #[error("Download failed: {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to extract archive {source_location}: {reason}")]
    ArchiveExtract {
        source_location: String,
        reason: String,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, output: {output}")]
    CommandExecution { command: String, output: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl DocError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create a source unavailable error
    pub fn source_unavailable(project: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            project: project.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is transient and the request may be retried later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BuildInProgress { .. } | Self::SourceUnavailable { .. }
        )
    }

    /// Check if error means the requested documentation does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownProject(_)
                | Self::UnknownVersion { .. }
                | Self::NoReleases(_)
                | Self::ReleaseNotFound { .. }
        )
    }

    /// HTTP status code an HTTP front end should answer with
    pub fn status_code(&self) -> u16 {
        if self.is_not_found() {
            404
        } else if self.is_retryable() {
            503
        } else {
            500
        }
    }

    /// Client-facing message, without internal build or IO detail
    pub fn public_message(&self) -> String {
        match self {
            Self::UnknownProject(_) | Self::NoReleases(_) => "project not found".to_string(),
            Self::UnknownVersion { .. } | Self::ReleaseNotFound { .. } => {
                "version not found".to_string()
            }
            Self::BuildInProgress { .. } => {
                "documentation is being built, try again shortly".to_string()
            }
            Self::SourceUnavailable { .. } => "release source unavailable".to_string(),
            _ => "internal error".to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::BuildInProgress { .. } => Some("Retry once the running build finishes"),
            Self::SourceUnavailable { .. } => {
                Some("Check network access and source.api_url in the config")
            }
            Self::UnknownProject(_) => Some("Check source.owner and the project name"),
            Self::UnknownVersion { .. } => Some("Run: docsrv releases <project>"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DocError::UnknownVersion {
            project: "p".to_string(),
            version: "9.9.9".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown version 9.9.9 for p");
    }

    #[test]
    fn error_hint() {
        let err = DocError::UnknownProject("p".to_string());
        assert_eq!(err.hint(), Some("Check source.owner and the project name"));
        assert_eq!(DocError::Internal("x".to_string()).hint(), None);
    }

    #[test]
    fn error_retryable() {
        let in_progress = DocError::BuildInProgress {
            project: "p".to_string(),
            version: "1.0.0".to_string(),
        };
        assert!(in_progress.is_retryable());
        assert!(!DocError::UnknownProject("p".to_string()).is_retryable());
    }

    #[test]
    fn status_codes() {
        assert_eq!(DocError::UnknownProject("p".to_string()).status_code(), 404);
        assert_eq!(DocError::NoReleases("p".to_string()).status_code(), 404);
        assert_eq!(
            DocError::BuildInProgress {
                project: "p".to_string(),
                version: "1.0.0".to_string(),
            }
            .status_code(),
            503
        );
        assert_eq!(
            DocError::BuildFailed {
                project: "p".to_string(),
                version: "1.0.0".to_string(),
                detail: "make exited 2".to_string(),
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn public_message_hides_detail() {
        let err = DocError::BuildFailed {
            project: "p".to_string(),
            version: "1.0.0".to_string(),
            detail: "/var/lib/docsrv/work/abc: permission denied".to_string(),
        };
        assert_eq!(err.public_message(), "internal error");
    }
}
