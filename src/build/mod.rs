//! Documentation build pipelines
//!
//! A pipeline turns a release's source archive into a directory of static
//! documentation at a destination path. Pipelines must publish atomically:
//! either the destination appears complete or not at all.

mod archive;
mod make;

pub use make::MakePipeline;

use crate::error::DocResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Named parameters handed to every build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParams {
    /// URL the built docs will be served under, for cross-links
    pub base_url: String,

    /// Folder with assets shared across all projects
    pub shared_resource_folder: PathBuf,
}

/// Builds documentation for one release
#[async_trait]
pub trait BuildPipeline: Send + Sync {
    /// Build the archive at `source_location` into `destination`
    async fn build(
        &self,
        source_location: &str,
        destination: &Path,
        params: &BuildParams,
    ) -> DocResult<()>;

    /// Human-readable pipeline name for logs
    fn pipeline_name(&self) -> &'static str;
}

/// Extract the useful tail of build output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `BUILD_ERROR_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub(crate) fn build_error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > BUILD_ERROR_TAIL_LINES {
        lines[total - BUILD_ERROR_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_output_keeps_tail() {
        let stdout: String = (0..80).map(|i| format!("line {}\n", i)).collect();
        let output = build_error_output(&stdout, "fatal: no Makefile\n");

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), BUILD_ERROR_TAIL_LINES);
        assert_eq!(lines.last(), Some(&"fatal: no Makefile"));
        assert_eq!(lines[0], "line 31");
    }

    #[test]
    fn error_output_short() {
        assert_eq!(build_error_output("a\nb", "c"), "a\nb\nc");
        assert_eq!(build_error_output("", ""), "");
    }
}
