//! Built documentation storage

use std::path::{Path, PathBuf};

/// Where built artifacts live and whether one exists
pub trait ArtifactStore: Send + Sync {
    /// Whether a complete artifact exists for `project` at `version`
    fn exists(&self, project: &str, version: &str) -> bool;

    /// Location of the artifact for `project` at `version`, built or not
    fn path_for(&self, project: &str, version: &str) -> PathBuf;
}

/// Artifacts stored as `<root>/<project>/<version>/`
///
/// Builds publish by renaming a finished directory into place, so an
/// existing directory is always a complete artifact.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, project: &str, version: &str) -> bool {
        self.path_for(project, version).is_dir()
    }

    fn path_for(&self, project: &str, version: &str) -> PathBuf {
        self.root.join(project).join(version)
    }
}

/// Whether `name` is usable as a single path segment.
///
/// Allows ASCII alphanumerics, `-`, `_`, `.` and `+`; rejects empty names and
/// `.`/`..`.
pub fn is_safe_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
}
