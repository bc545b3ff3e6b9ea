//! Release sources
//!
//! A release source lists the published releases of a project and where to
//! fetch each release's source archive:
//! - [`GithubSource`]: GitHub REST API
//! - [`MemorySource`]: in-memory, for tests and offline setups

mod github;
mod memory;

pub use github::GithubSource;
pub use memory::MemorySource;

use crate::error::DocResult;
use crate::version::VersionTag;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A published, immutable release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Parsed tag
    pub tag: VersionTag,

    /// Where to download the release's source archive
    pub source_location: String,

    /// Publication time, when the source reports one
    pub published_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Create a release from a raw tag and source location
    pub fn new(tag: &str, source_location: impl Into<String>) -> Self {
        Self {
            tag: VersionTag::parse(tag),
            source_location: source_location.into(),
            published_at: None,
        }
    }

    /// Attach a publication time
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Upstream listing of releases
///
/// Implementations must not cache; caching belongs to
/// [`ReleaseCatalog`](crate::catalog::ReleaseCatalog).
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// List all releases of a project, in any order.
    ///
    /// An unknown project yields an empty list. Fails with
    /// `SourceUnavailable` when the upstream cannot be reached.
    async fn list_releases(&self, project: &str) -> DocResult<Vec<Release>>;

    /// Fetch a single release by its exact tag.
    ///
    /// Fails with `ReleaseNotFound` when no such release exists.
    async fn get_release(&self, project: &str, tag: &str) -> DocResult<Release>;

    /// Human-readable source name for logs
    fn source_name(&self) -> &'static str;
}
