//! Per-project "latest" release cache
//!
//! Has its own TTL and lock, independent of the catalog: an expired latest
//! entry is re-derived from the catalog, which only goes upstream if its own
//! listing is stale too.

use crate::catalog::ReleaseCatalog;
use crate::error::{DocError, DocResult};
use crate::release::Release;
use crate::version;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct LatestEntry {
    release: Release,
    fetched_at: Instant,
}

/// Resolves and caches the newest well-formed release of each project
pub struct LatestResolver {
    catalog: Arc<ReleaseCatalog>,
    ttl: Duration,
    entries: RwLock<HashMap<String, LatestEntry>>,
}

impl LatestResolver {
    pub fn new(catalog: Arc<ReleaseCatalog>, ttl: Duration) -> Self {
        Self {
            catalog,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The release with the greatest well-formed tag.
    ///
    /// Fails with `NoReleases` when the project has no well-formed tag.
    pub async fn resolve_latest(&self, project: &str, force_refresh: bool) -> DocResult<Release> {
        if !force_refresh {
            if let Some(entry) = self.entries.read().await.get(project) {
                if entry.fetched_at.elapsed() < self.ttl {
                    return Ok(entry.release.clone());
                }
            }
        }

        let catalog = self.catalog.entry(project, force_refresh).await?;
        let release = version::latest_of(catalog.releases())
            .cloned()
            .ok_or_else(|| DocError::NoReleases(project.to_string()))?;

        debug!("Latest release of {} is {}", project, release.tag);
        self.entries.write().await.insert(
            project.to_string(),
            LatestEntry {
                release: release.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(release)
    }

    /// Drop the cached latest release of `project`
    pub async fn invalidate(&self, project: &str) {
        self.entries.write().await.remove(project);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::MemorySource;

    const CATALOG_TTL: Duration = Duration::from_secs(300);
    const LATEST_TTL: Duration = Duration::from_secs(60);

    fn resolver(source: Arc<MemorySource>) -> LatestResolver {
        let catalog = Arc::new(ReleaseCatalog::new(
            source,
            CATALOG_TTL,
            Duration::from_secs(5),
        ));
        LatestResolver::new(catalog, LATEST_TTL)
    }

    #[tokio::test(start_paused = true)]
    async fn picks_greatest_tag() {
        let source = Arc::new(MemorySource::new());
        source.add("p", "1.0.0", "a");
        source.add("p", "1.2.0", "b");
        source.add("p", "1.1.5", "c");

        let latest = resolver(source).resolve_latest("p", false).await.unwrap();
        assert_eq!(latest.tag.as_str(), "1.2.0");
        assert_eq!(latest.source_location, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_tags_are_ignored() {
        let source = Arc::new(MemorySource::new());
        source.add("p", "abc", "a");
        source.add("p", "1.0.0", "b");
        source.add("q", "abc", "c");
        let resolver = resolver(source);

        let latest = resolver.resolve_latest("p", false).await.unwrap();
        assert_eq!(latest.tag.as_str(), "1.0.0");

        let err = resolver.resolve_latest("q", false).await.unwrap_err();
        assert!(matches!(err, DocError::NoReleases(ref p) if p == "q"));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_project_has_no_releases() {
        let source = Arc::new(MemorySource::new());
        let err = resolver(source)
            .resolve_latest("ghost", false)
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::NoReleases(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_tags_resolve_deterministically() {
        let source = Arc::new(MemorySource::new());
        source.add("p", "2.0.0", "first");
        source.add("p", "2.0.0", "second");
        let resolver = resolver(source);

        for _ in 0..3 {
            let latest = resolver.resolve_latest("p", true).await.unwrap();
            assert_eq!(latest.source_location, "first");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_reuses_fresh_catalog() {
        let source = Arc::new(MemorySource::new());
        source.add("p", "1.0.0", "a");
        let resolver = resolver(source.clone());

        resolver.resolve_latest("p", false).await.unwrap();
        tokio::time::advance(LATEST_TTL + Duration::from_secs(1)).await;
        resolver.resolve_latest("p", false).await.unwrap();

        // Latest expired, catalog did not
        assert_eq!(source.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_latest_is_cached() {
        let source = Arc::new(MemorySource::new());
        source.add("p", "1.0.0", "a");
        let resolver = resolver(source.clone());

        resolver.resolve_latest("p", false).await.unwrap();
        source.add("p", "2.0.0", "b");
        let latest = resolver.resolve_latest("p", false).await.unwrap();
        assert_eq!(latest.tag.as_str(), "1.0.0");

        let latest = resolver.resolve_latest("p", true).await.unwrap();
        assert_eq!(latest.tag.as_str(), "2.0.0");
        assert_eq!(source.list_calls(), 2);
    }
}
