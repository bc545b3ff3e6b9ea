//! Per-project release listing cache
//!
//! Entries are immutable snapshots shared as `Arc<CatalogEntry>` and replaced
//! wholesale on refresh, so readers never observe a half-written listing.
//! Upstream fetches run with no lock held; the write lock is only taken to
//! install the finished snapshot.

use crate::error::{DocError, DocResult};
use crate::release::{Release, ReleaseSource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Cached listing of one project's releases
#[derive(Debug)]
pub struct CatalogEntry {
    project: String,
    /// Ascending by tag; upstream order kept among equal tags
    releases: Vec<Release>,
    fetched_at: Instant,
}

impl CatalogEntry {
    fn new(project: &str, mut releases: Vec<Release>, fetched_at: Instant) -> Self {
        // Stable sort keeps upstream order for duplicate tags
        releases.sort_by(|a, b| a.tag.cmp(&b.tag));
        Self {
            project: project.to_string(),
            releases,
            fetched_at,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Release listings with bounded staleness
pub struct ReleaseCatalog {
    source: Arc<dyn ReleaseSource>,
    ttl: Duration,
    fetch_timeout: Duration,
    entries: RwLock<HashMap<String, Arc<CatalogEntry>>>,
}

impl ReleaseCatalog {
    /// Create an empty catalog over `source`
    pub fn new(source: Arc<dyn ReleaseSource>, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            source,
            ttl,
            fetch_timeout,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Releases of `project`, ascending by tag
    pub async fn list_releases(&self, project: &str, force_refresh: bool) -> DocResult<Vec<Release>> {
        let entry = self.entry(project, force_refresh).await?;
        Ok(entry.releases().to_vec())
    }

    /// Current snapshot for `project`, refreshing it if stale or forced.
    ///
    /// A failed or empty refresh falls back to the previous snapshot when
    /// one exists; without one the failure is returned.
    pub async fn entry(&self, project: &str, force_refresh: bool) -> DocResult<Arc<CatalogEntry>> {
        if !force_refresh {
            if let Some(entry) = self.cached(project).await {
                if entry.is_fresh(self.ttl) {
                    debug!("Catalog hit for {}", project);
                    return Ok(entry);
                }
            }
        }

        let started = Instant::now();
        match self.fetch(project).await {
            Ok(releases) => {
                if releases.is_empty() {
                    if let Some(previous) = self.cached(project).await {
                        if !previous.releases.is_empty() {
                            warn!(
                                "{} returned no releases for {}, keeping {} cached",
                                self.source.source_name(),
                                project,
                                previous.releases.len()
                            );
                            return Ok(previous);
                        }
                    }
                }

                let entry = Arc::new(CatalogEntry::new(project, releases, started));
                Ok(self.install(entry).await)
            }
            Err(e) => match self.cached(project).await {
                Some(previous) => {
                    warn!("Refreshing releases of {} failed, serving stale: {}", project, e);
                    Ok(previous)
                }
                None => Err(e),
            },
        }
    }

    /// Find a release by tag.
    ///
    /// Exact tag text wins over a semantic match (`v1.0.0` vs `1.0.0`). Tags
    /// missing from the listing are asked of the source directly, which
    /// catches releases published after the listing was cached.
    pub async fn lookup(&self, project: &str, tag: &str) -> DocResult<Release> {
        let entry = self.entry(project, false).await?;
        let releases = entry.releases();

        let found = releases
            .iter()
            .find(|r| r.tag.as_str() == tag)
            .or_else(|| releases.iter().find(|r| r.tag.matches(tag)));
        if let Some(release) = found {
            return Ok(release.clone());
        }

        let unknown = || DocError::UnknownVersion {
            project: project.to_string(),
            version: tag.to_string(),
        };

        match tokio::time::timeout(self.fetch_timeout, self.source.get_release(project, tag)).await
        {
            Ok(Ok(release)) => {
                info!("Found {} {} upstream, not yet in cached listing", project, tag);
                Ok(release)
            }
            Ok(Err(DocError::ReleaseNotFound { .. })) => Err(unknown()),
            Ok(Err(e)) => {
                warn!("Looking up {} {} failed: {}", project, tag, e);
                Err(e)
            }
            Err(_) => {
                warn!("Looking up {} {} timed out", project, tag);
                Err(DocError::source_unavailable(
                    project,
                    format!("lookup of {} timed out", tag),
                ))
            }
        }
    }

    /// Drop the cached listing of `project`
    pub async fn invalidate(&self, project: &str) {
        self.entries.write().await.remove(project);
    }

    async fn cached(&self, project: &str) -> Option<Arc<CatalogEntry>> {
        self.entries.read().await.get(project).cloned()
    }

    async fn fetch(&self, project: &str) -> DocResult<Vec<Release>> {
        debug!(
            "Fetching releases of {} from {}",
            project,
            self.source.source_name()
        );
        tokio::time::timeout(self.fetch_timeout, self.source.list_releases(project))
            .await
            .map_err(|_| {
                DocError::source_unavailable(
                    project,
                    format!("timed out after {}s", self.fetch_timeout.as_secs()),
                )
            })?
    }

    /// Install `entry` unless a racing refresh already installed a newer one
    async fn install(&self, entry: Arc<CatalogEntry>) -> Arc<CatalogEntry> {
        let mut entries = self.entries.write().await;
        match entries.get(&entry.project) {
            Some(existing) if existing.fetched_at > entry.fetched_at => existing.clone(),
            _ => {
                entries.insert(entry.project.clone(), entry.clone());
                entry
            }
        }
    }
}
