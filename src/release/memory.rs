//! In-memory release source

use super::{Release, ReleaseSource};
use crate::error::{DocError, DocResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Release source backed by a map held in memory.
///
/// Can be switched to an unavailable state and given an artificial latency,
/// and counts list calls so cache behavior can be observed.
#[derive(Debug, Default)]
pub struct MemorySource {
    releases: Mutex<HashMap<String, Vec<Release>>>,
    unavailable: AtomicBool,
    delay: Mutex<Option<Duration>>,
    list_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a release for a project
    pub fn add(&self, project: &str, tag: &str, source_location: &str) {
        self.releases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(project.to_string())
            .or_default()
            .push(Release::new(tag, source_location));
    }

    /// Forget every release of a project
    pub fn clear(&self, project: &str) {
        self.releases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(project);
    }

    /// Make every call fail with `SourceUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call by `delay`
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Number of `list_releases` calls served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    async fn simulate(&self, project: &str) -> DocResult<()> {
        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DocError::source_unavailable(project, "memory source offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl ReleaseSource for MemorySource {
    async fn list_releases(&self, project: &str) -> DocResult<Vec<Release>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate(project).await?;

        Ok(self
            .releases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_release(&self, project: &str, tag: &str) -> DocResult<Release> {
        self.simulate(project).await?;

        self.releases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project)
            .and_then(|releases| releases.iter().find(|r| r.tag.as_str() == tag).cloned())
            .ok_or_else(|| DocError::ReleaseNotFound {
                project: project.to_string(),
                tag: tag.to_string(),
            })
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}
