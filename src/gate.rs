//! Build deduplication gate
//!
//! Tracks which (project, version) builds are running. The gate rejects
//! rather than queues: a second caller for a key already in flight is told so
//! and decides for itself what to do.
//!
//! | Acquire result | Meaning |
//! |----------------|---------|
//! | `Granted(permit)` | Caller owns the build until the permit drops |
//! | `AlreadyInFlight` | Another caller is building, do not build |

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Identifies one build
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildKey {
    pub project: String,
    pub version: String,
}

impl BuildKey {
    pub fn new(project: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for BuildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.project, self.version)
    }
}

/// Outcome of [`BuildGate::acquire`]
#[derive(Debug)]
pub enum Acquire {
    /// The key was free; the permit holds it until dropped
    Granted(BuildPermit),
    /// Someone else holds the key
    AlreadyInFlight,
}

impl Acquire {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// Running builds, each tagged with the token of the permit that owns it
type InFlight = Arc<RwLock<HashMap<BuildKey, u64>>>;

/// Set of builds currently running.
///
/// Cheap to clone; clones share the same set. All operations take the write
/// lock, membership checks included.
#[derive(Debug, Clone, Default)]
pub struct BuildGate {
    in_flight: InFlight,
    next_token: Arc<AtomicU64>,
}

impl BuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` if no one else holds it
    pub fn acquire(&self, key: BuildKey) -> Acquire {
        let mut map = self
            .in_flight
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if map.contains_key(&key) {
            debug!("Build {} already in flight", key);
            return Acquire::AlreadyInFlight;
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        map.insert(key.clone(), token);

        debug!("Build {} granted", key);
        Acquire::Granted(BuildPermit {
            in_flight: self.in_flight.clone(),
            key,
            token,
        })
    }

    /// Remove `key` from the in-flight set.
    ///
    /// Idempotent; returns whether the key was present. Holders of a
    /// [`BuildPermit`] release by dropping it. A permit whose key was
    /// released this way no longer owns the key, so dropping it later does
    /// not free a slot granted to someone else.
    pub fn release(&self, key: &BuildKey) -> bool {
        let removed = self
            .in_flight
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some();
        if removed {
            debug!("Build {} released", key);
        }
        removed
    }

    pub fn is_in_flight(&self, key: &BuildKey) -> bool {
        self.in_flight
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of builds currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive right to build one key. Releases the key when dropped.
#[derive(Debug)]
pub struct BuildPermit {
    in_flight: InFlight,
    key: BuildKey,
    token: u64,
}

impl BuildPermit {
    pub fn key(&self) -> &BuildKey {
        &self.key
    }
}

impl Drop for BuildPermit {
    fn drop(&mut self) {
        let mut map = self
            .in_flight
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Only free the key if it is still ours
        if map.get(&self.key) == Some(&self.token) {
            map.remove(&self.key);
            debug!("Build {} released", self.key);
        }
    }
}
