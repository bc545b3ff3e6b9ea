//! Documentation resolution façade
//!
//! Turns `(project, version-or-latest)` into the location of built docs:
//!
//! 1. `latest` is resolved through [`LatestResolver`]; anything else must be
//!    a known release tag.
//! 2. An existing artifact is returned as is.
//! 3. Otherwise the build slot is claimed through [`BuildGate`] and the
//!    pipeline runs with a bounded duration. Concurrent requests for the same
//!    build are rejected with `BuildInProgress` rather than queued.

use crate::build::{BuildParams, BuildPipeline, MakePipeline};
use crate::catalog::ReleaseCatalog;
use crate::config::Config;
use crate::error::{DocError, DocResult};
use crate::gate::{Acquire, BuildGate, BuildKey};
use crate::latest::LatestResolver;
use crate::release::{GithubSource, Release, ReleaseSource};
use crate::store::{self, ArtifactStore, FsArtifactStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Alias accepted in place of a version
pub const LATEST: &str = "latest";

/// Built documentation for one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub project: String,
    /// Tag exactly as published
    pub version: String,
    pub location: PathBuf,
    /// Whether this request ran the build
    pub built: bool,
}

/// Build-related settings of a [`DocResolver`]
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub base_url: String,
    pub shared_folder: PathBuf,
    pub build_timeout: Duration,
    pub catalog_ttl: Duration,
    pub latest_ttl: Duration,
    pub fetch_timeout: Duration,
}

impl ResolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.build.base_url.clone(),
            shared_folder: config.build.shared_folder.clone(),
            build_timeout: config.build.timeout(),
            catalog_ttl: config.source.catalog_ttl(),
            latest_ttl: config.source.latest_ttl(),
            fetch_timeout: config.source.timeout(),
        }
    }
}

/// Resolves, builds and caches versioned documentation
pub struct DocResolver {
    catalog: Arc<ReleaseCatalog>,
    latest: LatestResolver,
    gate: BuildGate,
    store: Arc<dyn ArtifactStore>,
    pipeline: Arc<dyn BuildPipeline>,
    settings: ResolverSettings,
}

impl DocResolver {
    pub fn new(
        source: Arc<dyn ReleaseSource>,
        store: Arc<dyn ArtifactStore>,
        pipeline: Arc<dyn BuildPipeline>,
        settings: ResolverSettings,
    ) -> Self {
        let catalog = Arc::new(ReleaseCatalog::new(
            source,
            settings.catalog_ttl,
            settings.fetch_timeout,
        ));
        let latest = LatestResolver::new(catalog.clone(), settings.latest_ttl);

        Self {
            catalog,
            latest,
            gate: BuildGate::new(),
            store,
            pipeline,
            settings,
        }
    }

    /// Resolver over GitHub releases, building with `make` into the
    /// configured docs root
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(GithubSource::new(&config.source)),
            Arc::new(FsArtifactStore::new(&config.build.docs_root)),
            Arc::new(MakePipeline::new(&config.build)),
            ResolverSettings::from_config(config),
        )
    }

    /// Location of built docs for `project` at `version_or_latest`, building
    /// them if needed.
    pub async fn resolve(&self, project: &str, version_or_latest: &str) -> DocResult<Artifact> {
        let release = self.resolve_version(project, version_or_latest).await?;
        let version = release.tag.as_str().to_string();

        if self.store.exists(project, &version) {
            debug!("Serving existing docs for {} {}", project, version);
            return Ok(self.artifact(project, &version, false));
        }

        let key = BuildKey::new(project, &version);
        let _permit = match self.gate.acquire(key) {
            Acquire::Granted(permit) => permit,
            Acquire::AlreadyInFlight => {
                return Err(DocError::BuildInProgress {
                    project: project.to_string(),
                    version,
                });
            }
        };

        // Another build may have published between the check and the acquire
        if self.store.exists(project, &version) {
            return Ok(self.artifact(project, &version, false));
        }

        self.build(project, &release).await?;
        Ok(self.artifact(project, &version, true))
    }

    /// The release `version_or_latest` refers to
    pub async fn resolve_version(
        &self,
        project: &str,
        version_or_latest: &str,
    ) -> DocResult<Release> {
        if !store::is_safe_segment(project) {
            return Err(DocError::UnknownProject(project.to_string()));
        }

        if version_or_latest == LATEST {
            return self
                .latest
                .resolve_latest(project, false)
                .await
                .map_err(|e| match e {
                    DocError::NoReleases(project) => DocError::UnknownProject(project),
                    other => other,
                });
        }

        let unknown = || DocError::UnknownVersion {
            project: project.to_string(),
            version: version_or_latest.to_string(),
        };
        if !store::is_safe_segment(version_or_latest) {
            return Err(unknown());
        }

        let release = self.catalog.lookup(project, version_or_latest).await?;
        // Tags become directory names
        if !store::is_safe_segment(release.tag.as_str()) {
            return Err(unknown());
        }
        Ok(release)
    }

    /// Published tags of `project`, ascending
    pub async fn list_versions(&self, project: &str, force_refresh: bool) -> DocResult<Vec<String>> {
        if !store::is_safe_segment(project) {
            return Err(DocError::UnknownProject(project.to_string()));
        }

        let releases = self.catalog.list_releases(project, force_refresh).await?;
        if releases.is_empty() {
            return Err(DocError::UnknownProject(project.to_string()));
        }
        Ok(releases
            .into_iter()
            .map(|r| r.tag.as_str().to_string())
            .collect())
    }

    /// Public URL of the docs for `project` at `version`
    pub fn canonical_url(&self, project: &str, version: &str) -> String {
        format!(
            "{}/{}/{}/",
            self.settings.base_url.trim_end_matches('/'),
            project,
            version
        )
    }

    /// Drop all cached state for `project`
    pub async fn invalidate(&self, project: &str) {
        self.catalog.invalidate(project).await;
        self.latest.invalidate(project).await;
    }

    pub fn gate(&self) -> &BuildGate {
        &self.gate
    }

    async fn build(&self, project: &str, release: &Release) -> DocResult<()> {
        let version = release.tag.as_str();
        let destination = self.store.path_for(project, version);
        let params = BuildParams {
            base_url: self.canonical_url(project, version),
            shared_resource_folder: self.settings.shared_folder.clone(),
        };

        info!(
            "Building docs for {} {} with {}",
            project,
            version,
            self.pipeline.pipeline_name()
        );
        let outcome = tokio::time::timeout(
            self.settings.build_timeout,
            self.pipeline
                .build(&release.source_location, &destination, &params),
        )
        .await;

        let detail = match outcome {
            Ok(Ok(())) => {
                info!("Built docs for {} {}", project, version);
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!(
                "timed out after {}s",
                self.settings.build_timeout.as_secs()
            ),
        };

        error!("Build of {} {} failed: {}", project, version, detail);
        Err(DocError::BuildFailed {
            project: project.to_string(),
            version: version.to_string(),
            detail,
        })
    }

    fn artifact(&self, project: &str, version: &str, built: bool) -> Artifact {
        Artifact {
            project: project.to_string(),
            version: version.to_string(),
            location: self.store.path_for(project, version),
            built,
        }
    }
}
