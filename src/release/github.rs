//! GitHub release source using the REST API

use super::{Release, ReleaseSource};
use crate::config::schema::SourceConfig;
use crate::error::{DocError, DocResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const PER_PAGE: usize = 100;
const USER_AGENT: &str = concat!("docsrv/", env!("CARGO_PKG_VERSION"));

/// Release entry as returned by `GET /repos/{owner}/{repo}/releases`
#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    tarball_url: Option<String>,
    #[serde(default)]
    draft: bool,
    published_at: Option<DateTime<Utc>>,
}

impl GithubRelease {
    fn into_release(self) -> Option<Release> {
        if self.draft {
            return None;
        }
        let tarball = self.tarball_url?;
        let release = Release::new(&self.tag_name, tarball);
        Some(match self.published_at {
            Some(at) => release.with_published_at(at),
            None => release,
        })
    }
}

/// Release source backed by the GitHub releases API
///
/// Projects map to repositories under a single owner:
/// project `foo` is `https://api.github.com/repos/{owner}/foo`.
#[derive(Debug, Clone)]
pub struct GithubSource {
    api_url: String,
    owner: String,
    timeout: Duration,
    max_pages: usize,
}

impl GithubSource {
    /// Create a GitHub source from config
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_pages: config.max_pages.max(1),
        }
    }

    fn repo_url(&self, project: &str) -> DocResult<String> {
        if self.owner.is_empty() {
            return Err(DocError::source_unavailable(
                project,
                "source.owner is not configured",
            ));
        }
        Ok(format!("{}/repos/{}/{}", self.api_url, self.owner, project))
    }

    fn agent(&self) -> ureq::Agent {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();
        config.into()
    }

    fn fetch_all(&self, project: &str) -> DocResult<Vec<Release>> {
        let url = format!("{}/releases", self.repo_url(project)?);
        let agent = self.agent();
        let mut releases = Vec::new();

        for page in 1..=self.max_pages {
            debug!("GET {} page {}", url, page);
            let result = agent
                .get(&url)
                .header("User-Agent", USER_AGENT)
                .header("Accept", "application/vnd.github+json")
                .query("per_page", PER_PAGE.to_string())
                .query("page", page.to_string())
                .call();

            let mut response = match result {
                Ok(response) => response,
                // Unknown repository: no releases
                Err(ureq::Error::StatusCode(404)) => return Ok(Vec::new()),
                Err(e) => return Err(DocError::source_unavailable(project, e.to_string())),
            };

            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| DocError::source_unavailable(project, e.to_string()))?;
            let batch: Vec<GithubRelease> = serde_json::from_str(&body)?;
            let len = batch.len();

            releases.extend(batch.into_iter().filter_map(GithubRelease::into_release));

            if len < PER_PAGE {
                break;
            }
        }

        debug!("Fetched {} releases of {}", releases.len(), project);
        Ok(releases)
    }

    fn fetch_one(&self, project: &str, tag: &str) -> DocResult<Release> {
        let url = format!("{}/releases/tags/{}", self.repo_url(project)?, tag);
        let not_found = || DocError::ReleaseNotFound {
            project: project.to_string(),
            tag: tag.to_string(),
        };

        let result = self
            .agent()
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .call();

        let mut response = match result {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => return Err(not_found()),
            Err(e) => return Err(DocError::source_unavailable(project, e.to_string())),
        };

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DocError::source_unavailable(project, e.to_string()))?;
        let release: GithubRelease = serde_json::from_str(&body)?;
        release.into_release().ok_or_else(not_found)
    }
}

#[async_trait]
impl ReleaseSource for GithubSource {
    async fn list_releases(&self, project: &str) -> DocResult<Vec<Release>> {
        let this = self.clone();
        let project = project.to_string();
        tokio::task::spawn_blocking(move || this.fetch_all(&project))
            .await
            .map_err(|e| DocError::Internal(format!("release listing task failed: {}", e)))?
    }

    async fn get_release(&self, project: &str, tag: &str) -> DocResult<Release> {
        let this = self.clone();
        let project = project.to_string();
        let tag = tag.to_string();
        tokio::task::spawn_blocking(move || this.fetch_one(&project, &tag))
            .await
            .map_err(|e| DocError::Internal(format!("release lookup task failed: {}", e)))?
    }

    fn source_name(&self) -> &'static str {
        "github"
    }
}
