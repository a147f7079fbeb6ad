//! GitHub repository PDF harvester
//!
//! Resolves the latest commit for the first live branch of a repository,
//! walks the recursive file tree for that commit, and downloads every blob
//! whose path ends in `.pdf`. Blob downloads are independent so one bad
//! file never loses the rest of the repository.

use super::{retry, FetchError};
use crate::config::GithubConfig;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

static REPO_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://github\.com/([^/]+)/([^/?#]+)").unwrap());

/// Owner/name pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse a repository reference out of a github.com URL.
    pub fn parse(url: &str) -> Option<Self> {
        let caps = REPO_URL_RE.captures(url)?;
        Some(Self {
            owner: caps[1].to_string(),
            repo: caps[2].trim_end_matches(".git").to_string(),
        })
    }
}

/// One downloadable PDF in a repository tree.
#[derive(Debug, Clone)]
pub struct PdfBlob {
    /// Path within the repository.
    pub path: String,
    /// Raw content URL.
    pub raw_url: String,
}

/// Seam for harvesting PDFs from a code-hosting repository; mocked in tests.
#[async_trait]
pub trait RepoHarvester: Send + Sync {
    /// List the PDF blobs reachable from the repository's first live branch.
    async fn list_pdf_blobs(&self, repo: &RepoRef) -> Result<Vec<PdfBlob>, FetchError>;

    /// Download one blob's raw content.
    async fn download_blob(&self, blob: &PdfBlob) -> Result<Vec<u8>, FetchError>;
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// GitHub REST client.
///
/// Requires a bearer credential; constructing one without a token is a
/// configuration error caught at startup, not here.
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    raw_base: String,
    branches: Vec<String>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, token: &str) -> Result<Self, FetchError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| FetchError::Malformed {
                url: config.api_base.clone(),
                reason: "token contains invalid header characters".to_string(),
            })?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .user_agent("intelharvest/0.1")
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            raw_base: config.raw_base.clone(),
            branches: config.branches.clone(),
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Probe one branch for its head commit SHA. `Ok(None)` means the
    /// branch does not exist or is not accessible.
    async fn branch_sha(&self, repo: &RepoRef, branch: &str) -> Result<Option<String>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/branches/{}",
            self.api_base, repo.owner, repo.repo, branch
        );
        let response = self.client.get(&url).send().await?;
        match response.status().as_u16() {
            200 => {
                let body: BranchResponse =
                    response.json().await.map_err(|e| FetchError::Malformed {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(Some(body.commit.sha))
            }
            401 | 403 | 404 => Ok(None),
            status => Err(FetchError::Status { status, url }),
        }
    }

    /// Fetch the recursive tree for a commit.
    async fn tree(&self, repo: &RepoRef, sha: &str) -> Result<Vec<TreeEntry>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, repo.owner, repo.repo, sha
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body: TreeResponse = response.json().await.map_err(|e| FetchError::Malformed {
            url,
            reason: e.to_string(),
        })?;
        Ok(body.tree)
    }
}

#[async_trait]
impl RepoHarvester for GithubClient {
    async fn list_pdf_blobs(&self, repo: &RepoRef) -> Result<Vec<PdfBlob>, FetchError> {
        let (sha, branch) = first_live_branch(&self.branches, |b| async move {
            retry::with_backoff(self.retry_attempts, self.retry_delay, || {
                self.branch_sha(repo, &b)
            })
            .await
        })
        .await?;

        debug!(owner = %repo.owner, repo = %repo.repo, %branch, %sha, "resolved repository head");

        let tree = retry::with_backoff(self.retry_attempts, self.retry_delay, || {
            self.tree(repo, &sha)
        })
        .await?;

        let blobs = tree
            .into_iter()
            .filter(|e| e.kind == "blob" && e.path.ends_with(".pdf"))
            .map(|e| PdfBlob {
                raw_url: format!(
                    "{}/{}/{}/{}/{}",
                    self.raw_base, repo.owner, repo.repo, branch, e.path
                ),
                path: e.path,
            })
            .collect();
        Ok(blobs)
    }

    async fn download_blob(&self, blob: &PdfBlob) -> Result<Vec<u8>, FetchError> {
        retry::with_backoff(self.retry_attempts, self.retry_delay, || async {
            let response = self.client.get(&blob.raw_url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: blob.raw_url.clone(),
                });
            }
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }
}

/// Try branches in priority order; the first one that resolves wins.
/// A probe error is logged and treated like a missing branch so a flaky
/// lookup on `main` does not mask a perfectly good `master`.
pub async fn first_live_branch<F, Fut>(
    branches: &[String],
    mut probe: F,
) -> Result<(String, String), FetchError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<String>, FetchError>>,
{
    for branch in branches {
        match probe(branch.clone()).await {
            Ok(Some(sha)) => return Ok((sha, branch.clone())),
            Ok(None) => debug!(%branch, "branch not found, trying next"),
            Err(e) => warn!(%branch, error = %e, "branch probe failed, trying next"),
        }
    }
    Err(FetchError::NoBranch(branches.to_vec()))
}
