//! Source adapters
//!
//! Pluggable fetchers for the ingestion pipeline:
//! - `WebFetcher`: single-shot HTTP GET for arbitrary report pages
//! - `GithubClient`: harvests PDFs out of GitHub repository trees
//! - `OrklClient`: walks an offset-paginated report archive API
//! - `ExtractorRegistry`: static registry of per-site link extractors
//!
//! Adapters perform no automatic retry of their own beyond what the shared
//! `retry` helper provides for GitHub API calls; retry policy otherwise
//! belongs to whatever scheduler drives the pipeline.

pub mod archive;
pub mod github;
pub mod registry;
pub mod retry;
pub mod web;

pub use archive::{ArchiveReport, OrklClient, ReportArchive};
pub use github::{GithubClient, PdfBlob, RepoHarvester, RepoRef};
pub use registry::{ExtractorRegistry, LinkExtractor};
pub use web::{ensure_scheme, PageFetcher, WebFetcher};

use std::time::Duration;
use thiserror::Error;

/// Errors from any source adapter's network path.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} fetching {url}")]
    Status { status: u16, url: String },
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("no live branch among {0:?}")]
    NoBranch(Vec<String>),
    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether a bounded retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Timeout(_))
    }
}
