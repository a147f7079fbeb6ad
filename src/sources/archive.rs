//! Paginated report-archive client (ORKL-style API)
//!
//! Walks an offset-based REST collection page by page. An empty or null
//! `data` array ends the walk; a non-success status is a hard stop for the
//! whole walk, logged distinctly from normal exhaustion, since it signals
//! either the end of the collection or an outage rather than one bad page.

use super::FetchError;
use crate::config::ArchiveConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// One report record from the archive API.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveReport {
    pub id: String,
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Deserialize)]
struct ArchivePage {
    #[serde(default)]
    data: Option<Vec<ArchiveReport>>,
}

/// Seam for walking a paginated report archive; mocked in tests.
#[async_trait]
pub trait ReportArchive: Send + Sync {
    /// Fetch one page at `offset`. `Ok(None)` means the collection is
    /// exhausted.
    async fn fetch_page(&self, offset: u64) -> Result<Option<Vec<ArchiveReport>>, FetchError>;

    /// Number of records requested per page.
    fn page_size(&self) -> u64;
}

/// ORKL library API client.
pub struct OrklClient {
    client: reqwest::Client,
    api_url: String,
    page_size: u64,
}

impl OrklClient {
    pub fn new(config: &ArchiveConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("intelharvest/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl ReportArchive for OrklClient {
    async fn fetch_page(&self, offset: u64) -> Result<Option<Vec<ArchiveReport>>, FetchError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
                ("order_by", "created_at".to_string()),
                ("order", "desc".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.api_url.clone(),
            });
        }

        let page: ArchivePage = response.json().await.map_err(|e| FetchError::Malformed {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;

        match page.data {
            Some(data) if !data.is_empty() => Ok(Some(data)),
            _ => Ok(None),
        }
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }
}
