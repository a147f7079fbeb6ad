//! Generic URL fetcher
//!
//! Single HTTP GET with a fixed identifying header set and a hard request
//! timeout. Non-2xx status or transport error is a `FetchError`; no
//! automatic retry here — the orchestrator owns retry policy.

use super::FetchError;
use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, REFERER};
use std::time::Duration;

/// Seam for fetching an HTML page body; mocked in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body as text.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP page fetcher backed by a shared reqwest client.
pub struct WebFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(Self::identifying_headers(config))
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client, timeout })
    }

    /// The fixed header set sent with every request. Some intelligence
    /// vendor sites refuse requests that look too much like a bot.
    fn identifying_headers(config: &FetchConfig) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        if let Some(referer) = &config.referer {
            if let Ok(value) = HeaderValue::from_str(referer) {
                headers.insert(REFERER, value);
            }
        }
        headers
    }
}

#[async_trait]
impl PageFetcher for WebFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let url = ensure_scheme(url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Transport(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }
}

/// Default links without a scheme to https, as the link lists sometimes
/// carry bare hostnames.
pub fn ensure_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}
