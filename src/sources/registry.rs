//! Per-site link-extractor registry
//!
//! Site-specific scrapers (one per intelligence vendor blog) live outside
//! this crate; each conforms to the `LinkExtractor` interface and is
//! registered here at startup. The registry replaces runtime plugin
//! discovery with explicit compile-time composition, and tolerates any
//! single extractor's failure without losing the others' results.

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

/// One site-specific link source.
#[async_trait]
pub trait LinkExtractor: Send + Sync {
    /// Stable identifier for the source, used in logs.
    fn source_id(&self) -> &str;

    /// Return candidate report URLs discovered at the source. An empty
    /// list means no results, not an error.
    async fn extract_links(&self) -> Result<Vec<String>>;
}

/// Static registry of link extractors, assembled at startup.
///
/// The shipped binary ingests from a persisted link list and registers
/// nothing here; deployments that embed their own site scrapers construct
/// a registry, `register` each scraper, and feed `collect_links` output
/// into the link list ahead of a run.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn LinkExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extractor: Box<dyn LinkExtractor>) {
        self.extractors.push(extractor);
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Run every registered extractor and pool the results. A failing
    /// extractor is logged and skipped; the run continues with the rest.
    pub async fn collect_links(&self) -> Vec<String> {
        let mut links = Vec::new();
        for extractor in &self.extractors {
            match extractor.extract_links().await {
                Ok(mut found) => links.append(&mut found),
                Err(e) => {
                    warn!(source = extractor.source_id(), error = %e, "link extractor failed, skipping source");
                }
            }
        }
        links
    }
}
