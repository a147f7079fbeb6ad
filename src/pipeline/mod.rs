//! Ingestion orchestrator
//!
//! Drives the pipeline over a day's candidate links: dispatch each link to
//! the right adapter, then fetch, normalize, fingerprint, extract
//! indicators, dedup-check, and persist. Each link runs to completion
//! independently; one link's failure never halts the rest. After the
//! link-based sources drain, the paginated archive walk runs to exhaustion
//! against the same dedup index, so its duplicates of same-run web
//! documents are caught too.
//!
//! Per document the stages are strictly sequential:
//! fetch -> normalize -> fingerprint/extract -> dedup check -> persist.
//! The check-then-persist-then-append sequence on the dedup index runs
//! under one mutex guard, which keeps two near-identical documents from
//! both being accepted if link processing is ever parallelized.

use crate::config::Config;
use crate::content::{normalize, RawArtifact};
use crate::dedup::DedupIndex;
use crate::fingerprint::Fingerprint;
use crate::ioc::IndicatorSet;
use crate::links::{classify, CandidateLink, SourceKind, DATE_FORMAT};
use crate::sources::{
    ensure_scheme, GithubClient, OrklClient, PageFetcher, RepoHarvester, RepoRef, ReportArchive,
    WebFetcher,
};
use crate::store::{ReportStore, StoredReport};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// End-of-run accounting: every document lands in exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Documents persisted as new reports.
    pub persisted: u64,
    /// Documents that failed at any stage.
    pub failed: u64,
    /// Documents judged duplicates of the existing corpus.
    pub skipped_duplicate: u64,
}

impl IngestStats {
    pub fn total(&self) -> u64 {
        self.persisted + self.failed + self.skipped_duplicate
    }
}

/// Terminal state of one document's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocOutcome {
    Persisted,
    SkippedDuplicate,
    Failed,
}

/// The pipeline driver. Owns the dedup index and the shared counters; all
/// other components are stateless over their inputs.
pub struct IngestPipeline {
    fetcher: Arc<dyn PageFetcher>,
    harvester: Arc<dyn RepoHarvester>,
    archive: Option<Arc<dyn ReportArchive>>,
    store: Arc<dyn ReportStore>,
    index: Mutex<DedupIndex>,
    ingestion_date: NaiveDate,
}

impl IngestPipeline {
    /// Build a pipeline with explicit adapters. The dedup index is loaded
    /// from the store once, here.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        harvester: Arc<dyn RepoHarvester>,
        archive: Option<Arc<dyn ReportArchive>>,
        store: Arc<dyn ReportStore>,
        threshold: f64,
        ingestion_date: NaiveDate,
    ) -> Result<Self> {
        let index = DedupIndex::load(store.as_ref(), threshold)
            .context("failed to load dedup index from store")?;
        info!(existing = index.len(), "dedup index loaded");

        Ok(Self {
            fetcher,
            harvester,
            archive,
            store,
            index: Mutex::new(index),
            ingestion_date,
        })
    }

    /// Build the production pipeline from configuration. Fails fast when
    /// the GitHub credential is absent.
    pub fn from_config(config: &Config, store: Arc<dyn ReportStore>) -> Result<Self> {
        let token = config
            .github
            .token
            .as_deref()
            .context("GitHub token missing: set the GH_TOKEN environment variable")?;

        let fetcher = Arc::new(WebFetcher::new(&config.fetch)?);
        let harvester = Arc::new(GithubClient::new(&config.github, token)?);
        let archive: Option<Arc<dyn ReportArchive>> = if config.archive.enabled {
            Some(Arc::new(OrklClient::new(&config.archive)?))
        } else {
            None
        };

        Self::new(
            fetcher,
            harvester,
            archive,
            store,
            config.dedup.threshold,
            Utc::now().date_naive(),
        )
    }

    /// Run the full ingestion: all candidate links, then the archive walk.
    pub async fn run(&self, links: Vec<CandidateLink>) -> IngestStats {
        let mut stats = IngestStats::default();

        for (i, candidate) in links.iter().enumerate() {
            info!(n = i + 1, of = links.len(), link = %candidate.link, "processing candidate link");
            self.process_link(&candidate.link, &mut stats).await;
        }

        if let Some(archive) = &self.archive {
            self.drain_archive(archive.as_ref(), &mut stats).await;
        }

        info!(
            persisted = stats.persisted,
            failed = stats.failed,
            skipped_duplicate = stats.skipped_duplicate,
            "ingestion run complete"
        );
        stats
    }

    /// Run one candidate link's pipeline to completion.
    async fn process_link(&self, link: &str, stats: &mut IngestStats) {
        match classify(link) {
            SourceKind::GithubRepo => self.process_repo(link, stats).await,
            SourceKind::Web => self.process_web_page(link, stats).await,
        }
    }

    async fn process_web_page(&self, link: &str, stats: &mut IngestStats) {
        let url = ensure_scheme(link);
        match self.fetcher.fetch_page(&url).await {
            Ok(body) => {
                let outcome = self.ingest_document(RawArtifact::Html { body, url });
                tally(stats, outcome);
            }
            Err(e) => {
                warn!(%url, error = %e, "fetch failed");
                tally(stats, DocOutcome::Failed);
            }
        }
    }

    /// Harvest every PDF in a GitHub repository, one pipeline run per
    /// blob. A failed download counts as one failed document and the
    /// remaining blobs still go through.
    async fn process_repo(&self, link: &str, stats: &mut IngestStats) {
        let Some(repo) = RepoRef::parse(link) else {
            warn!(%link, "unrecognized GitHub repository URL");
            tally(stats, DocOutcome::Failed);
            return;
        };

        let blobs = match self.harvester.list_pdf_blobs(&repo).await {
            Ok(blobs) => blobs,
            Err(e) => {
                warn!(owner = %repo.owner, repo = %repo.repo, error = %e, "repository harvest failed");
                tally(stats, DocOutcome::Failed);
                return;
            }
        };

        if blobs.is_empty() {
            debug!(owner = %repo.owner, repo = %repo.repo, "no PDF blobs in repository");
            return;
        }

        for blob in blobs {
            match self.harvester.download_blob(&blob).await {
                Ok(bytes) => {
                    let outcome = self.ingest_document(RawArtifact::Pdf {
                        bytes,
                        url: blob.raw_url.clone(),
                    });
                    tally(stats, outcome);
                }
                Err(e) => {
                    warn!(path = %blob.path, error = %e, "blob download failed, continuing with rest");
                    tally(stats, DocOutcome::Failed);
                }
            }
        }
    }

    /// Walk the paginated archive until exhaustion or a hard stop.
    async fn drain_archive(&self, archive: &dyn ReportArchive, stats: &mut IngestStats) {
        info!("draining report archive");
        let mut offset = 0u64;
        loop {
            match archive.fetch_page(offset).await {
                Ok(Some(reports)) => {
                    for report in reports {
                        let outcome = self.ingest_document(RawArtifact::ArchiveRecord {
                            id: report.id,
                            plain_text: report.plain_text,
                        });
                        tally(stats, outcome);
                    }
                    offset += archive.page_size();
                }
                Ok(None) => {
                    info!(offset, "archive exhausted");
                    break;
                }
                Err(e) => {
                    // Hard stop for the whole walk, not a per-page skip
                    warn!(offset, error = %e, "archive walk aborted");
                    break;
                }
            }
        }
    }

    /// The CPU half of the pipeline: normalize, fingerprint, extract
    /// indicators, dedup-check, persist.
    ///
    /// Holds the index lock across check, persist, and append; the
    /// candidate's fingerprint goes into the index only after its report
    /// is stored, and before any later candidate can be checked.
    fn ingest_document(&self, artifact: RawArtifact) -> DocOutcome {
        let doc = match normalize(artifact) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "normalization failed");
                return DocOutcome::Failed;
            }
        };

        // Independent derivations from the same text
        let fingerprint = Fingerprint::compute(&doc.plain_text);
        let indicators = IndicatorSet::extract(&doc.plain_text);

        let mut index = self.index.lock();
        if index.is_duplicate(&fingerprint) {
            debug!(source = %doc.source_link, "duplicate content, skipping");
            return DocOutcome::SkippedDuplicate;
        }

        let report = StoredReport::new(
            doc.plain_text,
            &fingerprint,
            indicators,
            doc.source_link.clone(),
            self.ingestion_date.format(DATE_FORMAT).to_string(),
        );

        match self.store.insert(&report) {
            Ok(()) => {
                index.insert(fingerprint);
                debug!(source = %doc.source_link, "report persisted");
                DocOutcome::Persisted
            }
            Err(e) => {
                // Fingerprint deliberately not added: nothing was stored
                warn!(source = %doc.source_link, error = %e, "persist failed");
                DocOutcome::Failed
            }
        }
    }
}

fn tally(stats: &mut IngestStats, outcome: DocOutcome) {
    match outcome {
        DocOutcome::Persisted => stats.persisted += 1,
        DocOutcome::SkippedDuplicate => stats.skipped_duplicate += 1,
        DocOutcome::Failed => stats.failed += 1,
    }
}
