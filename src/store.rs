//! Report persistence
//!
//! The document store is an external collaborator with two operations:
//! insert one report, and scan the fingerprint projection for dedup-index
//! loading. `ReportStore` is the seam; the default implementation keeps
//! reports in a sled embedded database, and `MemoryReportStore` backs
//! tests and dry runs.

use crate::fingerprint::Fingerprint;
use crate::ioc::IndicatorSet;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The persisted unit: one non-duplicate ingested document.
///
/// Insert-only; never updated in place, never deleted by this pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    /// Normalized plain-text body.
    pub text: String,
    /// MinHash signature, serialized as an ordered list of slot values.
    pub fingerprint: Vec<u64>,
    pub hashes: Vec<String>,
    pub ip_addrs: Vec<String>,
    pub domains: Vec<String>,
    /// URL or logical reference the document came from.
    pub source_link: String,
    /// Date bucket of ingestion, formatted YYYY/MM/DD.
    pub ingestion_date: String,
}

impl StoredReport {
    pub fn new(
        text: String,
        fingerprint: &Fingerprint,
        indicators: IndicatorSet,
        source_link: String,
        ingestion_date: String,
    ) -> Self {
        Self {
            text,
            fingerprint: fingerprint.slots().to_vec(),
            hashes: indicators.hashes,
            ip_addrs: indicators.ip_addrs,
            domains: indicators.domains,
            source_link,
            ingestion_date,
        }
    }
}

/// External document-store seam: insert plus fingerprint projection.
pub trait ReportStore: Send + Sync {
    /// Persist one report. Atomic per document; no cross-document
    /// transactions are required.
    fn insert(&self, report: &StoredReport) -> Result<()>;

    /// Load the fingerprint of every stored report.
    fn fingerprints(&self) -> Result<Vec<Fingerprint>>;

    /// Number of stored reports.
    fn count(&self) -> Result<usize>;
}

/// Sled-backed report store.
pub struct SledReportStore {
    db: sled::Db,
}

impl SledReportStore {
    /// Open or create the store under `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let db_path = data_dir.as_ref().join("reports.sled");
        let db = sled::open(&db_path)
            .with_context(|| format!("failed to open report database at {:?}", db_path))?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("failed to flush report database")?;
        Ok(())
    }
}

impl ReportStore for SledReportStore {
    fn insert(&self, report: &StoredReport) -> Result<()> {
        let key = self
            .db
            .generate_id()
            .context("failed to allocate report id")?;
        let data = bincode::serialize(report)
            .with_context(|| format!("failed to serialize report from {}", report.source_link))?;
        self.db
            .insert(key.to_be_bytes(), data)
            .with_context(|| format!("failed to store report from {}", report.source_link))?;
        Ok(())
    }

    fn fingerprints(&self) -> Result<Vec<Fingerprint>> {
        let mut fingerprints = Vec::new();
        for entry in self.db.iter() {
            let (_, value) = entry.context("failed to read report record")?;
            let report: StoredReport =
                bincode::deserialize(&value).context("failed to deserialize report record")?;
            fingerprints.push(Fingerprint::from_slots(report.fingerprint));
        }
        Ok(fingerprints)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.db.len())
    }
}

/// In-memory report store for tests.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<StoredReport>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything inserted so far.
    pub fn reports(&self) -> Vec<StoredReport> {
        self.reports.lock().clone()
    }
}

impl ReportStore for MemoryReportStore {
    fn insert(&self, report: &StoredReport) -> Result<()> {
        self.reports.lock().push(report.clone());
        Ok(())
    }

    fn fingerprints(&self) -> Result<Vec<Fingerprint>> {
        Ok(self
            .reports
            .lock()
            .iter()
            .map(|r| Fingerprint::from_slots(r.fingerprint.clone()))
            .collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.reports.lock().len())
    }
}
