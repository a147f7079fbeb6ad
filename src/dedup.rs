//! Content deduplication index
//!
//! An in-memory working set of MinHash fingerprints, loaded once per run
//! from the persisted corpus. Every candidate document is tested against
//! the full historical set before insertion, so duplicates are caught both
//! across runs and within the same run.
//!
//! The index is append-only within a run: a non-duplicate candidate's
//! fingerprint must be pushed immediately after its report persists, and
//! callers that process candidates concurrently must hold one lock across
//! the whole check-then-persist-then-append sequence. `IngestPipeline`
//! wraps the index in a mutex for exactly that reason.

use crate::fingerprint::Fingerprint;
use crate::store::ReportStore;
use anyhow::Result;
use tracing::debug;

/// Default similarity threshold: documents judged >= 0.7 similar are
/// treated as the same underlying report.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// In-memory fingerprint set for duplicate detection.
pub struct DedupIndex {
    fingerprints: Vec<Fingerprint>,
    threshold: f64,
}

impl DedupIndex {
    /// Create an empty index with the given threshold.
    pub fn new(threshold: f64) -> Self {
        Self {
            fingerprints: Vec::new(),
            threshold,
        }
    }

    /// Load every persisted fingerprint from the stored corpus.
    pub fn load(store: &dyn ReportStore, threshold: f64) -> Result<Self> {
        let fingerprints = store.fingerprints()?;
        debug!(count = fingerprints.len(), "loaded dedup index from store");
        Ok(Self {
            fingerprints,
            threshold,
        })
    }

    /// True iff `candidate` is at least `1 - threshold` similar to any
    /// fingerprint already in the index. One linear scan per candidate
    /// document; the corpus is checked once per document, not per token.
    pub fn is_duplicate(&self, candidate: &Fingerprint) -> bool {
        let cutoff = 1.0 - self.threshold;
        self.fingerprints
            .iter()
            .any(|existing| candidate.similarity(existing) >= cutoff)
    }

    /// Append a fingerprint after its report has been persisted.
    pub fn insert(&mut self, fingerprint: Fingerprint) {
        self.fingerprints.push(fingerprint);
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}
