//! IntelHarvest: threat-intelligence report ingestion pipeline
//!
//! Aggregates open-source threat-intelligence reports (vendor blog posts,
//! PDFs harvested from GitHub repositories, paginated report archives),
//! normalizes the extracted text, deduplicates it against the persisted
//! corpus, extracts indicators of compromise, and stores one report per
//! unique document.
//!
//! Key components:
//! - `sources`: adapters for web pages, GitHub repo trees, and
//!   offset-paginated report archives
//! - `content`: readability-based HTML and PDF text normalization
//! - `fingerprint`: deterministic MinHash signatures with Jaccard
//!   similarity estimation
//! - `dedup`: append-only in-memory fingerprint index loaded from the
//!   stored corpus
//! - `ioc`: regex-based indicator extraction (hashes, IPv4, domains)
//! - `pipeline`: the ingestion orchestrator tying it all together

pub mod config;
pub mod content;
pub mod dedup;
pub mod fingerprint;
pub mod ioc;
pub mod links;
pub mod pipeline;
pub mod sources;
pub mod store;

pub use config::Config;
pub use dedup::DedupIndex;
pub use fingerprint::Fingerprint;
pub use ioc::IndicatorSet;
pub use pipeline::{IngestPipeline, IngestStats};
pub use store::{MemoryReportStore, ReportStore, SledReportStore, StoredReport};
