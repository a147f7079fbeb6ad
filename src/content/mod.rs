//! Document normalization
//!
//! Turns a fetched raw artifact (HTML page, PDF bytes, or an archive record)
//! into a clean plain-text body plus minimal metadata. Empty extraction is a
//! distinct failure, never a zero-length success, so the orchestrator can
//! count it accurately.

mod html;
mod pdf;

pub use html::HtmlNormalizer;
pub use pdf::PdfNormalizer;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from the normalization stage.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("no extractable text in document")]
    EmptyContent,
    #[error("failed to parse HTML content: {0}")]
    Html(String),
    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),
}

/// The unprocessed payload fetched for one candidate link.
///
/// Transient: lives only for the duration of one ingestion attempt.
#[derive(Debug, Clone)]
pub enum RawArtifact {
    Html { body: String, url: String },
    Pdf { bytes: Vec<u8>, url: String },
    ArchiveRecord { id: String, plain_text: String },
}

impl RawArtifact {
    /// The logical source link recorded for the document.
    pub fn source_link(&self) -> String {
        match self {
            RawArtifact::Html { url, .. } => url.clone(),
            RawArtifact::Pdf { url, .. } => url.clone(),
            RawArtifact::ArchiveRecord { id, .. } => format!("ORKL Report {}", id),
        }
    }
}

/// A successfully normalized document, ready for fingerprinting.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    /// Clean plain-text body; non-empty by construction.
    pub plain_text: String,
    /// Where the document came from.
    pub source_link: String,
    /// When the candidate link was processed.
    pub discovered_at: DateTime<Utc>,
}

/// Normalize a raw artifact into plain text.
pub fn normalize(artifact: RawArtifact) -> Result<NormalizedDocument, NormalizeError> {
    let source_link = artifact.source_link();
    let plain_text = match artifact {
        RawArtifact::Html { body, url } => HtmlNormalizer::extract(&body, Some(&url))?,
        RawArtifact::Pdf { bytes, .. } => PdfNormalizer::extract(&bytes)?,
        RawArtifact::ArchiveRecord { plain_text, .. } => {
            let cleaned = plain_text.trim().to_string();
            if cleaned.is_empty() {
                return Err(NormalizeError::EmptyContent);
            }
            cleaned
        }
    };

    Ok(NormalizedDocument {
        plain_text,
        source_link,
        discovered_at: Utc::now(),
    })
}
