//! Candidate link lists
//!
//! Loads the persisted two-column `link,date` file, filters it to one
//! exact date bucket, and classifies each link by URL shape so the
//! orchestrator can dispatch to the right adapter.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::Path;
use url::Url;

/// Date-bucket format used across link lists and stored reports.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// One candidate link and the day it was discovered. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub link: String,
    pub date: NaiveDate,
}

/// Which adapter handles a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A GitHub repository to harvest PDFs from.
    GithubRepo,
    /// An arbitrary report page fetched directly.
    Web,
}

/// Classify a link by URL shape.
pub fn classify(link: &str) -> SourceKind {
    let is_github = Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(|h| h == "github.com" || h == "www.github.com"))
        .unwrap_or(false);
    if is_github {
        SourceKind::GithubRepo
    } else {
        SourceKind::Web
    }
}

/// Load every candidate link from a `link,date` file. The first line is
/// a header and is skipped; blank lines are ignored.
pub fn load_links(path: impl AsRef<Path>) -> Result<Vec<CandidateLink>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read links file {:?}", path))?;
    parse_links(&content).with_context(|| format!("failed to parse links file {:?}", path))
}

fn parse_links(content: &str) -> Result<Vec<CandidateLink>> {
    let mut links = Vec::new();
    for (lineno, line) in content.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((link, date)) = line.rsplit_once(',') else {
            bail!("line {}: expected 'link,date'", lineno + 1);
        };
        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .with_context(|| format!("line {}: bad date '{}'", lineno + 1, date.trim()))?;
        links.push(CandidateLink {
            link: link.trim().to_string(),
            date,
        });
    }
    Ok(links)
}

/// Keep only the links discovered on `date` (exact bucket equality).
pub fn filter_by_date(links: Vec<CandidateLink>, date: NaiveDate) -> Vec<CandidateLink> {
    links.into_iter().filter(|l| l.date == date).collect()
}
