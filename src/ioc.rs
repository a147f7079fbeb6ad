//! Indicator-of-compromise extraction
//!
//! Three independent regex passes over normalized report text: file hashes,
//! IPv4 addresses, and domain names. The patterns deliberately favor recall
//! over precision; "999.999.999.999" matches the IPv4 pass and that is
//! accepted. Repeats within a field are allowed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// Hex strings 32-64 chars cover the MD5/SHA1/SHA256 family.
static HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-f0-9]{32,64}\b").unwrap());

static IPV4_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").unwrap());

static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[A-Za-z0-9-]+\.)+[A-Za-z]{2,}\b").unwrap());

/// Indicators extracted from a single document.
///
/// Derived data: recomputed from the text every time, never treated as a
/// source of truth separate from the report it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub hashes: Vec<String>,
    pub ip_addrs: Vec<String>,
    pub domains: Vec<String>,
}

impl IndicatorSet {
    /// Scan `text` for hashes, IPv4 addresses, and domains.
    pub fn extract(text: &str) -> Self {
        Self {
            hashes: matches_of(&HASH_RE, text),
            ip_addrs: matches_of(&IPV4_RE, text),
            domains: matches_of(&DOMAIN_RE, text),
        }
    }

    /// Total indicator count across all three fields.
    pub fn len(&self) -> usize {
        self.hashes.len() + self.ip_addrs.len() + self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_of(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}
