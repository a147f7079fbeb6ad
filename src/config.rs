//! Configuration for the ingestion pipeline

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default user agent: some vendor portals refuse anything that does not
/// look like a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
}

/// Run-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Two-column `link,date` file of candidate links.
    pub links_file: PathBuf,
    /// Directory for the report database.
    pub data_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            links_file: PathBuf::from("links.csv"),
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Generic web fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Optional fixed Referer header.
    pub referer: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            referer: None,
        }
    }
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub raw_base: String,
    /// Branches probed in priority order when resolving a repository head.
    pub branches: Vec<String>,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Bearer token; resolved from the GH_TOKEN environment variable and
    /// never written back to the config file.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            branches: vec!["main".to_string(), "master".to_string()],
            timeout_secs: 10,
            retry_attempts: 2,
            retry_delay_ms: 500,
            token: None,
        }
    }
}

/// Report-archive API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub api_url: String,
    /// Records requested per page.
    pub page_size: u64,
    pub timeout_secs: u64,
    /// Disable to skip the archive walk entirely.
    pub enabled: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            api_url: "https://orkl.eu/api/v1/library/entries".to_string(),
            page_size: 25,
            timeout_secs: 10,
            enabled: true,
        }
    }
}

/// Duplicate-detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Similarity cutoff: documents >= (1 - threshold) similar are
    /// treated as the same report.
    pub threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: crate::dedup::DEFAULT_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, resolve the GitHub credential
    /// from the environment, and validate everything before returning.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file '{}': {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config file '{}': {}", path.display(), e))?;
        config.resolve_credentials();
        config.validate()?;
        Ok(config)
    }

    /// Pull the GitHub bearer token from the environment.
    pub fn resolve_credentials(&mut self) {
        if let Ok(token) = std::env::var("GH_TOKEN") {
            if !token.is_empty() {
                self.github.token = Some(token);
            }
        }
    }

    /// Validate all fields. A missing GitHub credential is a fatal
    /// configuration error: the pipeline must not start without it.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.github.token.is_none() {
            errors.push("GitHub token missing: set the GH_TOKEN environment variable".to_string());
        }
        if self.github.branches.is_empty() {
            errors.push("github.branches must list at least one branch".to_string());
        }
        if !(0.0..=1.0).contains(&self.dedup.threshold) {
            errors.push(format!(
                "dedup.threshold must be in [0, 1], got {}",
                self.dedup.threshold
            ));
        }
        if self.archive.page_size == 0 {
            errors.push("archive.page_size must be at least 1".to_string());
        }
        if self.fetch.timeout_secs == 0 {
            errors.push("fetch.timeout_secs must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("invalid configuration:\n  - {}", errors.join("\n  - "))
        }
    }
}
