//! IntelHarvest: threat-intelligence report ingestion pipeline

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use intelharvest::{
    config::Config,
    links::{self, DATE_FORMAT},
    pipeline::IngestPipeline,
    store::{ReportStore, SledReportStore},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "intelharvest")]
#[command(about = "Threat-intelligence report ingestion and deduplication pipeline")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion pipeline over today's candidate links
    Ingest {
        /// Date bucket to process (YYYY/MM/DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Override the links file from the config
        #[arg(short, long)]
        links: Option<PathBuf>,
    },

    /// Show stored-corpus statistics
    Stats,

    /// Write a default configuration file
    Init {
        /// Where to write it
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Ingest { date, links } => ingest(&cli.config, date, links).await,
        Commands::Stats => stats(&cli.config),
        Commands::Init { path } => init_config(path),
    }
}

async fn ingest(
    config_path: &PathBuf,
    date: Option<String>,
    links_override: Option<PathBuf>,
) -> Result<()> {
    // Configuration errors (including a missing GH_TOKEN) are fatal here,
    // before any link is touched.
    let config = Config::load(config_path)?;

    let date = match date {
        Some(d) => NaiveDate::parse_from_str(&d, DATE_FORMAT)
            .with_context(|| format!("bad date '{}', expected YYYY/MM/DD", d))?,
        None => Utc::now().date_naive(),
    };

    let links_file = links_override.unwrap_or_else(|| config.ingest.links_file.clone());
    let all_links = links::load_links(&links_file)?;
    let todays = links::filter_by_date(all_links, date);

    if todays.is_empty() {
        info!(date = %date.format(DATE_FORMAT), "no candidate links for this date");
    }

    std::fs::create_dir_all(&config.ingest.data_dir)?;
    let store = Arc::new(SledReportStore::open(&config.ingest.data_dir)?);

    let pipeline = IngestPipeline::from_config(&config, store.clone())?;
    let stats = pipeline.run(todays).await;
    store.flush()?;

    println!(
        "ingestion complete: {} persisted, {} failed, {} duplicates skipped",
        stats.persisted, stats.failed, stats.skipped_duplicate
    );
    Ok(())
}

fn stats(config_path: &PathBuf) -> Result<()> {
    // Stats only reads the store; no credential needed.
    let config = if config_path.exists() {
        let content = std::fs::read_to_string(config_path)?;
        toml::from_str(&content).unwrap_or_default()
    } else {
        Config::default()
    };

    let store = SledReportStore::open(&config.ingest.data_dir)?;
    println!("stored reports: {}", store.count()?);
    Ok(())
}

fn init_config(path: PathBuf) -> Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing config at {:?}", path);
    }
    let config = Config::default();
    std::fs::write(&path, toml::to_string_pretty(&config)?)?;
    println!("wrote default configuration to {:?}", path);
    println!("set GH_TOKEN in the environment before running ingest");
    Ok(())
}
