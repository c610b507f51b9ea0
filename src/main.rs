//! listings-pipeline - daily real-estate listing acquisition and extraction
//!
//! Each subcommand is one independent trigger; a scheduler calls `acquire`
//! and later `extract` (or `run` for both) once per day.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use listings_pipeline::config::{Config, Delimiter};
use listings_pipeline::jobs::{AcquisitionJob, ExtractionJob, JobStatus};
use listings_pipeline::report::ReportWriter;
use listings_pipeline::site::ListingExtractor;
use listings_pipeline::storage::LocalBlobStore;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "listings-pipeline",
    version,
    about = "Daily real-estate listing acquisition and extraction",
    long_about = "Downloads listing pages into a blob store and extracts them into a daily delimited-text report."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root directory of the local blob store
    #[arg(long, global = true, env = "LISTINGS_STORE_ROOT")]
    store_root: Option<PathBuf>,

    /// Run date (YYYY-MM-DD), defaults to today
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    /// Report field delimiter (comma, semicolon)
    #[arg(long, global = true)]
    delimiter: Option<Delimiter>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the day's listing pages into the landing bucket
    Acquire,

    /// Extract stored pages into the day's report
    Extract,

    /// Acquire, then extract
    Run,

    /// Extract listings from a local HTML file and print the report
    Parse {
        /// HTML file to parse
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for status payloads
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(root) = cli.store_root {
        config.store_root = root;
    }
    if let Some(delimiter) = cli.delimiter {
        config.delimiter = delimiter;
    }

    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let store = LocalBlobStore::new(config.store_root.clone());

    let statuses: Vec<JobStatus> = match cli.command {
        Commands::Acquire => vec![AcquisitionJob::new(config, date).run(&store).await],

        Commands::Extract => vec![ExtractionJob::new(config, date).run(&store).await],

        Commands::Run => {
            let acquired = AcquisitionJob::new(config.clone(), date).run(&store).await;
            let extracted = ExtractionJob::new(config, date).run(&store).await;
            vec![acquired, extracted]
        }

        Commands::Parse { file } => {
            let markup = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read HTML file: {}", file.display()))?;

            let records = ListingExtractor::new().extract(&markup, date);
            info!(records = records.len(), file = %file.display(), "Parsed file");

            print!("{}", ReportWriter::new(config.delimiter).render(&records));
            return Ok(ExitCode::SUCCESS);
        }
    };

    for status in &statuses {
        println!("{}", status.to_json());
    }

    if statuses.iter().all(JobStatus::is_ok) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
