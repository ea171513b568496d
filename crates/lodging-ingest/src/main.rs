//! Lodging Ingest - registry import and reporting tool

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use lodging_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use lodging_ingest::{geojson, importer, record::NewAccommodation, report, DEFAULT_DATABASE_URL};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec})";

#[derive(Parser, Debug)]
#[command(name = "lodging-ingest")]
#[command(author, version, about = "Import and summarize the accommodation registry")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a GeoJSON export into the accommodations table
    Import {
        /// Input GeoJSON file
        #[arg(short, long, default_value = "aa.geojson")]
        input: PathBuf,

        /// PostgreSQL connection string
        #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        db: String,

        /// Rows per transaction
        #[arg(
            short,
            long,
            default_value_t = importer::DEFAULT_BATCH_SIZE as u32,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        batch: u32,
    },

    /// Print summary counts over the imported table
    Report {
        /// PostgreSQL connection string
        #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        db: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Console)
        .log_file_prefix("lodging-ingest")
        .filter_directives("sqlx=warn")
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env_with(log_config)?;
    let _log_guard = init_logging(&log_config)?;

    match cli.command {
        Command::Import { input, db, batch } => run_import(&input, &db, batch as usize).await,
        Command::Report { db } => {
            let pool = connect(&db).await?;
            let report = report::fetch_report(&pool).await?;
            print!("{}", report);
            pool.close().await;
            Ok(())
        },
    }
}

async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(6)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

async fn run_import(input: &Path, db: &str, batch_size: usize) -> Result<()> {
    info!("Starting import from {}", input.display());

    let pool = connect(db).await?;
    importer::ensure_schema(&pool).await?;

    let collection = geojson::read_collection(input).await?;
    let records: Vec<NewAccommodation> =
        collection.features.iter().map(NewAccommodation::from).collect();

    let unlocated = records.iter().filter(|r| !r.has_location()).count();
    if unlocated > 0 {
        warn!(count = unlocated, "Accommodations without usable coordinates");
    }
    info!("Found {} accommodations to import", records.len());

    let progress = ProgressBar::new(records.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    let summary = importer::import(&pool, &records, batch_size, &progress).await?;
    progress.finish_and_clear();

    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        total = summary.total,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        records_per_sec = summary.rate().round(),
        "Import completed"
    );

    pool.close().await;
    Ok(())
}
