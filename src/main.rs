//! Carrier-Scout main entry point
//!
//! This is the command-line interface for the Carrier-Scout directory harvester.

use anyhow::Context;
use carrier_scout::config::{load_config_with_hash, Config};
use carrier_scout::output::{list_sources, write_json};
use carrier_scout::{PageFetcher, Pipeline, SourceId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Carrier-Scout: freight carrier directory harvester
///
/// Carrier-Scout reads carrier listings from freight directory sites, one
/// listing page at a time, and prints every company with its routes and
/// contact details as JSON.
#[derive(Parser, Debug)]
#[command(name = "carrier-scout")]
#[command(version = "1.0.0")]
#[command(about = "A freight carrier directory harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the registered sources and their page counts
    Sources {
        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Run one listing page of one source
    Run {
        /// Numeric source id (see `sources`)
        #[arg(short, long)]
        source: u32,

        /// Listing page, starting at 1
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let fetcher = PageFetcher::new(&config.http)?;

    match cli.command {
        Command::Sources { compact } => handle_sources(&fetcher, &config, compact).await,
        Command::Run {
            source,
            page,
            compact,
        } => handle_run(fetcher, &config, source, page, compact).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("carrier_scout=info,warn"),
            1 => EnvFilter::new("carrier_scout=debug,info"),
            2 => EnvFilter::new("carrier_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout carries only JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `sources`: prints id, name and page count of every source
async fn handle_sources(
    fetcher: &PageFetcher,
    config: &Config,
    compact: bool,
) -> anyhow::Result<()> {
    let listings = list_sources(fetcher, config).await?;
    write_json(std::io::stdout().lock(), &listings, compact)?;
    Ok(())
}

/// Handles `run`: scrapes one listing page and prints the outcome
async fn handle_run(
    fetcher: PageFetcher,
    config: &Config,
    source: u32,
    page: u32,
    compact: bool,
) -> anyhow::Result<()> {
    let source = match SourceId::from_id(source) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };

    tracing::info!("Running {} page {}", source, page);
    let pipeline = Pipeline::new(source.build(fetcher, config)?);
    let outcome = pipeline.run_page(page).await;

    write_json(std::io::stdout().lock(), &outcome, compact)?;
    Ok(())
}
