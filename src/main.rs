use anyhow::{Context, Result};
use bwfcal::harness::{HarnessOptions, run_harness};
use bwfcal::pipeline::{
    ConfigOptions, SyncOptions, list_tournaments, load_run_config, run_sync, validate_config,
};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "bwfcal",
    about = "Sync BWF tournament dates into a Google Calendar"
)]
struct Cli {
    /// TOML config file; bwfcal.toml is read when present
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, env = "BWFCAL_LOG_FILE", default_value = "bwfcal.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape the calendar page and create missing events
    Sync {
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long)]
        year: Option<i32>,
        /// Read the page from a saved HTML file instead of fetching it
        #[arg(long)]
        source_file: Option<PathBuf>,
    },
    /// Print matching tournaments as JSON
    List {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        source_file: Option<PathBuf>,
    },
    Validate,
    /// Sync twice into an in-memory calendar and report duplicates
    Harness {
        #[arg(long)]
        source_file: PathBuf,
        #[arg(long)]
        year: Option<i32>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;

    match cli.command {
        Commands::Sync {
            dry_run,
            year,
            source_file,
        } => {
            info!("starting tournament calendar sync");
            run_sync(&SyncOptions {
                config: ConfigOptions {
                    config_path: cli.config,
                    source_file,
                    year,
                },
                dry_run,
            })?;
            info!("sync finished");
        }
        Commands::List { year, source_file } => {
            let config = load_run_config(&ConfigOptions {
                config_path: cli.config,
                source_file,
                year,
            })?;
            let tournaments = list_tournaments(&config);
            println!("{}", serde_json::to_string_pretty(&tournaments)?);
        }
        Commands::Validate => {
            let messages = validate_config(&ConfigOptions {
                config_path: cli.config,
                ..ConfigOptions::default()
            })?;
            for line in messages {
                println!("{line}");
            }
        }
        Commands::Harness { source_file, year } => {
            let report = run_harness(&HarnessOptions {
                config: ConfigOptions {
                    config_path: cli.config,
                    source_file: Some(source_file),
                    year,
                },
            })?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn init_tracing(log_file: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}
