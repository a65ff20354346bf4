//! treesync - scheduled one-way directory synchronizer
//!
//! Keeps a destination tree identical to a source tree, re-running on a fixed
//! interval. Moved and renamed files are detected by content hash and renamed
//! in place instead of being copied again.

mod display;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use treesync_config::{Config, ConfigLoader};
use treesync_sync::{LocalFs, Scheduler, SyncEngine};
use treesync_types::TimeUnit;

/// treesync - scheduled one-way directory synchronizer
#[derive(Parser, Debug)]
#[command(
    name = "treesync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Scheduled one-way directory synchronizer",
    long_about = "treesync keeps a destination directory identical to a source directory.\n\
                  Files are matched by content hash, so moved and renamed files are renamed\n\
                  on the destination instead of being copied again."
)]
struct Cli {
    /// Source directory
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Destination directory
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Interval between cycle starts
    #[arg(short, long)]
    interval: Option<u64>,

    /// Unit of the interval: S, M, H or D
    #[arg(short, long, value_parser = parse_time_unit)]
    time_unit: Option<TimeUnit>,

    /// Directory for the daily log files
    #[arg(short, long)]
    log_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single cycle, print its report and exit
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Quiet mode - no console output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Apply command line values on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.sync.source = Some(source.clone());
        }
        if let Some(destination) = &self.destination {
            config.sync.destination = Some(destination.clone());
        }
        if let Some(interval) = self.interval {
            config.sync.interval = interval;
        }
        if let Some(time_unit) = self.time_unit {
            config.sync.time_unit = time_unit;
        }
        if let Some(log_dir) = &self.log_dir {
            config.logging.log_dir = log_dir.clone();
        }
        if self.debug {
            config.logging.level = "debug".to_string();
        }
        if self.quiet {
            config.logging.console = false;
        }
    }
}

fn parse_time_unit(value: &str) -> std::result::Result<TimeUnit, String> {
    value.parse()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !quiet {
                display::display_error(&format!("{:#}", e));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from '{}'", path.display()))?,
        None => ConfigLoader::load_default().context("Failed to load configuration")?,
    };
    cli.apply(&mut config);

    let sync_config = config
        .to_sync_config()
        .context("Invalid configuration")?;
    logging::prepare_log_dir(sync_config.log_dir())?;
    let _guard = logging::init(&config.logging, sync_config.log_dir())?;

    info!("treesync v{} starting", env!("CARGO_PKG_VERSION"));
    if !cli.quiet {
        display::display_start(&sync_config);
    }

    let scheduler = Scheduler::new(SyncEngine::new(sync_config, LocalFs::new()));

    if cli.once {
        let report = scheduler.run_once().await.context("Sync cycle failed")?;
        if !cli.quiet {
            display::display_report(&report);
        }
        return Ok(());
    }

    let fatal = scheduler.run_forever().await;
    Err(anyhow::Error::new(fatal).context("Synchronization stopped"))
}
