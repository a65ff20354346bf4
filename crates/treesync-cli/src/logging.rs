//! Log sinks for the treesync binary
//!
//! Events go to a daily log file `sync.YYYY-MM-DD.log` in the log directory and,
//! unless disabled, to the console.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use treesync_config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "sync";
const LOG_FILE_SUFFIX: &str = "log";

/// Make sure the log directory exists
///
/// A missing directory is created when its parent exists; otherwise startup fails.
pub fn prepare_log_dir(log_dir: &Path) -> Result<()> {
    if log_dir.is_dir() {
        return Ok(());
    }

    match log_dir.parent() {
        Some(parent) if parent.is_dir() => fs::create_dir(log_dir)
            .with_context(|| format!("Failed to create log directory '{}'", log_dir.display())),
        _ => bail!(
            "Log directory '{}' does not exist and neither does its parent",
            log_dir.display()
        ),
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the log file when dropped and must live as long
/// as the process logs.
pub fn init(config: &LoggingConfig, log_dir: &Path) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_ascii_lowercase()))
        .context("Invalid log level")?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)
        .with_context(|| format!("Failed to open log file in '{}'", log_dir.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false);
    let console_layer = config
        .console
        .then(|| fmt::layer().with_target(false).compact());

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}
