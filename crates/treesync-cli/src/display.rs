//! Console output for the treesync binary

use console::style;
use std::time::Duration;
use treesync_types::{CycleOutcome, CycleReport, SyncConfig};

/// Announce what is being synchronized
pub fn display_start(config: &SyncConfig) {
    println!(
        "{} Synchronizing {} to {} every {}",
        style("⟲").blue().bold(),
        style(config.source().display()).cyan(),
        style(config.destination().display()).cyan(),
        style(config.interval()).yellow()
    );
    println!(
        "  Logging to {}",
        style(config.log_dir().display()).dim()
    );
}

/// Print the statistics of one cycle
pub fn display_report(report: &CycleReport) {
    let stats = &report.stats;
    let outcome = match report.outcome {
        CycleOutcome::Reconciled => "reconciled",
        CycleOutcome::FullCopy => "full copy",
    };

    println!();
    println!("{}", style("Cycle Statistics:").bold().underlined());
    println!("  Cycle: {} ({})", style(report.cycle_id).dim(), outcome);
    println!(
        "  Started: {}",
        style(report.started_at.format("%Y-%m-%d %H:%M:%S")).blue()
    );
    println!("  Files scanned: {} source, {} destination", stats.source_files, stats.destination_files);
    println!("  Files unchanged: {}", style(stats.files_passed).green());
    println!("  Files renamed: {}", style(stats.files_renamed).green());
    println!("  Files copied: {}", style(stats.files_copied).green());
    println!("  Files deleted: {}", style(stats.files_deleted).yellow());
    println!(
        "  Directories: {} created, {} removed",
        stats.directories_created, stats.directories_removed
    );
    println!(
        "  Bytes copied: {}",
        style(format_bytes(stats.bytes_copied)).green()
    );
    println!(
        "  Errors: {}",
        if stats.errors > 0 {
            style(stats.errors).red()
        } else {
            style(stats.errors).green()
        }
    );
    println!(
        "  Duration: {}",
        style(format_duration(stats.duration)).blue()
    );
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Display error message
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}
