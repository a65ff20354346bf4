//! Hash-based one-way directory reconciliation for treesync
//!
//! This crate makes a destination tree converge onto a source tree, cycle after cycle:
//!
//! - **Content hashing**: files are identified by a BLAKE3 digest of their bytes, not by timestamps
//! - **Tree scanning**: one flat file table and one directory set per tree, rebuilt every cycle
//! - **Reconciliation**: moved and renamed files are renamed on the destination instead of re-copied,
//!   and duplicate content is resolved group by group
//! - **Pruning and dumping**: obsolete directories are removed, genuinely new content is copied
//! - **Scheduling**: cycles repeat on a fixed interval, minus the time the last cycle took
//!
//! # Examples
//!
//! ```rust,no_run
//! use treesync_sync::{LocalFs, Scheduler, SyncEngine};
//! use treesync_types::{Interval, SyncConfig, TimeUnit};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let interval = Interval::new(5, TimeUnit::Minutes)?;
//! let config = SyncConfig::new("/data/photos", "/mnt/backup/photos", "/var/log/treesync", interval)?;
//! let scheduler = Scheduler::new(SyncEngine::new(config, LocalFs::new()));
//! let fatal = scheduler.run_forever().await;
//! eprintln!("stopped: {}", fatal);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod dump;
pub mod engine;
pub mod fs;
pub mod hasher;
pub mod mirror;
pub mod prune;
pub mod reconcile;
pub mod scanner;
pub mod scheduler;

pub use dump::ResidualDump;
pub use engine::SyncEngine;
pub use fs::LocalFs;
pub use hasher::ContentHasher;
pub use mirror::DirectoryMirror;
pub use prune::DirectoryPruner;
pub use reconcile::Reconciler;
pub use scanner::{ScanResult, TreeListing, TreeScanner};
pub use scheduler::{next_delay, Scheduler};

use tracing::{error, warn};
use treesync_types::{CycleStats, Error, Result};

/// Settle a failed per-item action
///
/// Per-item failures are logged with `action` and counted; fatal failures are
/// returned so the whole cycle stops.
pub(crate) fn skip_item(err: Error, action: &str, stats: &mut CycleStats) -> Result<()> {
    if err.is_fatal() {
        error!("Fatal error while {}: {}", action, err);
        return Err(err);
    }
    warn!("Skipped {}: {}", action, err);
    stats.errors += 1;
    Ok(())
}
