//! One synchronization cycle
//!
//! A cycle scans both trees, mirrors the source directories, reconciles the
//! destination files, prunes obsolete directories and copies what is still
//! missing. An empty destination skips hashing and receives a bulk copy.

use crate::dump::ResidualDump;
use crate::mirror::DirectoryMirror;
use crate::prune::DirectoryPruner;
use crate::reconcile::Reconciler;
use crate::scanner::{TreeListing, TreeScanner};
use chrono::Local;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, info_span};
use treesync_types::{
    CycleId, CycleOutcome, CycleReport, CycleStats, Error, FileSystem, Result, SyncConfig,
};

/// Runs reconciliation cycles for one source/destination pair
#[derive(Debug)]
pub struct SyncEngine<F> {
    config: SyncConfig,
    fs: F,
    scanner: TreeScanner,
}

impl<F: FileSystem> SyncEngine<F> {
    /// Create an engine for `config` issuing mutations through `fs`
    pub fn new(config: SyncConfig, fs: F) -> Self {
        let scanner = TreeScanner::new(config.block_size());
        Self {
            config,
            fs,
            scanner,
        }
    }

    /// Configuration the engine was built with
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Filesystem the engine mutates the destination through
    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Run one full cycle
    ///
    /// Scan errors abort the cycle and are returned; so is storage
    /// exhaustion, which callers should treat as fatal. Every other failure is
    /// logged, counted in the report, and skipped.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        let cycle_id = CycleId::new_v4();
        let span = info_span!("cycle", id = %cycle_id);
        let _enter = span.enter();

        let started_at = Local::now();
        let timer = Instant::now();
        let source = self.config.source();
        let destination = self.config.destination();
        info!(
            "Cycle started: '{}' -> '{}'",
            source.display(),
            destination.display()
        );

        let mut stats = CycleStats::new();
        self.prepare_destination(&mut stats)?;

        let outcome = if is_empty_dir(destination)? {
            let listing = self.scanner.list(source)?;
            if listing.is_empty() {
                debug!("Both trees are empty");
                CycleOutcome::Reconciled
            } else {
                self.full_copy(&listing, &mut stats)?;
                CycleOutcome::FullCopy
            }
        } else {
            self.reconcile(&mut stats)?;
            CycleOutcome::Reconciled
        };

        stats.duration = timer.elapsed();
        let finished_at = Local::now();
        info!(
            "Cycle finished in {:.3} seconds: {} renamed, {} copied, {} deleted, {} directories created, {} removed, {} errors",
            stats.duration.as_secs_f64(),
            stats.files_renamed,
            stats.files_copied,
            stats.files_deleted,
            stats.directories_created,
            stats.directories_removed,
            stats.errors
        );

        Ok(CycleReport {
            cycle_id,
            started_at,
            finished_at,
            outcome,
            stats,
        })
    }

    /// Create the destination root if it is missing
    fn prepare_destination(&self, stats: &mut CycleStats) -> Result<()> {
        let destination = self.config.destination();
        if destination.is_dir() {
            return Ok(());
        }
        if destination.exists() {
            return Err(Error::scan(destination, "not a directory"));
        }

        match self.fs.create_dir(destination) {
            Ok(()) => {
                info!("Created destination root '{}'", destination.display());
                stats.directories_created += 1;
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Err(Error::scan(destination, e.to_string())),
        }
    }

    /// Scan, clear unmanaged entries, mirror, reconcile, prune and dump
    fn reconcile(&self, stats: &mut CycleStats) -> Result<()> {
        let source_root = self.config.source();
        let destination_root = self.config.destination();

        let source = self.scanner.scan(source_root)?;
        let destination = self.scanner.scan(destination_root)?;
        stats.source_files = source.table.len() as u64;
        stats.destination_files = destination.table.len() as u64;

        let reconciler = Reconciler::new(&self.fs);
        reconciler.remove_unmanaged(destination_root, &destination.unmanaged, stats)?;
        DirectoryMirror::new(&self.fs).mirror(destination_root, &source.directories, stats)?;

        let mut source_table = source.table;
        let mut destination_table = destination.table;
        reconciler.reconcile(
            destination_root,
            &mut source_table,
            &mut destination_table,
            stats,
        )?;

        DirectoryPruner::new(&self.fs).prune(
            source_root,
            destination_root,
            &destination.directories,
            &source_table,
            stats,
        )?;

        ResidualDump::new(&self.fs).dump(source_root, destination_root, &mut source_table, stats)
    }

    /// Copy the whole source tree into an empty destination without hashing
    fn full_copy(&self, listing: &TreeListing, stats: &mut CycleStats) -> Result<()> {
        let source_root = self.config.source();
        let destination_root = self.config.destination();
        info!(
            "Destination is empty, copying {} files without hashing",
            listing.files.len()
        );

        DirectoryMirror::new(&self.fs).mirror(destination_root, &listing.directories, stats)?;

        let dump = ResidualDump::new(&self.fs);
        for relative in &listing.files {
            dump.copy(source_root, destination_root, relative, stats)?;
        }
        Ok(())
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| Error::scan(path, e.to_string()))?;
    Ok(entries.next().is_none())
}
