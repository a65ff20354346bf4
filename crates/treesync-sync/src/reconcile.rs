//! Hash-based reconciliation of the destination tree
//!
//! Every destination file is matched against source files with the same
//! content hash. Depending on how many files share the hash on each side the
//! destination file is left in place, renamed to where the source keeps that
//! content, or deleted. Source entries left unresolved afterwards hold content
//! the destination does not have yet.
//!
//! Renames never overwrite. A rename whose target is occupied is deferred and
//! retried after the main pass for as long as retries keep making progress;
//! moves that stay blocked on each other are broken up by deleting one
//! destination file and leaving its source entry for the dump.

use crate::mirror::ensure_dir;
use crate::skip_item;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use treesync_types::{CycleStats, Error, FileSystem, FileTable, Result};

/// What happened to one attempted rename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveOutcome {
    Moved,
    Occupied,
    Failed,
}

/// A rename postponed because its target was occupied
#[derive(Debug, Clone, Copy)]
struct DeferredMove {
    destination: usize,
    source: usize,
}

/// Applies the minimal rename and delete set to the destination tree
#[derive(Debug, Clone)]
pub struct Reconciler<F> {
    fs: F,
}

impl<F: FileSystem> Reconciler<F> {
    /// Create a reconciler issuing mutations through `fs`
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Reconcile `destination` against `source`
    ///
    /// On return every destination entry is resolved. Source entries matched by
    /// a destination file are resolved; the rest still need copying.
    pub fn reconcile(
        &self,
        destination_root: &Path,
        source: &mut FileTable,
        destination: &mut FileTable,
        stats: &mut CycleStats,
    ) -> Result<()> {
        let mut deferred = Vec::new();

        for index in 0..destination.len() {
            let Some(entry) = destination.get(index) else {
                continue;
            };
            if entry.is_resolved() {
                continue;
            }
            let hash = entry.content_hash.clone();
            let source_group = source.group(&hash).to_vec();
            let destination_group = destination.group(&hash).to_vec();

            if source_group.is_empty() {
                let relative = entry.relative_path();
                self.delete_stale(destination_root, source, &relative, stats)?;
                destination.resolve(index);
            } else if source_group.len() == 1 && destination_group.len() == 1 {
                self.pair(
                    destination_root,
                    source,
                    destination,
                    (index, source_group[0]),
                    &mut deferred,
                    stats,
                )?;
            } else {
                self.resolve_group(
                    destination_root,
                    source,
                    destination,
                    &source_group,
                    &destination_group,
                    &mut deferred,
                    stats,
                )?;
            }
        }

        self.retry_deferred(destination_root, source, destination, deferred, stats)
    }

    /// Delete destination entries that are neither regular files nor directories
    ///
    /// Runs before any directory is created or file copied, so no later write
    /// can pass through a symbolic link.
    pub fn remove_unmanaged(
        &self,
        destination_root: &Path,
        unmanaged: &[PathBuf],
        stats: &mut CycleStats,
    ) -> Result<()> {
        for relative in unmanaged {
            self.delete(destination_root, relative, stats)?;
        }
        Ok(())
    }

    /// Resolve one destination entry against its single source twin
    fn pair(
        &self,
        destination_root: &Path,
        source: &mut FileTable,
        destination: &mut FileTable,
        (dst, src): (usize, usize),
        deferred: &mut Vec<DeferredMove>,
        stats: &mut CycleStats,
    ) -> Result<()> {
        let from = relative_path(destination, dst);
        let to = relative_path(source, src);
        destination.resolve(dst);

        if from == to {
            debug!("Unchanged '{}'", to.display());
            stats.files_passed += 1;
            source.resolve(src);
            return Ok(());
        }

        match self.move_file(destination_root, &from, &to, stats)? {
            MoveOutcome::Moved => source.resolve(src),
            MoveOutcome::Occupied => deferred.push(DeferredMove {
                destination: dst,
                source: src,
            }),
            MoveOutcome::Failed => {}
        }
        Ok(())
    }

    /// Resolve every member of one duplicate group as a unit
    #[allow(clippy::too_many_arguments)]
    fn resolve_group(
        &self,
        destination_root: &Path,
        source: &mut FileTable,
        destination: &mut FileTable,
        source_group: &[usize],
        destination_group: &[usize],
        deferred: &mut Vec<DeferredMove>,
        stats: &mut CycleStats,
    ) -> Result<()> {
        let mut source_members = unresolved_sorted(source, source_group);
        let destination_members = unresolved_sorted(destination, destination_group);

        let mut source_by_path: HashMap<PathBuf, usize> = source_members
            .iter()
            .map(|(path, index)| (path.clone(), *index))
            .collect();

        let mut remaining = Vec::with_capacity(destination_members.len());
        for (path, dst) in destination_members {
            if let Some(src) = source_by_path.remove(&path) {
                debug!("Unchanged '{}'", path.display());
                stats.files_passed += 1;
                source.resolve(src);
                destination.resolve(dst);
            } else {
                remaining.push((path, dst));
            }
        }
        source_members.retain(|(path, _)| source_by_path.contains_key(path));

        let paired = remaining.len().min(source_members.len());
        for ((_, dst), (_, src)) in remaining.iter().zip(source_members.iter()) {
            self.pair(
                destination_root,
                source,
                destination,
                (*dst, *src),
                deferred,
                stats,
            )?;
        }

        for (path, dst) in remaining.into_iter().skip(paired) {
            self.delete_stale(destination_root, source, &path, stats)?;
            destination.resolve(dst);
        }

        if source_members.len() > paired {
            debug!(
                "{} duplicate(s) of {} left for copying",
                source_members.len() - paired,
                source_members[0].0.display()
            );
        }
        Ok(())
    }

    /// Retry postponed renames until a pass moves nothing
    ///
    /// Chains of renames (`a -> b`, `b -> c`) unwind over several passes. When
    /// a pass makes no progress the remaining moves form cycles; the first one
    /// is broken by deleting its destination file, leaving its source for the
    /// dump, and the rest are retried.
    fn retry_deferred(
        &self,
        destination_root: &Path,
        source: &mut FileTable,
        destination: &FileTable,
        mut pending: Vec<DeferredMove>,
        stats: &mut CycleStats,
    ) -> Result<()> {
        while !pending.is_empty() {
            let before = pending.len();
            let mut occupied = Vec::with_capacity(before);

            for deferred in pending {
                let from = relative_path(destination, deferred.destination);
                let to = relative_path(source, deferred.source);
                match self.move_file(destination_root, &from, &to, stats)? {
                    MoveOutcome::Moved => source.resolve(deferred.source),
                    MoveOutcome::Occupied => occupied.push(deferred),
                    MoveOutcome::Failed => {}
                }
            }

            if occupied.len() == before {
                let stuck = occupied.remove(0);
                let from = relative_path(destination, stuck.destination);
                let to = relative_path(source, stuck.source);
                warn!(
                    "Target '{}' is still occupied, '{}' will be replaced by a copy",
                    to.display(),
                    from.display()
                );
                self.delete(destination_root, &from, stats)?;
            }
            pending = occupied;
        }
        Ok(())
    }

    /// Rename `from` to `to` under `destination_root`, creating missing parents
    fn move_file(
        &self,
        destination_root: &Path,
        from: &Path,
        to: &Path,
        stats: &mut CycleStats,
    ) -> Result<MoveOutcome> {
        let from_path = destination_root.join(from);
        let to_path = destination_root.join(to);
        let action = format!(
            "renaming '{}' -> '{}'",
            from_path.display(),
            to_path.display()
        );

        if let Some(parent) = to.parent() {
            if let Err(e) = ensure_dir(&self.fs, destination_root, parent, stats) {
                skip_item(e, &action, stats)?;
                return Ok(MoveOutcome::Failed);
            }
        }

        match self.fs.rename(&from_path, &to_path) {
            Ok(()) => {
                info!(
                    "Renamed '{}' -> '{}'",
                    from_path.display(),
                    to_path.display()
                );
                stats.files_renamed += 1;
                Ok(MoveOutcome::Moved)
            }
            Err(Error::TargetExists { .. }) => {
                debug!("Deferred {}: target occupied", action);
                Ok(MoveOutcome::Occupied)
            }
            Err(e) => {
                skip_item(e, &action, stats)?;
                Ok(MoveOutcome::Failed)
            }
        }
    }

    /// Delete a destination file with no source counterpart
    ///
    /// Files whose source twin at the same path could not be hashed are kept.
    fn delete_stale(
        &self,
        destination_root: &Path,
        source: &FileTable,
        relative: &Path,
        stats: &mut CycleStats,
    ) -> Result<()> {
        if source.is_skipped(relative) {
            debug!(
                "Kept '{}': source file could not be hashed",
                relative.display()
            );
            return Ok(());
        }
        self.delete(destination_root, relative, stats)
    }

    fn delete(&self, destination_root: &Path, relative: &Path, stats: &mut CycleStats) -> Result<()> {
        let path = destination_root.join(relative);
        match self.fs.remove_file(&path) {
            Ok(()) => {
                info!("Deleted '{}'", path.display());
                stats.files_deleted += 1;
                Ok(())
            }
            Err(e) => skip_item(e, &format!("deleting '{}'", path.display()), stats),
        }
    }
}

fn relative_path(table: &FileTable, index: usize) -> PathBuf {
    table
        .get(index)
        .map(|entry| entry.relative_path())
        .unwrap_or_default()
}

/// Unresolved members of a group as (relative path, index), sorted by path
fn unresolved_sorted(table: &FileTable, group: &[usize]) -> Vec<(PathBuf, usize)> {
    let mut members: Vec<(PathBuf, usize)> = group
        .iter()
        .filter_map(|&index| table.get(index).map(|entry| (entry, index)))
        .filter(|(entry, _)| !entry.is_resolved())
        .map(|(entry, index)| (entry.relative_path(), index))
        .collect();
    members.sort();
    members
}
