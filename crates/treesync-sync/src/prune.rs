//! Removal of destination directories that no longer exist in the source

use crate::skip_item;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use treesync_types::{is_tree_root, CycleStats, DirectorySet, FileSystem, FileTable, Result};

/// Removes obsolete destination directories recursively
#[derive(Debug, Clone)]
pub struct DirectoryPruner<F> {
    fs: F,
}

impl<F: FileSystem> DirectoryPruner<F> {
    /// Create a pruner issuing mutations through `fs`
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Remove every directory in `directories` whose counterpart under
    /// `source_root` is not a directory
    ///
    /// Directories below one that was just removed are not revisited. Empty
    /// directories that still exist in the source are kept, and so is anything
    /// at or below a path the source scan could not read.
    pub fn prune(
        &self,
        source_root: &Path,
        destination_root: &Path,
        directories: &DirectorySet,
        source: &FileTable,
        stats: &mut CycleStats,
    ) -> Result<()> {
        let mut removed: Option<PathBuf> = None;

        for relative in directories.iter() {
            if is_tree_root(relative) {
                continue;
            }
            // descendants sort directly after their ancestor
            if removed
                .as_deref()
                .is_some_and(|ancestor| relative.starts_with(ancestor))
            {
                continue;
            }
            if source_root.join(relative).is_dir() {
                continue;
            }
            if source.is_skipped(relative) {
                debug!("Kept '{}': source side could not be read", relative.display());
                continue;
            }

            let path = destination_root.join(relative);
            match self.fs.remove_dir_all(&path) {
                Ok(()) => {
                    info!("Removed directory '{}'", path.display());
                    stats.directories_removed += 1;
                    removed = Some(relative.to_path_buf());
                }
                Err(e) => {
                    skip_item(e, &format!("removing directory '{}'", path.display()), stats)?;
                }
            }
        }

        debug!("Removed {} obsolete directories", stats.directories_removed);
        Ok(())
    }
}
