//! Copying of source content the destination does not have

use crate::mirror::ensure_dir;
use crate::skip_item;
use std::path::Path;
use tracing::info;
use treesync_types::{CycleStats, FileSystem, FileTable, Result};

/// Copies unresolved source files into the destination tree
#[derive(Debug, Clone)]
pub struct ResidualDump<F> {
    fs: F,
}

impl<F: FileSystem> ResidualDump<F> {
    /// Create a dump issuing mutations through `fs`
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Copy every unresolved entry of `source` and resolve it
    ///
    /// Entries whose copy fails stay unresolved.
    pub fn dump(
        &self,
        source_root: &Path,
        destination_root: &Path,
        source: &mut FileTable,
        stats: &mut CycleStats,
    ) -> Result<()> {
        let pending: Vec<usize> = source.unresolved().collect();
        for index in pending {
            let Some(relative) = source.get(index).map(|entry| entry.relative_path()) else {
                continue;
            };
            if self.copy(source_root, destination_root, &relative, stats)? {
                source.resolve(index);
            }
        }
        Ok(())
    }

    /// Copy one file from `source_root` to the same relative path under
    /// `destination_root`, creating missing parents first
    ///
    /// Returns whether the file was copied. Per-item failures are logged and
    /// counted.
    pub fn copy(
        &self,
        source_root: &Path,
        destination_root: &Path,
        relative: &Path,
        stats: &mut CycleStats,
    ) -> Result<bool> {
        let from = source_root.join(relative);
        let to = destination_root.join(relative);
        let action = format!("copying '{}' -> '{}'", from.display(), to.display());

        if let Some(parent) = relative.parent() {
            if let Err(e) = ensure_dir(&self.fs, destination_root, parent, stats) {
                skip_item(e, &action, stats)?;
                return Ok(false);
            }
        }

        match self.fs.copy_file(&from, &to) {
            Ok(bytes) => {
                info!("Copied '{}' -> '{}' ({} bytes)", from.display(), to.display(), bytes);
                stats.files_copied += 1;
                stats.bytes_copied += bytes;
                Ok(true)
            }
            Err(e) => {
                skip_item(e, &action, stats)?;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalFs;
    use std::fs;
    use tempfile::TempDir;
    use treesync_types::{ContentHash, FileEntry};

    #[test]
    fn test_dump_copies_unresolved_entries_only() {
        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("nested/dir")).unwrap();
        fs::write(source.path().join("nested/dir/new.txt"), b"new").unwrap();
        fs::write(source.path().join("done.txt"), b"done").unwrap();

        let mut table = FileTable::new();
        let done = table.push(FileEntry::new("", "done.txt", ContentHash::new("h1")));
        table.push(FileEntry::new("nested/dir", "new.txt", ContentHash::new("h2")));
        table.resolve(done);
        let mut stats = CycleStats::new();

        ResidualDump::new(LocalFs::new())
            .dump(source.path(), destination.path(), &mut table, &mut stats)
            .unwrap();

        assert_eq!(stats.files_copied, 1);
        assert_eq!(stats.bytes_copied, 3);
        assert_eq!(stats.directories_created, 2);
        assert!(!destination.path().join("done.txt").exists());
        assert_eq!(
            fs::read(destination.path().join("nested/dir/new.txt")).unwrap(),
            b"new"
        );
        assert_eq!(table.unresolved().count(), 0);
    }

    #[test]
    fn test_vanished_source_file_is_skipped() {
        let source = TempDir::new().unwrap();
        let destination = TempDir::new().unwrap();
        let mut table = FileTable::new();
        table.push(FileEntry::new("", "vanished.txt", ContentHash::new("h1")));
        let mut stats = CycleStats::new();

        ResidualDump::new(LocalFs::new())
            .dump(source.path(), destination.path(), &mut table, &mut stats)
            .unwrap();

        assert_eq!(stats.files_copied, 0);
        assert_eq!(stats.errors, 1);
        assert_eq!(table.unresolved().count(), 1);
    }
}
