//! Destination directory mirroring

use crate::skip_item;
use std::fs;
use std::path::Path;
use tracing::info;
use treesync_types::{is_tree_root, CycleStats, DirectorySet, Error, FileSystem, Result};

/// Creates every source directory under the destination root
#[derive(Debug, Clone)]
pub struct DirectoryMirror<F> {
    fs: F,
}

impl<F: FileSystem> DirectoryMirror<F> {
    /// Create a mirror issuing mutations through `fs`
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Make sure every directory in `directories` exists under `destination_root`
    ///
    /// Directories that cannot be created are logged and skipped.
    pub fn mirror(
        &self,
        destination_root: &Path,
        directories: &DirectorySet,
        stats: &mut CycleStats,
    ) -> Result<()> {
        for relative in directories.iter().filter(|path| !is_tree_root(path)) {
            if let Err(e) = ensure_dir(&self.fs, destination_root, relative, stats) {
                skip_item(
                    e,
                    &format!("creating directory '{}'", relative.display()),
                    stats,
                )?;
            }
        }
        Ok(())
    }
}

/// Create `root/relative` one segment at a time, shallow to deep
///
/// Segments that already exist as directories are left alone. A segment
/// occupied by anything else fails with `TargetExists`.
pub(crate) fn ensure_dir<F: FileSystem>(
    fs_ops: &F,
    root: &Path,
    relative: &Path,
    stats: &mut CycleStats,
) -> Result<()> {
    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(metadata) if metadata.is_dir() => continue,
            Ok(_) => return Err(Error::TargetExists { path: current }),
            Err(_) => {}
        }
        fs_ops.create_dir(&current)?;
        info!("Created directory '{}'", current.display());
        stats.directories_created += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalFs;
    use tempfile::TempDir;

    #[test]
    fn test_mirror_creates_nested_and_empty_directories() {
        let temp_dir = TempDir::new().unwrap();
        let directories: DirectorySet = ["", "a", "a/b", "a/b/c", "empty"].into_iter().collect();
        let mut stats = CycleStats::new();

        DirectoryMirror::new(LocalFs::new())
            .mirror(temp_dir.path(), &directories, &mut stats)
            .unwrap();

        assert!(temp_dir.path().join("a/b/c").is_dir());
        assert!(temp_dir.path().join("empty").is_dir());
        assert_eq!(stats.directories_created, 4);
    }

    #[test]
    fn test_mirror_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let directories: DirectorySet = ["", "x/y"].into_iter().collect();
        let mirror = DirectoryMirror::new(LocalFs::new());

        let mut first = CycleStats::new();
        mirror.mirror(temp_dir.path(), &directories, &mut first).unwrap();
        let mut second = CycleStats::new();
        mirror.mirror(temp_dir.path(), &directories, &mut second).unwrap();

        assert_eq!(first.directories_created, 2);
        assert_eq!(second.directories_created, 0);
    }

    #[test]
    fn test_occupied_segment_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a"), b"file in the way").unwrap();
        let directories: DirectorySet = ["a", "a/b", "other"].into_iter().collect();
        let mut stats = CycleStats::new();

        DirectoryMirror::new(LocalFs::new())
            .mirror(temp_dir.path(), &directories, &mut stats)
            .unwrap();

        assert!(temp_dir.path().join("a").is_file());
        assert!(temp_dir.path().join("other").is_dir());
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.directories_created, 1);
    }
}
