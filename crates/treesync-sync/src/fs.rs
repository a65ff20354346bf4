//! Local filesystem implementation of the mutation seam

use std::fs;
use std::path::Path;
use tracing::debug;
use treesync_types::{Error, FileSystem, Result};

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new local filesystem handle
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFs {
    fn create_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir(path).map_err(|e| Error::from_io(e, path))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        // fs::rename silently replaces an existing file on unix
        if fs::symlink_metadata(to).is_ok() {
            return Err(Error::TargetExists {
                path: to.to_path_buf(),
            });
        }
        fs::rename(from, to).map_err(|e| {
            if fs::symlink_metadata(from).is_err() {
                Error::from_io(e, from)
            } else {
                Error::from_io(e, to)
            }
        })
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64> {
        // fs::copy writes through a symlink at the target
        if fs::symlink_metadata(to).is_ok_and(|target| target.file_type().is_symlink()) {
            return Err(Error::TargetExists {
                path: to.to_path_buf(),
            });
        }
        let metadata = fs::metadata(from).map_err(|e| Error::from_io(e, from))?;
        let bytes = fs::copy(from, to).map_err(|e| Error::from_io(e, to))?;

        let modified = filetime::FileTime::from_last_modification_time(&metadata);
        if let Err(e) = filetime::set_file_mtime(to, modified) {
            debug!(
                "Failed to preserve modification time of '{}': {}",
                to.display(),
                e
            );
        }

        Ok(bytes)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| Error::from_io(e, path))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).map_err(|e| Error::from_io(e, path))
    }
}
