//! Core traits for treesync operations
//!
//! Reads (scanning, hashing, existence checks) go straight to the filesystem.
//! Every mutation of the destination tree goes through [`FileSystem`], which keeps
//! the reconciliation logic testable with recording or failing implementations.

use crate::Result;
use std::path::Path;

/// Mutating filesystem operations used to converge the destination tree
///
/// Implementations report failures through [`crate::Error::from_io`] so callers
/// can tell per-item problems apart from storage exhaustion.
pub trait FileSystem {
    /// Create a single directory; the parent must already exist
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Rename or move a file; fails with `TargetExists` instead of overwriting
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Copy one file's bytes and modification time, returning the bytes written
    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64>;

    /// Delete one file
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Delete a directory and everything below it
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn create_dir(&self, path: &Path) -> Result<()> {
        (**self).create_dir(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        (**self).rename(from, to)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64> {
        (**self).copy_file(from, to)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        (**self).remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        (**self).remove_dir_all(path)
    }
}

