//! Tree scanning
//!
//! A scan walks one root and produces the flat [`FileTable`] and the
//! [`DirectorySet`] the rest of the cycle works from. Symbolic links are never
//! followed; they are reported as unmanaged entries. Problems below the root
//! are logged and skipped, and the unreadable paths are recorded so nothing
//! beneath them counts as missing. Only an unusable root fails the scan.

use crate::hasher::ContentHasher;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use treesync_types::{BlockSize, DirectorySet, Error, FileEntry, FileTable, Result};
use walkdir::WalkDir;

/// Result of hashing one tree
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Every regular file with its digest
    pub table: FileTable,
    /// Every directory, the root and empty leaves included
    pub directories: DirectorySet,
    /// Symbolic links and special files, relative to the root
    pub unmanaged: Vec<PathBuf>,
}

/// Structure of one tree without digests
#[derive(Debug, Clone, Default)]
pub struct TreeListing {
    /// Every directory, the root included
    pub directories: DirectorySet,
    /// Relative path of every regular file, in walk order
    pub files: Vec<PathBuf>,
}

impl TreeListing {
    /// Whether the tree holds nothing but its root
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.len() <= 1
    }
}

/// Walks a tree and builds its file table
#[derive(Debug, Clone, Default)]
pub struct TreeScanner {
    hasher: ContentHasher,
}

impl TreeScanner {
    /// Create a scanner hashing with the given block size
    pub fn new(block_size: BlockSize) -> Self {
        Self {
            hasher: ContentHasher::new(block_size),
        }
    }

    /// Hash every file under `root`
    ///
    /// Files that cannot be hashed are logged and recorded in the table's
    /// skipped set instead of failing the scan.
    pub fn scan(&self, root: &Path) -> Result<ScanResult> {
        let mut table = FileTable::new();
        let walked = walk(root, |path, relative| match self.hasher.hash_file(path) {
            Ok(hash) => {
                info!("Scanned '{}' {}", relative.display(), hash);
                let parent = relative.parent().unwrap_or_else(|| Path::new(""));
                if let Some(name) = relative.file_name() {
                    table.push(FileEntry::new(parent, name, hash));
                }
            }
            Err(e) => {
                warn!("Skipped unhashable file: {}", e);
                table.mark_skipped(relative);
            }
        })?;
        for relative in walked.unreadable {
            table.mark_skipped(relative);
        }

        debug!(
            "Scanned '{}': {} files, {} directories, {} skipped, {} unmanaged",
            root.display(),
            table.len(),
            walked.directories.len(),
            table.skipped().count(),
            walked.unmanaged.len()
        );

        Ok(ScanResult {
            table,
            directories: walked.directories,
            unmanaged: walked.unmanaged,
        })
    }

    /// List the structure of `root` without reading any file contents
    pub fn list(&self, root: &Path) -> Result<TreeListing> {
        let mut files = Vec::new();
        let walked = walk(root, |_, relative| files.push(relative.to_path_buf()))?;
        Ok(TreeListing {
            directories: walked.directories,
            files,
        })
    }
}

/// Everything a walk found besides regular files
#[derive(Debug, Default)]
struct Walked {
    directories: DirectorySet,
    unmanaged: Vec<PathBuf>,
    unreadable: Vec<PathBuf>,
}

/// Walk `root`, collecting directories and handing every regular file to `on_file`
/// as (absolute path, path relative to root)
fn walk<F>(root: &Path, mut on_file: F) -> Result<Walked>
where
    F: FnMut(&Path, &Path),
{
    let metadata = fs::metadata(root).map_err(|e| Error::scan(root, e.to_string()))?;
    if !metadata.is_dir() {
        return Err(Error::scan(root, "not a directory"));
    }
    fs::read_dir(root).map_err(|e| Error::scan(root, e.to_string()))?;

    let mut walked = Walked::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if e.depth() == 0 {
                    return Err(Error::scan(root, e.to_string()));
                }
                warn!("Skipped unreadable entry under '{}': {}", root.display(), e);
                if let Some(relative) = e.path().and_then(|path| path.strip_prefix(root).ok()) {
                    walked.unreadable.push(relative.to_path_buf());
                }
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let file_type = entry.file_type();

        if file_type.is_dir() {
            walked.directories.insert(relative);
        } else if file_type.is_file() {
            on_file(entry.path(), relative);
        } else {
            let kind = if file_type.is_symlink() {
                "symbolic link"
            } else {
                "special file"
            };
            warn!("Skipped {} '{}'", kind, entry.path().display());
            walked.unmanaged.push(relative.to_path_buf());
        }
    }

    Ok(walked)
}
