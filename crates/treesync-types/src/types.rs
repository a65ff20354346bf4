//! Core data types for treesync
//!
//! This module provides the per-cycle data model: the file table built by a scan,
//! the directory set of a tree, and the statistics and report a cycle produces.

use chrono::{DateTime, Local};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Unique identifier for sync cycles
pub type CycleId = uuid::Uuid;

/// Hex-encoded digest of a file's bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already hex-encoded digest
    pub fn new<S: Into<String>>(hex: S) -> Self {
        Self(hex.into())
    }

    /// Hex representation of the digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reconciliation state of one entry within the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryState {
    /// No action has been decided for the entry yet
    #[default]
    Unresolved,
    /// The entry's action was decided and applied this cycle
    Resolved,
}

/// One file discovered during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Parent directory relative to the tree root, empty for the top level
    pub relative_root: PathBuf,
    /// File name
    pub file_name: OsString,
    /// Digest of the file's bytes
    pub content_hash: ContentHash,
    state: EntryState,
}

impl FileEntry {
    /// Create a new unresolved entry
    pub fn new<R, N>(relative_root: R, file_name: N, content_hash: ContentHash) -> Self
    where
        R: Into<PathBuf>,
        N: Into<OsString>,
    {
        Self {
            relative_root: relative_root.into(),
            file_name: file_name.into(),
            content_hash,
            state: EntryState::Unresolved,
        }
    }

    /// Path of the file relative to its tree root
    pub fn relative_path(&self) -> PathBuf {
        self.relative_root.join(&self.file_name)
    }

    /// Current reconciliation state
    pub fn state(&self) -> EntryState {
        self.state
    }

    /// Whether the entry was already handled this cycle
    pub fn is_resolved(&self) -> bool {
        self.state == EntryState::Resolved
    }
}

/// Ordered table of every file in one tree, grouped by content hash
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    entries: Vec<FileEntry>,
    groups: HashMap<ContentHash, Vec<usize>>,
    skipped: BTreeSet<PathBuf>,
}

impl FileTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its index
    pub fn push(&mut self, entry: FileEntry) -> usize {
        let index = self.entries.len();
        self.groups
            .entry(entry.content_hash.clone())
            .or_default()
            .push(index);
        self.entries.push(entry);
        index
    }

    /// Record a file that could not be hashed, or a directory that could not be read
    pub fn mark_skipped<P: Into<PathBuf>>(&mut self, relative_path: P) {
        self.skipped.insert(relative_path.into());
    }

    /// Whether `relative_path` is a skipped file or lies below a skipped directory
    pub fn is_skipped(&self, relative_path: &Path) -> bool {
        self.skipped
            .iter()
            .any(|skipped| relative_path.starts_with(skipped))
    }

    /// Files and directories that could not be read
    pub fn skipped(&self) -> impl Iterator<Item = &Path> {
        self.skipped.iter().map(PathBuf::as_path)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    /// All entries in scan order
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Indices of every entry sharing `hash`, in scan order
    pub fn group(&self, hash: &ContentHash) -> &[usize] {
        self.groups.get(hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mark the entry at `index` as handled for this cycle
    ///
    /// Resolution is one-way; resolving twice is a no-op.
    pub fn resolve(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.state = EntryState::Resolved;
        }
    }

    /// Indices of entries not yet handled, in scan order
    pub fn unresolved(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_resolved())
            .map(|(index, _)| index)
    }

    /// Set of (relative path, hash) pairs, used to compare two trees
    pub fn fingerprint(&self) -> BTreeSet<(PathBuf, ContentHash)> {
        self.entries
            .iter()
            .map(|entry| (entry.relative_path(), entry.content_hash.clone()))
            .collect()
    }
}

/// Every relative directory path of one tree, the root included as the empty path
///
/// Iteration order puts every directory before its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySet(BTreeSet<PathBuf>);

impl DirectorySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relative directory path
    pub fn insert<P: Into<PathBuf>>(&mut self, relative_path: P) -> bool {
        self.0.insert(relative_path.into())
    }

    /// Whether `relative_path` was seen
    pub fn contains(&self, relative_path: &Path) -> bool {
        self.0.contains(relative_path)
    }

    /// Number of directories, the root included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no directory was recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Directories in ancestor-first order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for DirectorySet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Whether `path` is the root of its tree
pub fn is_tree_root(relative_path: &Path) -> bool {
    relative_path.as_os_str() == OsStr::new("")
}

/// Statistics of one sync cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CycleStats {
    /// Files hashed in the source tree
    pub source_files: u64,
    /// Files hashed in the destination tree
    pub destination_files: u64,
    /// Destination directories created
    pub directories_created: u64,
    /// Obsolete destination directories removed
    pub directories_removed: u64,
    /// Destination files already in place
    pub files_passed: u64,
    /// Destination files renamed or moved
    pub files_renamed: u64,
    /// Files copied from the source
    pub files_copied: u64,
    /// Destination files deleted
    pub files_deleted: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Per-item errors that were logged and skipped
    pub errors: u64,
    /// Total duration of the cycle
    pub duration: Duration,
}

impl CycleStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating actions performed on the destination tree
    pub fn mutations(&self) -> u64 {
        self.directories_created
            + self.directories_removed
            + self.files_renamed
            + self.files_copied
            + self.files_deleted
    }
}

/// How a cycle brought the destination up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CycleOutcome {
    /// Both trees were hashed and reconciled
    Reconciled,
    /// The destination was empty and received a bulk copy of the source
    FullCopy,
}

/// Summary of one completed cycle
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CycleReport {
    /// Cycle identifier, also recorded on the cycle's log span
    pub cycle_id: CycleId,
    /// Local time the cycle started
    pub started_at: DateTime<Local>,
    /// Local time the cycle finished
    pub finished_at: DateTime<Local>,
    /// How the cycle converged
    pub outcome: CycleOutcome,
    /// Counters collected during the cycle
    pub stats: CycleStats,
}
