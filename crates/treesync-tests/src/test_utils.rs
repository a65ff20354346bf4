//! Shared fixtures for treesync integration tests and benchmarks

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use treesync_sync::{LocalFs, SyncEngine};
use treesync_types::{FileSystem, Interval, Result, SyncConfig, TimeUnit};
use walkdir::WalkDir;

/// Generate deterministic file content of `size` bytes
///
/// `seed` shifts the pattern so different seeds give different content.
pub fn generate_test_data(size: usize, seed: u8) -> Vec<u8> {
    (0..size)
        .map(|i| ((i * 7 + 13 + usize::from(seed)) % 256) as u8)
        .collect()
}

/// A scratch source tree and destination tree under one temporary directory
pub struct TestTrees {
    temp_dir: TempDir,
    /// Source tree root
    pub source: PathBuf,
    /// Destination tree root
    pub destination: PathBuf,
}

impl TestTrees {
    /// Create two empty trees
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = temp_dir.path().join("source");
        let destination = temp_dir.path().join("destination");
        fs::create_dir(&source).expect("Failed to create source");
        fs::create_dir(&destination).expect("Failed to create destination");
        Self {
            temp_dir,
            source,
            destination,
        }
    }

    /// Directory next to both trees, suitable for logs
    pub fn scratch(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Configuration syncing `source` into `destination`
    pub fn config(&self) -> SyncConfig {
        SyncConfig::new(
            self.source.clone(),
            self.destination.clone(),
            self.temp_dir.path().join("logs"),
            Interval::new(1, TimeUnit::Minutes).expect("valid interval"),
        )
        .expect("valid config")
    }

    /// Engine over the trees using the given filesystem
    pub fn engine<F: FileSystem>(&self, fs_ops: F) -> SyncEngine<F> {
        SyncEngine::new(self.config(), fs_ops)
    }

    /// Engine over the trees using the local filesystem
    pub fn local_engine(&self) -> SyncEngine<LocalFs> {
        self.engine(LocalFs::new())
    }

    /// Write a file below the source root
    pub fn write_source(&self, relative: &str, content: impl AsRef<[u8]>) {
        write_file(&self.source, relative, content);
    }

    /// Write a file below the destination root
    pub fn write_destination(&self, relative: &str, content: impl AsRef<[u8]>) {
        write_file(&self.destination, relative, content);
    }

    /// Snapshot of the source tree
    pub fn source_snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::capture(&self.source)
    }

    /// Snapshot of the destination tree
    pub fn destination_snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::capture(&self.destination)
    }

    /// Whether both trees hold the same directories and byte-identical files
    pub fn converged(&self) -> bool {
        self.source_snapshot() == self.destination_snapshot()
    }
}

impl Default for TestTrees {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `content` to `root/relative`, creating parents
pub fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(&path, content).expect("Failed to write test file");
}

/// Every directory and file of a tree, files with their bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSnapshot {
    /// Relative directory paths, the root excluded
    pub directories: Vec<PathBuf>,
    /// Relative file paths with their contents
    pub files: BTreeMap<PathBuf, Vec<u8>>,
}

impl TreeSnapshot {
    /// Read the whole tree below `root`
    pub fn capture(root: &Path) -> Self {
        let mut directories = Vec::new();
        let mut files = BTreeMap::new();

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.expect("Failed to walk tree");
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("entry below root")
                .to_path_buf();
            if entry.file_type().is_dir() {
                directories.push(relative);
            } else if entry.file_type().is_file() {
                let bytes = fs::read(entry.path()).expect("Failed to read file");
                files.insert(relative, bytes);
            }
        }

        Self { directories, files }
    }
}

/// One mutation issued through [`RecordingFs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    /// `create_dir(path)`
    CreateDir(PathBuf),
    /// `rename(from, to)`
    Rename(PathBuf, PathBuf),
    /// `copy_file(from, to)`
    Copy(PathBuf, PathBuf),
    /// `remove_file(path)`
    RemoveFile(PathBuf),
    /// `remove_dir_all(path)`
    RemoveDirAll(PathBuf),
}

/// Filesystem that performs every mutation on disk and records it
#[derive(Debug, Default)]
pub struct RecordingFs {
    inner: LocalFs,
    calls: Mutex<Vec<FsCall>>,
}

impl RecordingFs {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded so far
    pub fn calls(&self) -> Vec<FsCall> {
        self.calls.lock().expect("recorder lock poisoned").clone()
    }

    /// Forget recorded calls
    pub fn clear(&self) {
        self.calls.lock().expect("recorder lock poisoned").clear();
    }

    /// Number of recorded copies
    pub fn copies(&self) -> usize {
        self.count(|call| matches!(call, FsCall::Copy(..)))
    }

    /// Number of recorded renames
    pub fn renames(&self) -> usize {
        self.count(|call| matches!(call, FsCall::Rename(..)))
    }

    /// Number of recorded file deletions
    pub fn removals(&self) -> usize {
        self.count(|call| matches!(call, FsCall::RemoveFile(..)))
    }

    fn count(&self, predicate: impl Fn(&FsCall) -> bool) -> usize {
        self.calls
            .lock()
            .expect("recorder lock poisoned")
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    fn record(&self, call: FsCall) {
        self.calls.lock().expect("recorder lock poisoned").push(call);
    }
}

impl FileSystem for RecordingFs {
    fn create_dir(&self, path: &Path) -> Result<()> {
        self.record(FsCall::CreateDir(path.to_path_buf()));
        self.inner.create_dir(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.record(FsCall::Rename(from.to_path_buf(), to.to_path_buf()));
        self.inner.rename(from, to)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64> {
        self.record(FsCall::Copy(from.to_path_buf(), to.to_path_buf()));
        self.inner.copy_file(from, to)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.record(FsCall::RemoveFile(path.to_path_buf()));
        self.inner.remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.record(FsCall::RemoveDirAll(path.to_path_buf()));
        self.inner.remove_dir_all(path)
    }
}
