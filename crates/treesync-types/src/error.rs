//! Error types and handling for treesync
//!
//! Every failure the synchronizer can hit maps onto one [`Error`] variant, and every
//! variant carries a severity. The severity decides what the caller does with it:
//!
//! - `Low` / `Medium`: a per-item problem, logged and skipped
//! - `High`: the current cycle is aborted, the scheduler retries on the next interval
//! - `Critical`: the process must stop

use std::io;
use std::path::{Path, PathBuf};

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - the item is skipped, nothing else is affected
    Low,
    /// Medium severity - the item is skipped and counted as an error
    Medium,
    /// High severity - the current cycle is aborted
    High,
    /// Critical severity - entire process should be terminated
    Critical,
}

/// Main error type for treesync operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// File not found, usually because it vanished between scan and action
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found
        path: PathBuf,
    },

    /// Permission denied
    #[error("Permission denied: {path}")]
    PermissionDenied {
        /// Path to the file with permission issues
        path: PathBuf,
    },

    /// The target of a rename or copy is already occupied
    #[error("Target already exists: {path}")]
    TargetExists {
        /// Occupied destination path
        path: PathBuf,
    },

    /// No space left on the device holding the destination tree
    #[error("No space left on device while writing {path}")]
    StorageFull {
        /// Path that was being written
        path: PathBuf,
    },

    /// Content hashing of a single file failed
    #[error("Failed to hash '{path}': {message}")]
    Hash {
        /// File that could not be hashed
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// A tree root could not be scanned
    #[error("Failed to scan '{root}': {message}")]
    Scan {
        /// Root of the tree being scanned
        root: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Synchronization error
    #[error("Synchronization error: {message}")]
    Sync {
        /// Error message describing the synchronization issue
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Storage exhaustion
    StorageFull,
    /// Hashing errors
    Hash,
    /// Scan errors
    Scan,
    /// Configuration errors
    Config,
    /// Synchronization errors
    Sync,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. }
            | Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::TargetExists { .. } => ErrorKind::Io,
            Self::StorageFull { .. } => ErrorKind::StorageFull,
            Self::Hash { .. } => ErrorKind::Hash,
            Self::Scan { .. } => ErrorKind::Scan,
            Self::Config { .. } => ErrorKind::Config,
            Self::Sync { .. } => ErrorKind::Sync,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::FileNotFound { .. } | Self::TargetExists { .. } => ErrorSeverity::Low,
            Self::Io { .. }
            | Self::PermissionDenied { .. }
            | Self::Hash { .. }
            | Self::Sync { .. }
            | Self::Other { .. } => ErrorSeverity::Medium,
            Self::Scan { .. } | Self::Config { .. } => ErrorSeverity::High,
            Self::StorageFull { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether the process has to stop because of this error
    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Whether this error only affects the item it was raised for
    pub fn is_per_item(&self) -> bool {
        self.severity() <= ErrorSeverity::Medium
    }

    /// Classify an I/O error raised while operating on `path`
    pub fn from_io(error: io::Error, path: &Path) -> Self {
        if is_storage_full(&error) {
            return Self::StorageFull {
                path: path.to_path_buf(),
            };
        }

        match error.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            io::ErrorKind::AlreadyExists => Self::TargetExists {
                path: path.to_path_buf(),
            },
            _ => Self::Io {
                message: format!("{}: {}", path.display(), error),
            },
        }
    }

    /// Create a new hashing error
    pub fn hash<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Hash {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new scan error
    pub fn scan<P: Into<PathBuf>, S: Into<String>>(root: P, message: S) -> Self {
        Self::Scan {
            root: root.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new sync error
    pub fn sync<S: Into<String>>(message: S) -> Self {
        Self::Sync {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Check whether an I/O error means the target device ran out of space
pub fn is_storage_full(error: &io::Error) -> bool {
    #[cfg(unix)]
    {
        error.raw_os_error() == Some(libc::ENOSPC)
    }
    #[cfg(windows)]
    {
        // ERROR_HANDLE_DISK_FULL, ERROR_DISK_FULL
        matches!(error.raw_os_error(), Some(39 | 112))
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = error;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    proptest! {
        #[test]
        fn test_error_severity_consistency(message in ".*") {
            let errors = vec![
                Error::Io { message: message.clone() },
                Error::Config { message: message.clone() },
                Error::Sync { message: message.clone() },
                Error::Other { message: message.clone() },
                Error::hash("a.txt", message.clone()),
                Error::scan("/root", message.clone()),
            ];

            for error in errors {
                let kind = error.kind();

                // Only storage exhaustion may stop the process
                prop_assert!(!error.is_fatal());

                match error {
                    Error::Io { .. } => prop_assert_eq!(kind, ErrorKind::Io),
                    Error::Config { .. } => prop_assert_eq!(kind, ErrorKind::Config),
                    Error::Sync { .. } => prop_assert_eq!(kind, ErrorKind::Sync),
                    Error::Other { .. } => prop_assert_eq!(kind, ErrorKind::Other),
                    Error::Hash { .. } => prop_assert_eq!(kind, ErrorKind::Hash),
                    Error::Scan { .. } => prop_assert_eq!(kind, ErrorKind::Scan),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[rstest]
    #[case(io::ErrorKind::NotFound, ErrorSeverity::Low)]
    #[case(io::ErrorKind::AlreadyExists, ErrorSeverity::Low)]
    #[case(io::ErrorKind::PermissionDenied, ErrorSeverity::Medium)]
    #[case(io::ErrorKind::InvalidData, ErrorSeverity::Medium)]
    fn test_io_classification(#[case] kind: io::ErrorKind, #[case] severity: ErrorSeverity) {
        let error = Error::from_io(io::Error::new(kind, "boom"), Path::new("dst/a.txt"));
        assert_eq!(error.severity(), severity);
        assert!(error.is_per_item());
        assert!(!error.is_fatal());
    }

    #[cfg(unix)]
    #[test]
    fn test_enospc_is_storage_full() {
        let raw = io::Error::from_raw_os_error(libc::ENOSPC);
        let error = Error::from_io(raw, Path::new("dst/big.iso"));

        assert_eq!(error.kind(), ErrorKind::StorageFull);
        assert!(error.is_fatal());
        assert!(error.to_string().contains("dst/big.iso"));
    }

    #[test]
    fn test_scan_error_aborts_cycle_only() {
        let error = Error::scan("/mnt/usb", "No such file or directory");

        assert_eq!(error.severity(), ErrorSeverity::High);
        assert!(!error.is_per_item());
        assert!(!error.is_fatal());
        assert!(error.to_string().contains("/mnt/usb"));
    }
}
