//! Core type system and error handling for treesync
//!
//! This crate provides the foundational types shared by every treesync crate:
//!
//! - **Error handling**: one error enum with kinds and severity levels, where
//!   `Critical` marks conditions that must stop the process (storage exhaustion)
//! - **Data model**: per-cycle file tables, directory sets and cycle statistics
//! - **Traits**: the [`FileSystem`] seam through which every destination mutation flows
//! - **Configuration**: validated value types such as [`BlockSize`] and [`TimeUnit`]
//!
//! # Features
//!
//! - `serde`: Enable serialization support for configuration and report types
//!
//! # Examples
//!
//! ```rust
//! use treesync_types::{ContentHash, FileEntry, FileTable};
//!
//! let mut table = FileTable::new();
//! table.push(FileEntry::new("docs", "a.txt", ContentHash::new("abc")));
//! table.push(FileEntry::new("", "b.txt", ContentHash::new("abc")));
//! assert_eq!(table.group(&ContentHash::new("abc")).len(), 2);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{BlockSize, Interval, SyncConfig, TimeUnit};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use traits::*;
pub use types::*;
