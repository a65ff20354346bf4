//! treesync integration test suite
//!
//! This crate holds the cross-crate integration tests and the scanning
//! benchmark, together with the fixtures they share.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Shared fixtures: scratch trees, tree snapshots and a recording filesystem
pub mod test_utils;
