//! Result type alias for treesync operations

use crate::Error;

/// Result type alias for treesync operations
pub type Result<T> = std::result::Result<T, Error>;
