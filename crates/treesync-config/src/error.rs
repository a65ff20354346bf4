//! Errors raised while loading or validating treesync settings

use std::path::PathBuf;
use thiserror::Error;

/// Why the settings could not be loaded or turned into a run configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A settings file, or the working directory, could not be accessed
    #[error("Cannot access '{path}': {source}")]
    Io {
        /// Path that was being read or written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A file or `TREESYNC_*` variable did not fit the settings layout
    #[error("Malformed settings: {message}")]
    Format {
        /// Parser or serializer message
        message: String,
    },

    /// One of the tree roots was never given
    #[error("'{key}' is not set")]
    MissingRequired {
        /// Settings key, e.g. `sync.source`
        key: String,
    },

    /// A setting holds a value the synchronizer cannot run with
    #[error("Invalid '{key}': {message}")]
    InvalidValue {
        /// Settings key, e.g. `sync.interval`
        key: String,
        /// What is wrong with the value
        message: String,
    },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::format(error.to_string())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        Self::format(error.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a new format error
    pub fn format<S: Into<String>>(message: S) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a new missing root error
    pub fn missing_required<S: Into<String>>(key: S) -> Self {
        Self::MissingRequired { key: key.into() }
    }

    /// Create a new invalid value error
    pub fn invalid_value<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_setting() {
        let missing = ConfigError::missing_required("sync.destination");
        assert_eq!(missing.to_string(), "'sync.destination' is not set");

        let invalid = ConfigError::invalid_value("sync.interval", "must be positive");
        assert_eq!(invalid.to_string(), "Invalid 'sync.interval': must be positive");
    }

    #[test]
    fn test_yaml_errors_are_format_errors() {
        let yaml_error = serde_yaml::from_str::<u32>("not a number").unwrap_err();
        let err = ConfigError::from(yaml_error);
        assert!(matches!(err, ConfigError::Format { .. }));
    }
}
