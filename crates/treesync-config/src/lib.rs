//! Configuration management for treesync
//!
//! This crate loads the synchronizer's settings from layered sources and turns
//! them into the immutable [`SyncConfig`] the engine runs with.
//!
//! # Features
//!
//! - **Multiple formats**: YAML, TOML and JSON configuration files
//! - **Environment overrides**: `TREESYNC_SYNC__INTERVAL=10` and friends
//! - **Defaults**: every setting except the two tree roots has a default
//! - **Validation**: bad intervals, block sizes, log levels and overlapping roots are rejected
//!
//! # Examples
//!
//! ```rust
//! use treesync_config::ConfigBuilder;
//!
//! let mut config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("treesync.yaml")
//!     .add_env_prefix("TREESYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! config.sync.source = Some("/data/photos".into());
//! config.sync.destination = Some("/mnt/backup/photos".into());
//! let sync_config = config.to_sync_config().expect("Invalid configuration");
//! println!("Every {}", sync_config.interval());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use treesync_types::{BlockSize, Interval, SyncConfig, TimeUnit};

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Log levels accepted in `logging.level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for treesync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Trees and schedule
    pub sync: SyncSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Trees and schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Source tree root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Destination tree root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    /// Interval between cycle starts, in `time_unit`
    pub interval: u64,
    /// Unit of `interval`
    pub time_unit: TimeUnit,
    /// Block size used when hashing files
    pub block_size: BlockSize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            interval: 5,
            time_unit: TimeUnit::Minutes,
            block_size: BlockSize::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Directory holding the daily log files
    pub log_dir: PathBuf,
    /// Also log to the console
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            console: true,
        }
    }
}

impl Config {
    /// Build the immutable run configuration, resolving relative paths
    /// against the working directory
    pub fn to_sync_config(&self) -> ConfigResult<SyncConfig> {
        let base = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        self.to_sync_config_in(&base)
    }

    /// Build the immutable run configuration, resolving relative paths against `base`
    pub fn to_sync_config_in(&self, base: &Path) -> ConfigResult<SyncConfig> {
        let source = self
            .sync
            .source
            .as_deref()
            .ok_or_else(|| ConfigError::missing_required("sync.source"))?;
        let destination = self
            .sync
            .destination
            .as_deref()
            .ok_or_else(|| ConfigError::missing_required("sync.destination"))?;
        let interval = Interval::new(self.sync.interval, self.sync.time_unit)
            .map_err(|message| ConfigError::invalid_value("sync.interval", message))?;

        SyncConfig::new(
            base.join(source),
            base.join(destination),
            base.join(&self.logging.log_dir),
            interval,
        )
        .map(|config| config.with_block_size(self.sync.block_size))
        .map_err(|e| ConfigError::invalid_value("sync", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(source: &str, destination: &str) -> Config {
        let mut config = Config::default();
        config.sync.source = Some(source.into());
        config.sync.destination = Some(destination.into());
        config
    }

    #[test]
    fn test_relative_paths_resolve_against_base() {
        let base = std::env::temp_dir();
        let sync_config = config("photos", "backup/photos")
            .to_sync_config_in(&base)
            .unwrap();

        assert_eq!(sync_config.source(), base.join("photos"));
        assert_eq!(sync_config.destination(), base.join("backup/photos"));
        assert_eq!(sync_config.log_dir(), base.join("logs"));
        assert_eq!(sync_config.interval().as_duration().as_secs(), 300);
    }

    #[test]
    fn test_missing_roots_are_reported() {
        let err = Config::default().to_sync_config().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key } if key == "sync.source"));

        let mut only_source = Config::default();
        only_source.sync.source = Some("a".into());
        let err = only_source.to_sync_config().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key } if key == "sync.destination"));
    }

    #[rstest]
    #[case("same", "same")]
    #[case("outer", "outer/inner")]
    #[case("outer/inner", "outer")]
    fn test_overlapping_roots_are_rejected(#[case] source: &str, #[case] destination: &str) {
        let err = config(source, destination)
            .to_sync_config_in(&std::env::temp_dir())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "sync"));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config = config("a", "b");
        config.sync.interval = 0;

        let err = config.to_sync_config_in(&std::env::temp_dir()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "sync.interval"));
    }
}
