//! Configuration types for treesync
//!
//! This module provides validated configuration values and the immutable
//! [`SyncConfig`] every cycle reads from.

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Block size used when streaming a file through the content hasher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct BlockSize(usize);

impl BlockSize {
    /// Minimum block size (512B)
    pub const MIN: usize = 512;
    /// Maximum block size (16MB)
    pub const MAX: usize = 16 * 1024 * 1024;
    /// Default block size (8KB)
    pub const DEFAULT: usize = 8 * 1024;

    /// Create a new block size with validation
    pub fn new(size: usize) -> std::result::Result<Self, String> {
        if size < Self::MIN {
            Err(format!("Block size {} is below minimum {}", size, Self::MIN))
        } else if size > Self::MAX {
            Err(format!("Block size {} exceeds maximum {}", size, Self::MAX))
        } else if !size.is_power_of_two() {
            Err(format!("Block size {} must be a power of two", size))
        } else {
            Ok(Self(size))
        }
    }

    /// Get the block size value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for BlockSize {
    type Error = String;

    fn try_from(size: usize) -> std::result::Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<BlockSize> for usize {
    fn from(size: BlockSize) -> Self {
        size.0
    }
}

/// Unit of the synchronization interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum TimeUnit {
    /// Seconds
    #[default]
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
    /// Days
    Days,
}

impl TimeUnit {
    /// Number of seconds in one unit
    pub fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3600,
            Self::Days => 86_400,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(Self::Seconds),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(Self::Minutes),
            "h" | "hour" | "hours" => Ok(Self::Hours),
            "d" | "day" | "days" => Ok(Self::Days),
            other => Err(format!(
                "Unknown time unit '{}', expected one of S, M, H, D",
                other
            )),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        };
        f.write_str(name)
    }
}

impl TryFrom<String> for TimeUnit {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeUnit> for String {
    fn from(unit: TimeUnit) -> Self {
        unit.to_string()
    }
}

/// Time between the starts of two consecutive cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    value: u64,
    unit: TimeUnit,
}

impl Interval {
    /// Create a new interval; zero-length intervals are rejected
    pub fn new(value: u64, unit: TimeUnit) -> std::result::Result<Self, String> {
        if value == 0 {
            return Err("Interval must be greater than zero".to_string());
        }
        value
            .checked_mul(unit.seconds())
            .ok_or_else(|| format!("Interval of {} {} is too large", value, unit))?;
        Ok(Self { value, unit })
    }

    /// Interval value in its own unit
    pub fn value(self) -> u64 {
        self.value
    }

    /// Interval unit
    pub fn unit(self) -> TimeUnit {
        self.unit
    }

    /// Interval as a duration
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.value * self.unit.seconds())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Immutable per-run synchronization configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncConfig {
    source: PathBuf,
    destination: PathBuf,
    log_dir: PathBuf,
    interval: Interval,
    block_size: BlockSize,
}

impl SyncConfig {
    /// Create a configuration from absolute paths
    ///
    /// The source and destination must be absolute, distinct, and neither may
    /// contain the other. They are not required to exist yet: a missing source is
    /// reported as a scan error at cycle start so an unmounted drive can come back.
    pub fn new<P: Into<PathBuf>>(
        source: P,
        destination: P,
        log_dir: P,
        interval: Interval,
    ) -> Result<Self> {
        let source = source.into();
        let destination = destination.into();
        let log_dir = log_dir.into();

        for (name, path) in [("source", &source), ("destination", &destination)] {
            if !path.is_absolute() {
                return Err(Error::config(format!(
                    "{} path must be absolute: {}",
                    name,
                    path.display()
                )));
            }
        }

        if source == destination {
            return Err(Error::config(
                "Source and destination must be different directories",
            ));
        }
        if destination.starts_with(&source) || source.starts_with(&destination) {
            return Err(Error::config(format!(
                "Source '{}' and destination '{}' must not be nested",
                source.display(),
                destination.display()
            )));
        }

        Ok(Self {
            source,
            destination,
            log_dir,
            interval,
            block_size: BlockSize::default(),
        })
    }

    /// Set the hashing block size
    pub fn with_block_size(mut self, block_size: BlockSize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Source (authoritative) tree root
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination (mirrored) tree root
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Directory holding the daily log files
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Interval between cycle starts
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Hashing block size
    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }
}
