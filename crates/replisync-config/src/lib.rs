//! Configuration management for Replisync
//!
//! Configuration is layered: built-in defaults, then an optional YAML, TOML or
//! JSON file, then environment variables prefixed with `REPLISYNC` (nested
//! keys separated by `__`, e.g. `REPLISYNC__SYNC__INTERVAL_SECS=30`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use replisync_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("replisync.yaml")
//!     .add_env_prefix("REPLISYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Interval: {:?}", config.sync.interval());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use replisync_sync::{FingerprintAlgorithm, SyncOptions, DEFAULT_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "REPLISYNC";

/// Main configuration structure for Replisync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Reconciliation settings
    pub sync: SyncSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Seconds to wait between passes
    pub interval_secs: u64,
    /// Content fingerprint algorithm
    pub algorithm: FingerprintAlgorithm,
    /// Read chunk size for fingerprinting
    pub chunk_size: usize,
    /// Copy source timestamps onto copied files
    pub preserve_timestamps: bool,
    /// Skip hashing when sizes already differ
    pub size_precheck: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            algorithm: FingerprintAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            preserve_timestamps: true,
            size_precheck: false,
        }
    }
}

impl SyncSettings {
    /// Interval between passes
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Reconciler options derived from these settings
    pub fn to_options(&self) -> SyncOptions {
        SyncOptions::default()
            .with_algorithm(self.algorithm)
            .with_chunk_size(self.chunk_size)
            .with_preserve_timestamps(self.preserve_timestamps)
            .with_size_precheck(self.size_precheck)
    }
}

/// Log file rotation period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Roll every minute
    Minutely,
    /// Roll every hour
    Hourly,
    /// Roll every day
    #[default]
    Daily,
    /// Never roll
    Never,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log file path (console only when unset)
    pub log_file: Option<PathBuf>,
    /// Rotation period for the log file
    pub rotation: LogRotation,
    /// Number of log files to keep, current one included
    pub max_files: usize,
    /// Enable JSON formatting in the log file
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
            rotation: LogRotation::Daily,
            max_files: 3,
            json_format: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sync.interval(), Duration::from_secs(60));
        assert_eq!(config.sync.algorithm, FingerprintAlgorithm::Blake3);
        assert_eq!(config.logging.max_files, 3);
        assert!(config.logging.log_file.is_none());
    }

    #[test]
    fn test_settings_to_options() {
        let settings = SyncSettings {
            algorithm: FingerprintAlgorithm::Md5,
            chunk_size: 8192,
            size_precheck: true,
            ..SyncSettings::default()
        };

        let options = settings.to_options();
        assert_eq!(options.algorithm, FingerprintAlgorithm::Md5);
        assert_eq!(options.chunk_size, 8192);
        assert!(options.size_precheck);
        assert!(options.preserve_timestamps);
        assert!(!options.dry_run);
    }
}
