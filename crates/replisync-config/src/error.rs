//! Failures of the settings layer

use replisync_types::Error as ReplisyncError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading, validating or saving replisync settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file that could not be read or written
    #[error("cannot access settings file '{}': {source}", path.display())]
    Io {
        /// Settings file involved
        path: PathBuf,
        /// Cause reported by the filesystem
        source: std::io::Error,
    },

    /// A setting is outside its allowed range
    #[error("invalid setting: {message}")]
    Validation {
        /// Which setting failed and why
        message: String,
    },

    /// Settings could not be rendered as YAML, TOML or JSON
    #[error("cannot render settings: {message}")]
    Serialization {
        /// Description from the underlying library
        message: String,
    },

    /// Layering or deserializing the settings sources failed
    #[error("cannot load settings: {message}")]
    Other {
        /// Description from the underlying library
        message: String,
    },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        Self::Other {
            message: error.to_string(),
        }
    }
}

impl From<ConfigError> for ReplisyncError {
    fn from(error: ConfigError) -> Self {
        ReplisyncError::config(error.to_string())
    }
}

/// Outcome of a settings operation
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Build a validation failure
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a failure from the settings layer
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_settings_layer() {
        let io = ConfigError::Io {
            path: PathBuf::from("replisync.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(
            io.to_string(),
            "cannot access settings file 'replisync.yaml': missing"
        );

        let invalid: ReplisyncError = ConfigError::validation("interval must be positive").into();
        assert!(invalid
            .to_string()
            .contains("invalid setting: interval must be positive"));
    }
}
