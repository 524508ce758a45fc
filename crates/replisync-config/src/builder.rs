//! Configuration builder for layered configuration loading

use crate::{Config, ConfigError, ConfigResult};
use config::{ConfigBuilder as ConfigBuilderInner, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration builder for loading configuration from multiple sources
#[derive(Debug)]
pub struct ConfigBuilder {
    inner: ConfigBuilderInner<config::builder::DefaultState>,
    sources: Vec<ConfigSource>,
    env_separator: String,
}

#[derive(Debug, Clone)]
enum ConfigSource {
    File { path: PathBuf, format: FileFormat },
    Defaults,
    Environment { prefix: String },
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            inner: config::Config::builder(),
            sources: Vec::new(),
            env_separator: "__".to_string(),
        }
    }

    /// Add default configuration values
    pub fn add_defaults(mut self) -> Self {
        self.sources.push(ConfigSource::Defaults);
        self
    }

    /// Add a configuration file source; missing files are ignored
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = Self::detect_format(&path);
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.sources.push(ConfigSource::Environment {
            prefix: prefix.into(),
        });
        self
    }

    /// Set environment variable separator (default: "__")
    pub fn env_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.env_separator = separator.into();
        self
    }

    /// Build and validate the configuration
    pub fn build(mut self) -> ConfigResult<Config> {
        // Defaults are always the base layer
        let defaults_value = serde_yaml::to_value(Config::default())
            .map_err(|e| ConfigError::other(format!("Failed to serialize defaults: {}", e)))?;
        self.inner = self
            .inner
            .add_source(config::Config::try_from(&defaults_value)?);

        for source in &self.sources {
            match source {
                ConfigSource::File { path, format } => {
                    if path.exists() {
                        self.inner = self
                            .inner
                            .add_source(File::from(path.clone()).format(*format));
                    }
                }
                ConfigSource::Environment { prefix } => {
                    self.inner = self.inner.add_source(
                        Environment::with_prefix(prefix)
                            .separator(&self.env_separator)
                            .try_parsing(true),
                    );
                }
                ConfigSource::Defaults => {
                    // Already applied above
                }
            }
        }

        let config: Config = self.inner.build()?.try_deserialize()?;
        Self::validate(&config)?;

        Ok(config)
    }

    /// Detect file format from extension
    fn detect_format(path: &Path) -> FileFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }

    /// Validate the configuration
    pub fn validate(config: &Config) -> ConfigResult<()> {
        if config.sync.interval_secs == 0 {
            return Err(ConfigError::validation(
                "Sync interval must be greater than 0 seconds",
            ));
        }

        if config.sync.chunk_size == 0 {
            return Err(ConfigError::validation(
                "Fingerprint chunk size must be greater than 0",
            ));
        }

        if config.logging.max_files == 0 {
            return Err(ConfigError::validation(
                "Number of retained log files must be greater than 0",
            ));
        }

        if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::validation(
                "Log level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogRotation;
    use replisync_sync::FingerprintAlgorithm;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::Builder;

    fn config_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().add_defaults().build().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_builder_yaml_file() {
        let file = config_file(
            ".yaml",
            r#"
sync:
  interval_secs: 5
  algorithm: md5
logging:
  rotation: hourly
  log_file: /var/log/replisync.log
"#,
        );

        let config = ConfigBuilder::new()
            .add_defaults()
            .add_source_file(file.path())
            .build()
            .unwrap();

        assert_eq!(config.sync.interval_secs, 5);
        assert_eq!(config.sync.algorithm, FingerprintAlgorithm::Md5);
        assert_eq!(config.sync.chunk_size, 4096);
        assert_eq!(config.logging.rotation, LogRotation::Hourly);
        assert_eq!(
            config.logging.log_file.as_deref(),
            Some(Path::new("/var/log/replisync.log"))
        );
    }

    #[test]
    fn test_builder_toml_file() {
        let file = config_file(
            ".toml",
            r#"
[sync]
size_precheck = true
algorithm = "sha256"
"#,
        );

        let config = ConfigBuilder::new()
            .add_source_file(file.path())
            .build()
            .unwrap();

        assert!(config.sync.size_precheck);
        assert_eq!(config.sync.algorithm, FingerprintAlgorithm::Sha256);
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let config = ConfigBuilder::new()
            .add_source_file("/definitely/not/here.yaml")
            .build()
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("REPLISYNC_BUILDER_TEST__SYNC__INTERVAL_SECS", "17");
        let config = ConfigBuilder::new()
            .add_defaults()
            .add_env_prefix("REPLISYNC_BUILDER_TEST")
            .build()
            .unwrap();
        std::env::remove_var("REPLISYNC_BUILDER_TEST__SYNC__INTERVAL_SECS");

        assert_eq!(config.sync.interval_secs, 17);
    }

    #[rstest]
    #[case("sync:\n  interval_secs: 0\n", "Sync interval must be greater than 0")]
    #[case("sync:\n  chunk_size: 0\n", "chunk size must be greater than 0")]
    #[case("logging:\n  max_files: 0\n", "retained log files")]
    #[case("logging:\n  level: loud\n", "Log level must be one of")]
    fn test_builder_validation(#[case] content: &str, #[case] expected: &str) {
        let file = config_file(".yaml", content);

        let result = ConfigBuilder::new()
            .add_defaults()
            .add_source_file(file.path())
            .build();

        let message = result.unwrap_err().to_string();
        assert!(message.contains(expected), "unexpected error: {}", message);
    }
}
