//! Logging setup: console output plus an optional rolling log file

use anyhow::{anyhow, Context, Result};
use replisync_config::{LogRotation, LoggingConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Level chosen by the global verbosity flags, if any
pub fn level_override(debug: bool, quiet: bool, verbose: bool) -> Option<&'static str> {
    if debug {
        Some("debug")
    } else if quiet {
        Some("error")
    } else if verbose {
        Some("info")
    } else {
        None
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped and must be held
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig, level: Option<&str>) -> Result<Option<WorkerGuard>> {
    let level = level.unwrap_or(&config.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{}'", level))?;

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let appender = file_appender(path, config)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = if config.json_format {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .boxed()
            } else {
                fmt::layer().with_writer(writer).with_ansi(false).boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))?;

    Ok(guard)
}

fn file_appender(path: &Path, config: &LoggingConfig) -> Result<RollingFileAppender> {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log file path '{}' has no file name", path.display()))?;

    std::fs::create_dir_all(directory)
        .with_context(|| format!("failed to create log directory '{}'", directory.display()))?;

    RollingFileAppender::builder()
        .rotation(rotation(config.rotation))
        .filename_prefix(file_name.to_string_lossy())
        .max_log_files(config.max_files)
        .build(directory)
        .with_context(|| format!("failed to open log file '{}'", path.display()))
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, false, false, Some("debug"))]
    #[case(false, true, false, Some("error"))]
    #[case(false, false, true, Some("info"))]
    #[case(true, true, true, Some("debug"))]
    #[case(false, false, false, None)]
    fn test_level_override(
        #[case] debug: bool,
        #[case] quiet: bool,
        #[case] verbose: bool,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(level_override(debug, quiet, verbose), expected);
    }

    #[test]
    fn test_file_appender_creates_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("logs/replisync.log");
        let config = LoggingConfig {
            rotation: LogRotation::Never,
            log_file: Some(path.clone()),
            ..LoggingConfig::default()
        };

        let _appender = file_appender(&path, &config).unwrap();
        assert!(temp_dir.path().join("logs").is_dir());
    }
}
