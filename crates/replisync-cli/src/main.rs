//! Replisync - periodic one-way directory synchronization
//!
//! Keeps a replica directory identical to a source directory: new and changed
//! files are copied, and anything the source no longer has is removed from the
//! replica. Runs once, or forever on a fixed interval.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use replisync_config::{Config, ConfigBuilder, ConfigLoader};
use replisync_sync::SyncReport;
use std::path::{Path, PathBuf};
use tracing::info;

mod display;
mod driver;
mod json_output;
mod logging;

use driver::{Driver, SyncTarget};

/// Replisync - periodic one-way directory synchronization
#[derive(Debug, Parser)]
#[command(
    name = "replisync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Keep a replica directory identical to a source directory",
    long_about = "Replisync mirrors a source directory into a replica directory.\n\
                  Files are compared by content fingerprint, changed files are copied,\n\
                  and entries missing from the source are removed from the replica."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode - log every change
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synchronize on a fixed interval until interrupted
    Run {
        /// Source directory
        source: PathBuf,
        /// Replica directory
        replica: PathBuf,
        /// Seconds between passes
        interval: Option<u64>,
        /// Log file path
        log_file: Option<PathBuf>,
        /// Stop after this many passes
        #[arg(long)]
        max_runs: Option<u64>,
    },
    /// Run a single synchronization pass
    Once {
        /// Source directory
        source: PathBuf,
        /// Replica directory
        replica: PathBuf,
        /// Dry run - report what would change without touching the replica
        #[arg(long)]
        dry_run: bool,
        /// Print the pass summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { default } = cli.command {
        return config_command(cli.config.as_deref(), default);
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Commands::Run {
        interval, log_file, ..
    } = &cli.command
    {
        if let Some(interval) = interval {
            config.sync.interval_secs = *interval;
        }
        if log_file.is_some() {
            config.logging.log_file.clone_from(log_file);
        }
        ConfigBuilder::validate(&config)?;
    }

    let _guard = logging::init_logging(
        &config.logging,
        logging::level_override(cli.debug, cli.quiet, cli.verbose),
    )?;

    info!("Replisync v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run {
            source,
            replica,
            max_runs,
            ..
        } => run_command(&config, &source, &replica, max_runs).await,
        Commands::Once {
            source,
            replica,
            dry_run,
            json,
        } => once_command(&config, &source, &replica, dry_run, json, cli.quiet).await,
        Commands::Config { .. } => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("failed to load configuration from '{}'", path.display()))?,
        None => ConfigLoader::load_default().context("failed to load configuration")?,
    };
    Ok(config)
}

async fn run_command(
    config: &Config,
    source: &Path,
    replica: &Path,
    max_runs: Option<u64>,
) -> Result<()> {
    let target = validate(source, replica, true)?;
    info!(
        "Synchronizing {} into {} every {}s",
        target.source.display(),
        target.replica.display(),
        config.sync.interval_secs
    );

    let driver = Driver::new(target, config.sync.to_options(), config.sync.interval())
        .with_max_runs(max_runs);
    driver.shutdown_on_ctrl_c();

    let runs = driver.run().await?;
    info!("Stopped after {} pass(es)", runs);
    Ok(())
}

async fn once_command(
    config: &Config,
    source: &Path,
    replica: &Path,
    dry_run: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    // A dry run must not create the replica root either.
    let target = validate(source, replica, !dry_run)?;
    let show = !json && !quiet;

    if show {
        display::display_start(&target.source, &target.replica, dry_run);
    }

    let mut options = config.sync.to_options();
    options.dry_run = dry_run;

    let driver = Driver::new(target.clone(), options, config.sync.interval());
    driver.shutdown_on_ctrl_c();
    let report = driver.run_pass().await?;

    if json {
        let output =
            json_output::create_sync_result_json(&target.source, &target.replica, dry_run, &report);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if show {
        display::display_report(&report);
    }

    pass_outcome(&report)
}

/// Exit status of a single pass: interrupted or failed passes are errors
fn pass_outcome(report: &SyncReport) -> Result<()> {
    if report.cancelled {
        anyhow::bail!("synchronization was interrupted");
    }
    if report.errors > 0 {
        anyhow::bail!("synchronization finished with {} error(s)", report.errors);
    }
    Ok(())
}

fn validate(source: &Path, replica: &Path, create_replica: bool) -> Result<SyncTarget> {
    SyncTarget::validate(source, replica, create_replica).map_err(|e| {
        display::display_error(&e.to_string());
        anyhow::Error::new(e)
    })
}

fn config_command(path: Option<&Path>, default: bool) -> Result<()> {
    let config = if default {
        println!("{} Default configuration:", style("⚙").blue().bold());
        Config::default()
    } else {
        match path.map(Path::to_path_buf).or_else(ConfigLoader::config_exists) {
            Some(path) => println!(
                "{} Current configuration ({}):",
                style("⚙").blue().bold(),
                style(path.display()).cyan()
            ),
            None => println!(
                "{} Current configuration (defaults and environment):",
                style("⚙").blue().bold()
            ),
        }
        load_config(path)?
    };

    print!("{}", ConfigLoader::to_yaml(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_positionals() {
        let cli = Cli::parse_from(["replisync", "run", "src", "dst", "30", "sync.log"]);
        match cli.command {
            Commands::Run {
                source,
                replica,
                interval,
                log_file,
                max_runs,
            } => {
                assert_eq!(source, PathBuf::from("src"));
                assert_eq!(replica, PathBuf::from("dst"));
                assert_eq!(interval, Some(30));
                assert_eq!(log_file, Some(PathBuf::from("sync.log")));
                assert_eq!(max_runs, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::parse_from(["replisync", "run", "src", "dst", "--max-runs", "3"]);
        match cli.command {
            Commands::Run {
                interval, max_runs, ..
            } => {
                assert_eq!(interval, None);
                assert_eq!(max_runs, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_once_with_global_flags() {
        let cli = Cli::parse_from(["replisync", "once", "src", "dst", "--dry-run", "--json", "-q"]);
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::Once {
                dry_run: true,
                json: true,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_non_numeric_interval() {
        let result = Cli::try_parse_from(["replisync", "run", "src", "dst", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_pass_outcome() {
        let mut report = SyncReport::new();
        assert!(pass_outcome(&report).is_ok());

        report.errors = 2;
        let failed = pass_outcome(&report).unwrap_err();
        assert!(failed.to_string().contains("2 error(s)"));

        report.errors = 0;
        report.cancelled = true;
        let interrupted = pass_outcome(&report).unwrap_err();
        assert!(interrupted.to_string().contains("interrupted"));
    }

    #[test]
    fn test_load_config_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("replisync.yaml");
        std::fs::write(&path, "sync:\n  interval_secs: 7\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.sync.interval_secs, 7);
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(load_config(Some(&temp_dir.path().join("missing.yaml"))).is_err());
    }
}
