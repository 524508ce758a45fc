//! Polling driver: validates the roots, then runs a reconciliation pass,
//! sleeps for the interval, and repeats until shut down.

use anyhow::{Context, Result};
use replisync_sync::{Reconciler, SyncOptions, SyncReport};
use replisync_types::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Validated, canonical source and replica roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Source root
    pub source: PathBuf,
    /// Replica root
    pub replica: PathBuf,
}

impl SyncTarget {
    /// Check the roots before the first pass.
    ///
    /// A missing replica is created when `create_replica` is set and otherwise
    /// resolved through its nearest existing parent. Failures here are fatal.
    pub fn validate(
        source: &Path,
        replica: &Path,
        create_replica: bool,
    ) -> replisync_types::Result<Self> {
        if !source.exists() {
            return Err(Error::invalid_root(source, "source does not exist"));
        }
        if !source.is_dir() {
            return Err(Error::invalid_root(source, "source is not a directory"));
        }

        if !replica.exists() && create_replica {
            std::fs::create_dir_all(replica)
                .map_err(|e| Error::io("create replica directory", replica, e))?;
            info!("Directory created: {}", replica.display());
        }
        if replica.exists() && !replica.is_dir() {
            return Err(Error::invalid_root(replica, "replica is not a directory"));
        }

        let source = source
            .canonicalize()
            .map_err(|e| Error::io("resolve", source, e))?;
        let replica = canonicalize_lenient(replica)?;

        if source == replica {
            return Err(Error::invalid_root(
                &replica,
                "source and replica must be different directories",
            ));
        }
        if replica.starts_with(&source) {
            return Err(Error::invalid_root(&replica, "replica is inside the source tree"));
        }
        if source.starts_with(&replica) {
            return Err(Error::invalid_root(&source, "source is inside the replica tree"));
        }

        Ok(Self { source, replica })
    }
}

/// Canonical form of `path`, which may not exist yet
fn canonicalize_lenient(path: &Path) -> replisync_types::Result<PathBuf> {
    if path.exists() {
        return path.canonicalize().map_err(|e| Error::io("resolve", path, e));
    }

    let name = path
        .file_name()
        .ok_or_else(|| Error::invalid_root(path, "replica has no final path component"))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(canonicalize_lenient(parent)?.join(name))
}

/// Shared shutdown signal for the driver and in-flight passes
#[derive(Debug, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    notify: Notify,
}

impl Shutdown {
    /// Request shutdown; an in-flight pass stops at the next entry
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Whether shutdown was requested
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Flag handed to the reconciler
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Runs passes on a fixed interval
#[derive(Debug)]
pub struct Driver {
    target: SyncTarget,
    options: SyncOptions,
    interval: Duration,
    max_runs: Option<u64>,
    shutdown: Arc<Shutdown>,
}

impl Driver {
    /// Create a driver for validated roots
    pub fn new(target: SyncTarget, options: SyncOptions, interval: Duration) -> Self {
        Self {
            target,
            options,
            interval,
            max_runs: None,
            shutdown: Arc::new(Shutdown::default()),
        }
    }

    /// Stop after `max_runs` passes
    pub fn with_max_runs(mut self, max_runs: Option<u64>) -> Self {
        self.max_runs = max_runs;
        self
    }

    /// Handle used to stop the driver
    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        Arc::clone(&self.shutdown)
    }

    /// Trigger shutdown on Ctrl-C
    pub fn shutdown_on_ctrl_c(&self) {
        let shutdown = self.shutdown_handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested");
                shutdown.trigger();
            }
        });
    }

    /// Run passes until shut down or `max_runs` is reached; returns the pass count
    pub async fn run(&self) -> Result<u64> {
        let mut runs = 0;

        loop {
            info!("Starting synchronization");
            let report = self.run_pass().await?;
            runs += 1;

            if report.cancelled || self.shutdown.is_triggered() {
                warn!("Synchronization interrupted");
                break;
            }
            info!("Synchronization complete. Waiting for the next interval.");

            if self.max_runs.is_some_and(|max| runs >= max) {
                debug!("Reached {} runs, stopping", runs);
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = self.shutdown.notify.notified() => break,
            }
        }

        Ok(runs)
    }

    /// One blocking pass on the blocking thread pool
    pub async fn run_pass(&self) -> Result<SyncReport> {
        let mut reconciler =
            Reconciler::new(self.options.clone()).with_cancellation(self.shutdown.flag());
        let source = self.target.source.clone();
        let replica = self.target.replica.clone();

        tokio::task::spawn_blocking(move || reconciler.sync_once(&source, &replica))
            .await
            .context("reconciliation task failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn roots() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let replica = temp.path().join("replica");
        fs::create_dir(&source).unwrap();
        (temp, source, replica)
    }

    #[test]
    fn test_validate_creates_replica() {
        let (_temp, source, replica) = roots();

        let target = SyncTarget::validate(&source, &replica, true).unwrap();
        assert!(replica.is_dir());
        assert_eq!(target.replica, replica.canonicalize().unwrap());
    }

    #[test]
    fn test_validate_without_creating_replica() {
        let (_temp, source, replica) = roots();

        let target = SyncTarget::validate(&source, &replica.join("deeper"), false).unwrap();
        assert!(!replica.exists());
        assert_eq!(
            target.replica,
            source.parent().unwrap().canonicalize().unwrap().join("replica/deeper")
        );

        let inside = SyncTarget::validate(&source, &source.join("mirror"), false).unwrap_err();
        assert!(inside.to_string().contains("inside the source"));
        assert!(!source.join("mirror").exists());
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let (_temp, source, replica) = roots();

        let error = SyncTarget::validate(&source.join("missing"), &replica, true).unwrap_err();
        assert!(error.is_fatal());
        assert!(error.to_string().contains("source does not exist"));
    }

    #[test]
    fn test_validate_rejects_same_directory() {
        let (_temp, source, _replica) = roots();

        let error = SyncTarget::validate(&source, &source.join("."), true).unwrap_err();
        assert!(error.to_string().contains("different directories"));
    }

    #[test]
    fn test_validate_rejects_nesting() {
        let (_temp, source, replica) = roots();
        fs::create_dir(&replica).unwrap();

        let inside = SyncTarget::validate(&source, &source.join("mirror"), true).unwrap_err();
        assert!(inside.to_string().contains("inside the source"));

        fs::create_dir(replica.join("nested")).unwrap();
        let outside = SyncTarget::validate(&replica.join("nested"), &replica, true).unwrap_err();
        assert!(outside.to_string().contains("inside the replica"));
    }

    #[test]
    fn test_validate_rejects_file_replica() {
        let (_temp, source, replica) = roots();
        fs::write(&replica, "not a directory").unwrap();

        let error = SyncTarget::validate(&source, &replica, true).unwrap_err();
        assert!(error.to_string().contains("replica is not a directory"));
    }

    #[tokio::test]
    async fn test_driver_runs_until_max_runs() {
        let (_temp, source, replica) = roots();
        fs::write(source.join("a.txt"), "hello").unwrap();
        let target = SyncTarget::validate(&source, &replica, true).unwrap();

        let driver = Driver::new(target, SyncOptions::default(), Duration::from_millis(10))
            .with_max_runs(Some(2));
        let runs = driver.run().await.unwrap();

        assert_eq!(runs, 2);
        assert_eq!(fs::read_to_string(replica.join("a.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_driver_stops_on_shutdown() {
        let (_temp, source, replica) = roots();
        let target = SyncTarget::validate(&source, &replica, true).unwrap();

        let driver = Driver::new(target, SyncOptions::default(), Duration::from_secs(3600));
        driver.shutdown_handle().trigger();
        let runs = driver.run().await.unwrap();

        assert_eq!(runs, 1);
    }
}
