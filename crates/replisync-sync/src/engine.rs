//! One-way tree reconciliation
//!
//! A pass runs in two phases. The propagate phase walks the source tree
//! pre-order, creating missing replica directories and copying every file whose
//! fingerprint differs from (or is missing in) the replica. The prune phase
//! walks the replica tree post-order, deleting files absent from the source and
//! then directories left empty that have no source counterpart.
//!
//! Failures on a single entry are reported through the event sink and never
//! abort the pass.

use crate::fingerprint::{FingerprintAlgorithm, Fingerprinter, DEFAULT_CHUNK_SIZE};
use crate::paths::{PathPair, TreeRoots};
use crate::sink::{EventSink, TracingSink};
use filetime::FileTime;
use replisync_types::{Error, Result, SyncEvent, SyncEventKind, SyncReport};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// Reconciliation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Digest used to compare file contents
    pub algorithm: FingerprintAlgorithm,
    /// Read chunk size used while fingerprinting
    pub chunk_size: usize,
    /// Copy source modification/access times onto copied files
    pub preserve_timestamps: bool,
    /// Treat a size mismatch as a change without hashing either side
    pub size_precheck: bool,
    /// Report decisions without touching the replica
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            algorithm: FingerprintAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            preserve_timestamps: true,
            size_precheck: false,
            dry_run: false,
        }
    }
}

impl SyncOptions {
    /// Options for a dry run
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    /// Set the fingerprint algorithm
    pub fn with_algorithm(mut self, algorithm: FingerprintAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the fingerprint chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Enable or disable the size pre-check
    pub fn with_size_precheck(mut self, enabled: bool) -> Self {
        self.size_precheck = enabled;
        self
    }

    /// Enable or disable timestamp preservation
    pub fn with_preserve_timestamps(mut self, enabled: bool) -> Self {
        self.preserve_timestamps = enabled;
        self
    }
}

/// Reconciles a replica tree against a source tree
#[derive(Debug)]
pub struct Reconciler<S = TracingSink> {
    options: SyncOptions,
    fingerprinter: Fingerprinter,
    sink: S,
    cancel: Option<Arc<AtomicBool>>,
}

impl Reconciler<TracingSink> {
    /// Create a reconciler that logs events through `tracing`
    pub fn new(options: SyncOptions) -> Self {
        Self::with_sink(options, TracingSink)
    }
}

impl Default for Reconciler<TracingSink> {
    fn default() -> Self {
        Self::new(SyncOptions::default())
    }
}

impl<S: EventSink> Reconciler<S> {
    /// Create a reconciler delivering events to `sink`
    pub fn with_sink(options: SyncOptions, sink: S) -> Self {
        let fingerprinter = Fingerprinter::new(options.algorithm).with_chunk_size(options.chunk_size);
        Self {
            options,
            fingerprinter,
            sink,
            cancel: None,
        }
    }

    /// Stop passes early once `flag` is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Active options
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Borrow the event sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the event sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the reconciler and return its sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run one full reconciliation pass
    pub fn sync_once(&mut self, source_root: &Path, replica_root: &Path) -> SyncReport {
        let start_time = Instant::now();
        let mut report = SyncReport::new();
        let roots = TreeRoots::new(source_root, replica_root);

        debug!(
            run_id = %report.run_id,
            "Reconciling {} -> {}",
            source_root.display(),
            replica_root.display()
        );

        // An unreadable source must never be mistaken for an empty one.
        if !source_root.is_dir() {
            let error = Error::invalid_root(source_root, "source is not an accessible directory");
            self.fail(&mut report, source_root, &error);
            report.duration = start_time.elapsed();
            return report;
        }

        let outcome = self
            .propagate(&roots, &mut report)
            .and_then(|()| self.prune(&roots, &mut report));

        match outcome {
            Ok(()) => {}
            Err(Error::Cancelled) => {
                warn!(run_id = %report.run_id, "Reconciliation cancelled");
                report.cancelled = true;
            }
            Err(error) => self.fail(&mut report, source_root, &error),
        }

        report.duration = start_time.elapsed();
        info!(
            run_id = %report.run_id,
            created = report.directories_created,
            copied = report.files_copied,
            skipped = report.files_skipped,
            removed = report.files_removed,
            dirs_removed = report.directories_removed,
            errors = report.errors,
            "Reconciliation finished in {:?}",
            report.duration
        );
        report
    }

    /// Source -> replica, directories before their contents
    fn propagate(&mut self, roots: &TreeRoots, report: &mut SyncReport) -> Result<()> {
        let walker = WalkDir::new(roots.source())
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            self.check_cancelled()?;

            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    let path = error.path().unwrap_or(roots.source()).to_path_buf();
                    self.fail(report, &path, &Error::io("read directory", &path, error.into()));
                    continue;
                }
            };

            let pair = match roots.for_source(entry.path()) {
                Ok(pair) => pair,
                Err(error) => {
                    self.fail(report, entry.path(), &error);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                self.ensure_directory(roots, &pair, report);
            } else if file_type.is_file() {
                self.propagate_file(roots, &pair, report);
            } else {
                debug!("Skipping non-regular source entry: {}", pair.source.display());
            }
        }

        Ok(())
    }

    fn ensure_directory(&mut self, roots: &TreeRoots, pair: &PathPair, report: &mut SyncReport) {
        if let Some(link) = linked_ancestor(roots.replica(), &pair.replica) {
            // A dry run never replaced the link, so the directory is still to be created.
            if !self.options.dry_run {
                self.fail(report, &pair.replica, &crosses_link(&link));
                return;
            }
        } else if pair.relative.as_os_str().is_empty() {
            // The replica root may be a link to the real directory.
            if pair.replica.is_dir() {
                return;
            }
        } else {
            match symlink_metadata(&pair.replica) {
                Ok(Some(meta)) if meta.is_dir() => return,
                Ok(Some(meta)) if meta.file_type().is_symlink() && !self.options.dry_run => {
                    if let Err(e) = remove_link(&pair.replica) {
                        self.fail(report, &pair.replica, &Error::io("remove link", &pair.replica, e));
                        return;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    self.fail(report, &pair.replica, &error);
                    return;
                }
            }
        }

        if !self.options.dry_run {
            if let Err(e) = fs::create_dir_all(&pair.replica) {
                self.fail(report, &pair.replica, &Error::io("create directory", &pair.replica, e));
                return;
            }
        }

        self.emit(report, SyncEvent::new(SyncEventKind::DirCreated, &pair.replica));
    }

    fn propagate_file(&mut self, roots: &TreeRoots, pair: &PathPair, report: &mut SyncReport) {
        if let Some(link) = linked_ancestor(roots.replica(), &pair.replica) {
            if self.options.dry_run {
                self.emit(report, SyncEvent::copied(&pair.source, &pair.replica));
            } else {
                self.fail(report, &pair.replica, &crosses_link(&link));
            }
            return;
        }

        match self.needs_copy(pair) {
            Ok(true) => self.copy_file(pair, report),
            Ok(false) => {
                trace!("Unchanged: {}", pair.relative.display());
                report.files_skipped += 1;
            }
            Err(error) => self.fail(report, &pair.replica, &error),
        }
    }

    fn needs_copy(&self, pair: &PathPair) -> Result<bool> {
        let Some(replica_meta) = symlink_metadata(&pair.replica)? else {
            return Ok(true);
        };
        if !replica_meta.is_file() {
            return Ok(true);
        }

        if self.options.size_precheck {
            let source_meta =
                fs::metadata(&pair.source).map_err(|e| Error::io("inspect", &pair.source, e))?;
            if source_meta.len() != replica_meta.len() {
                return Ok(true);
            }
        }

        let source_digest = self.fingerprinter.fingerprint(&pair.source)?;
        let replica_digest = self.fingerprinter.fingerprint(&pair.replica)?;
        Ok(source_digest != replica_digest)
    }

    fn copy_file(&mut self, pair: &PathPair, report: &mut SyncReport) {
        if self.options.dry_run {
            self.emit(report, SyncEvent::copied(&pair.source, &pair.replica));
            return;
        }

        let bytes = match copy_contents(pair) {
            Ok(bytes) => bytes,
            Err(error) => {
                self.fail(report, &pair.replica, &error);
                return;
            }
        };
        report.bytes_copied += bytes;
        self.emit(report, SyncEvent::copied(&pair.source, &pair.replica));

        if self.options.preserve_timestamps {
            if let Err(error) = copy_timestamps(pair) {
                self.fail(report, &pair.replica, &error);
            }
        }
    }

    /// Replica vs. source, contents before their directory
    fn prune(&mut self, roots: &TreeRoots, report: &mut SyncReport) -> Result<()> {
        if self.options.dry_run && !roots.replica().exists() {
            debug!("Replica root not created yet, nothing to prune");
            return Ok(());
        }

        let walker = WalkDir::new(roots.replica())
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name();

        for entry in walker {
            self.check_cancelled()?;

            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    let path = error.path().unwrap_or(roots.replica()).to_path_buf();
                    self.fail(report, &path, &Error::io("read directory", &path, error.into()));
                    continue;
                }
            };

            // The replica root itself is never removed.
            if entry.depth() == 0 {
                continue;
            }

            let pair = match roots.for_replica(entry.path()) {
                Ok(pair) => pair,
                Err(error) => {
                    self.fail(report, entry.path(), &error);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                self.prune_directory(&pair, report);
            } else if file_type.is_file() {
                self.prune_file(&pair, report);
            } else if file_type.is_symlink() {
                self.prune_link(&pair, report);
            } else {
                debug!("Leaving non-regular replica entry: {}", pair.replica.display());
            }
        }

        Ok(())
    }

    fn prune_file(&mut self, pair: &PathPair, report: &mut SyncReport) {
        match symlink_metadata(&pair.source) {
            Ok(Some(meta)) if meta.is_file() => return,
            Ok(_) => {}
            // Unknown source state: keep the replica file.
            Err(error) => {
                self.fail(report, &pair.replica, &error);
                return;
            }
        }

        if !self.options.dry_run {
            if let Err(e) = fs::remove_file(&pair.replica) {
                self.fail(report, &pair.replica, &Error::io("remove file", &pair.replica, e));
                return;
            }
        }

        self.emit(report, SyncEvent::new(SyncEventKind::FileRemoved, &pair.replica));
    }

    /// Links are never mirrored, so every replica link is an orphan
    fn prune_link(&mut self, pair: &PathPair, report: &mut SyncReport) {
        if !self.options.dry_run {
            if let Err(e) = remove_link(&pair.replica) {
                self.fail(report, &pair.replica, &Error::io("remove link", &pair.replica, e));
                return;
            }
        }

        self.emit(report, SyncEvent::new(SyncEventKind::FileRemoved, &pair.replica));
    }

    fn prune_directory(&mut self, pair: &PathPair, report: &mut SyncReport) {
        match symlink_metadata(&pair.source) {
            Ok(Some(meta)) if meta.is_dir() => return,
            Ok(_) => {}
            Err(error) => {
                self.fail(report, &pair.replica, &error);
                return;
            }
        }

        match is_empty_dir(&pair.replica) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Keeping non-empty directory: {}", pair.replica.display());
                return;
            }
            Err(error) => {
                self.fail(report, &pair.replica, &error);
                return;
            }
        }

        if !self.options.dry_run {
            if let Err(e) = fs::remove_dir(&pair.replica) {
                self.fail(report, &pair.replica, &Error::io("remove directory", &pair.replica, e));
                return;
            }
        }

        self.emit(report, SyncEvent::new(SyncEventKind::DirRemoved, &pair.replica));
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    fn emit(&mut self, report: &mut SyncReport, event: SyncEvent) {
        report.record(event.kind);
        self.sink.record(event);
    }

    fn fail(&mut self, report: &mut SyncReport, path: &Path, error: &Error) {
        report.record(SyncEventKind::Error);
        self.sink.record(SyncEvent::error(path, error));
    }
}

/// Run one pass with default options, logging events through `tracing`
pub fn sync_once(source_root: impl AsRef<Path>, replica_root: impl AsRef<Path>) -> SyncReport {
    Reconciler::new(SyncOptions::default()).sync_once(source_root.as_ref(), replica_root.as_ref())
}

/// `None` when nothing exists at `path`; symlinks are not followed
fn symlink_metadata(path: &Path) -> Result<Option<fs::Metadata>> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        // Nothing can exist below a regular file (ENOTDIR)
        Err(_) if path.ancestors().skip(1).any(Path::is_file) => Ok(None),
        Err(e) => Err(Error::io("inspect", path, e)),
    }
}

/// First symlink strictly between `root` and `path`
fn linked_ancestor(root: &Path, path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .take_while(|ancestor| ancestor.starts_with(root) && *ancestor != root)
        .find(|ancestor| {
            fs::symlink_metadata(ancestor).is_ok_and(|meta| meta.file_type().is_symlink())
        })
        .map(Path::to_path_buf)
}

fn crosses_link(link: &Path) -> Error {
    Error::io(
        "write below",
        link,
        io::Error::other("replica path crosses a symbolic link"),
    )
}

// Directory links on Windows can only be removed with `remove_dir`.
fn remove_link(path: &Path) -> io::Result<()> {
    fs::remove_file(path).or_else(|e| if cfg!(windows) { fs::remove_dir(path) } else { Err(e) })
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| Error::io("read directory", path, e))?;
    Ok(entries.next().is_none())
}

fn copy_contents(pair: &PathPair) -> Result<u64> {
    // Never write through a link planted in the replica.
    if let Some(meta) = symlink_metadata(&pair.replica)? {
        if meta.file_type().is_symlink() {
            remove_link(&pair.replica).map_err(|e| Error::io("remove link", &pair.replica, e))?;
        }
    }

    fs::copy(&pair.source, &pair.replica).map_err(|e| Error::io("copy", &pair.source, e))
}

fn copy_timestamps(pair: &PathPair) -> Result<()> {
    let meta = fs::metadata(&pair.source).map_err(|e| Error::io("inspect", &pair.source, e))?;
    filetime::set_file_times(
        &pair.replica,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )
    .map_err(|e| Error::io("set timestamps", &pair.replica, e))
}
