//! Test fixtures for reconciliation scenarios
//!
//! [`TestTree`] owns a temporary directory holding a `source` and a `replica`
//! tree, offers builder-style helpers to populate either side, and runs passes
//! with an in-memory event sink so tests can assert on the exact events.

use replisync_sync::{Reconciler, SyncEvent, SyncEventKind, SyncOptions, SyncReport};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

/// One entry of a tree snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Directory
    Dir,
    /// Regular file and its contents
    File(Vec<u8>),
}

/// Result of one pass: the report plus every event in order
#[derive(Debug)]
pub struct PassOutcome {
    /// Counters for the pass
    pub report: SyncReport,
    /// Events delivered to the sink
    pub events: Vec<SyncEvent>,
}

impl PassOutcome {
    /// Event kinds in delivery order
    pub fn kinds(&self) -> Vec<SyncEventKind> {
        self.events.iter().map(|event| event.kind).collect()
    }

    /// Paths of events of `kind`, in delivery order
    pub fn paths(&self, kind: SyncEventKind) -> Vec<PathBuf> {
        self.events
            .iter()
            .filter(|event| event.kind == kind)
            .map(|event| event.path.clone())
            .collect()
    }

    /// Whether the pass reported nothing at all
    pub fn is_quiet(&self) -> bool {
        self.events.is_empty()
    }
}

/// Temporary source and replica trees
pub struct TestTree {
    temp_dir: TempDir,
    source: PathBuf,
    replica: PathBuf,
}

impl TestTree {
    /// Create empty `source` and `replica` directories
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = temp_dir.path().join("source");
        let replica = temp_dir.path().join("replica");
        fs::create_dir(&source).expect("Failed to create source dir");
        fs::create_dir(&replica).expect("Failed to create replica dir");
        Self {
            temp_dir,
            source,
            replica,
        }
    }

    /// Source root
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Replica root
    pub fn replica(&self) -> &Path {
        &self.replica
    }

    /// Scratch directory next to both trees
    pub fn scratch(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file under the source tree, creating parents
    pub fn source_file(self, relative: &str, contents: impl AsRef<[u8]>) -> Self {
        write_file(&self.source.join(relative), contents.as_ref());
        self
    }

    /// Create a directory under the source tree
    pub fn source_dir(self, relative: &str) -> Self {
        fs::create_dir_all(self.source.join(relative)).expect("Failed to create source dir");
        self
    }

    /// Write a file under the replica tree, creating parents
    pub fn replica_file(self, relative: &str, contents: impl AsRef<[u8]>) -> Self {
        write_file(&self.replica.join(relative), contents.as_ref());
        self
    }

    /// Create a directory under the replica tree
    pub fn replica_dir(self, relative: &str) -> Self {
        fs::create_dir_all(self.replica.join(relative)).expect("Failed to create replica dir");
        self
    }

    /// Run one pass with default options
    pub fn sync(&self) -> PassOutcome {
        self.sync_with(SyncOptions::default())
    }

    /// Run one pass with `options`
    pub fn sync_with(&self, options: SyncOptions) -> PassOutcome {
        self.run(Reconciler::with_sink(options, Vec::new()))
    }

    /// Run one pass whose cancellation flag is already set
    pub fn sync_cancelled(&self) -> PassOutcome {
        let flag = Arc::new(AtomicBool::new(true));
        self.run(Reconciler::with_sink(SyncOptions::default(), Vec::new()).with_cancellation(flag))
    }

    /// Run passes until one reports no change, returning how many ran
    pub fn sync_until_stable(&self, max_passes: usize) -> usize {
        for pass in 1..=max_passes {
            let outcome = self.sync();
            if !outcome.report.has_changes() && outcome.report.errors == 0 {
                return pass;
            }
        }
        panic!("trees did not converge within {} passes", max_passes);
    }

    /// Snapshot of the source tree
    pub fn source_snapshot(&self) -> BTreeMap<PathBuf, Entry> {
        snapshot(&self.source)
    }

    /// Snapshot of the replica tree
    pub fn replica_snapshot(&self) -> BTreeMap<PathBuf, Entry> {
        snapshot(&self.replica)
    }

    /// Assert the replica mirrors the source exactly
    pub fn assert_mirrored(&self) {
        assert_eq!(
            self.replica_snapshot(),
            self.source_snapshot(),
            "replica does not mirror source"
        );
    }

    fn run(&self, mut reconciler: Reconciler<Vec<SyncEvent>>) -> PassOutcome {
        let report = reconciler.sync_once(&self.source, &self.replica);
        PassOutcome {
            report,
            events: reconciler.into_sink(),
        }
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Relative path of every entry under `root` (root excluded), symlinks skipped
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Entry> {
    let mut entries = BTreeMap::new();
    collect(root, root, &mut entries);
    entries
}

fn collect(root: &Path, dir: &Path, entries: &mut BTreeMap<PathBuf, Entry>) {
    for entry in fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Failed to read dir entry").path();
        let relative = path
            .strip_prefix(root)
            .expect("Entry outside root")
            .to_path_buf();
        let metadata = fs::symlink_metadata(&path).expect("Failed to stat entry");

        if metadata.is_dir() {
            entries.insert(relative, Entry::Dir);
            collect(root, &path, entries);
        } else if metadata.is_file() {
            let contents = fs::read(&path).expect("Failed to read file");
            entries.insert(relative, Entry::File(contents));
        }
    }
}

fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, contents).expect("Failed to write test file");
}
