//! Core data types for Replisync
//!
//! Reconciliation events and the per-pass summary report.

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Unique identifier for a reconciliation pass
pub type RunId = uuid::Uuid;

/// What happened to an entry during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SyncEventKind {
    /// A replica directory was created
    DirCreated,
    /// A source file was copied over the replica
    FileCopied,
    /// An orphaned replica file was deleted
    FileRemoved,
    /// An orphaned, empty replica directory was removed
    DirRemoved,
    /// An operation on this entry failed and the entry was skipped
    Error,
}

impl SyncEventKind {
    /// Whether this event represents a change to the replica tree
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Error)
    }
}

impl fmt::Display for SyncEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DirCreated => "Directory created",
            Self::FileCopied => "Copying",
            Self::FileRemoved => "Removing",
            Self::DirRemoved => "Removing directory",
            Self::Error => "Error",
        };
        f.write_str(label)
    }
}

/// A single structured reconciliation event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncEvent {
    /// Event kind
    pub kind: SyncEventKind,
    /// Affected path (replica side for changes)
    pub path: PathBuf,
    /// Source path for copies
    pub source: Option<PathBuf>,
    /// Error description for [`SyncEventKind::Error`]
    pub detail: Option<String>,
    /// When the event was produced
    pub timestamp: DateTime<Utc>,
}

impl SyncEvent {
    /// Create a new event stamped with the current time
    pub fn new(kind: SyncEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            source: None,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    /// A file copy from `source` to `replica`
    pub fn copied(source: &Path, replica: &Path) -> Self {
        Self::new(SyncEventKind::FileCopied, replica).with_source(source)
    }

    /// An error on `path`
    pub fn error(path: impl Into<PathBuf>, detail: impl fmt::Display) -> Self {
        Self::new(SyncEventKind::Error, path).with_detail(detail.to_string())
    }

    /// Attach the source path
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach a detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.source, &self.detail) {
            (SyncEventKind::FileCopied, Some(source), _) => write!(
                f,
                "{}: {} to {}",
                self.kind,
                source.display(),
                self.path.display()
            ),
            (_, _, Some(detail)) => write!(f, "{}: {}: {}", self.kind, self.path.display(), detail),
            _ => write!(f, "{}: {}", self.kind, self.path.display()),
        }
    }
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncReport {
    /// Identifier of the pass
    pub run_id: RunId,
    /// Number of replica directories created
    pub directories_created: u64,
    /// Number of files copied
    pub files_copied: u64,
    /// Number of files whose fingerprints already matched
    pub files_skipped: u64,
    /// Number of orphaned files removed
    pub files_removed: u64,
    /// Number of orphaned directories removed
    pub directories_removed: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Number of entries that failed
    pub errors: u64,
    /// Wall-clock duration of the pass
    pub duration: Duration,
    /// Whether the pass was interrupted
    pub cancelled: bool,
}

impl SyncReport {
    /// Create an empty report with a fresh run id
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            ..Self::default()
        }
    }

    /// Count an event in the matching counter
    pub fn record(&mut self, kind: SyncEventKind) {
        match kind {
            SyncEventKind::DirCreated => self.directories_created += 1,
            SyncEventKind::FileCopied => self.files_copied += 1,
            SyncEventKind::FileRemoved => self.files_removed += 1,
            SyncEventKind::DirRemoved => self.directories_removed += 1,
            SyncEventKind::Error => self.errors += 1,
        }
    }

    /// Total number of changes applied to the replica
    pub fn total_changes(&self) -> u64 {
        self.directories_created + self.files_copied + self.files_removed + self.directories_removed
    }

    /// Whether the pass changed anything
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }

    /// Whether the pass completed without per-entry errors
    pub fn is_clean(&self) -> bool {
        self.errors == 0 && !self.cancelled
    }

    /// Merge counters from another report (keeps this report's id)
    pub fn merge(&mut self, other: &SyncReport) {
        self.directories_created += other.directories_created;
        self.files_copied += other.files_copied;
        self.files_skipped += other.files_skipped;
        self.files_removed += other.files_removed;
        self.directories_removed += other.directories_removed;
        self.bytes_copied += other.bytes_copied;
        self.errors += other.errors;
        self.duration += other.duration;
        self.cancelled |= other.cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SyncEventKind::DirCreated, 1, 0, 0, 0)]
    #[case(SyncEventKind::FileCopied, 0, 1, 0, 0)]
    #[case(SyncEventKind::FileRemoved, 0, 0, 1, 0)]
    #[case(SyncEventKind::DirRemoved, 0, 0, 0, 1)]
    fn test_report_record(
        #[case] kind: SyncEventKind,
        #[case] created: u64,
        #[case] copied: u64,
        #[case] removed: u64,
        #[case] dirs_removed: u64,
    ) {
        let mut report = SyncReport::new();
        report.record(kind);

        assert_eq!(report.directories_created, created);
        assert_eq!(report.files_copied, copied);
        assert_eq!(report.files_removed, removed);
        assert_eq!(report.directories_removed, dirs_removed);
        assert!(report.has_changes());
        assert!(report.is_clean());
    }

    #[test]
    fn test_report_errors_are_not_changes() {
        let mut report = SyncReport::new();
        report.record(SyncEventKind::Error);

        assert!(!report.has_changes());
        assert!(!report.is_clean());
        assert_eq!(report.errors, 1);
    }

    #[test]
    fn test_report_merge() {
        let mut first = SyncReport::new();
        first.files_copied = 2;
        first.bytes_copied = 10;

        let mut second = SyncReport::new();
        second.files_copied = 1;
        second.files_removed = 3;
        second.cancelled = true;

        let id = first.run_id;
        first.merge(&second);
        assert_eq!(first.run_id, id);
        assert_eq!(first.files_copied, 3);
        assert_eq!(first.files_removed, 3);
        assert_eq!(first.bytes_copied, 10);
        assert!(first.cancelled);
    }

    #[test]
    fn test_event_display() {
        let copied = SyncEvent::copied(Path::new("/src/a.txt"), Path::new("/dst/a.txt"));
        assert_eq!(copied.to_string(), "Copying: /src/a.txt to /dst/a.txt");

        let removed = SyncEvent::new(SyncEventKind::DirRemoved, "/dst/old");
        assert_eq!(removed.to_string(), "Removing directory: /dst/old");

        let failed = SyncEvent::error("/dst/x", "permission denied");
        assert_eq!(failed.to_string(), "Error: /dst/x: permission denied");
        assert!(!failed.kind.is_change());
    }
}
