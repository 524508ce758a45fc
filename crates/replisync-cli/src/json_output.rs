//! JSON output structures for the `once --json` command

use replisync_types::SyncReport;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete JSON output for a single pass
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResultJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// Pass statistics
    pub stats: SyncStatsJson,
    /// Overall result
    pub result: OperationResult,
}

/// Operation metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationMetadata {
    /// Replisync version
    pub version: String,
    /// Identifier of the pass
    pub run_id: String,
    /// Timestamp when the pass finished
    pub timestamp: String,
    /// Source path
    pub source_path: String,
    /// Replica path
    pub replica_path: String,
    /// Whether changes were only reported
    pub dry_run: bool,
}

/// Pass statistics in JSON format
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncStatsJson {
    /// Number of directories created
    pub directories_created: u64,
    /// Number of files copied
    pub files_copied: u64,
    /// Number of files already in sync
    pub files_skipped: u64,
    /// Number of files removed
    pub files_removed: u64,
    /// Number of directories removed
    pub directories_removed: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Number of per-entry errors
    pub errors: u64,
    /// Duration in seconds
    pub duration_seconds: f64,
}

/// Overall operation result
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether the pass finished without errors
    pub success: bool,
    /// Whether the pass was interrupted
    pub cancelled: bool,
    /// Number of changes applied (or planned, in a dry run)
    pub changes: u64,
}

impl From<&SyncReport> for SyncStatsJson {
    fn from(report: &SyncReport) -> Self {
        Self {
            directories_created: report.directories_created,
            files_copied: report.files_copied,
            files_skipped: report.files_skipped,
            files_removed: report.files_removed,
            directories_removed: report.directories_removed,
            bytes_copied: report.bytes_copied,
            errors: report.errors,
            duration_seconds: report.duration.as_secs_f64(),
        }
    }
}

/// Build the JSON result for a finished pass
pub fn create_sync_result_json(
    source: &Path,
    replica: &Path,
    dry_run: bool,
    report: &SyncReport,
) -> SyncResultJson {
    SyncResultJson {
        metadata: OperationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            run_id: report.run_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            source_path: source.display().to_string(),
            replica_path: replica.display().to_string(),
            dry_run,
        },
        stats: SyncStatsJson::from(report),
        result: OperationResult {
            success: report.is_clean(),
            cancelled: report.cancelled,
            changes: report.total_changes(),
        },
    }
}
