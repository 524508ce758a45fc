//! Console output for the CLI

use console::style;
use replisync_types::SyncReport;
use std::path::Path;
use std::time::Duration;

/// Banner printed before a pass
pub fn display_start(source: &Path, replica: &Path, dry_run: bool) {
    println!(
        "{} Synchronizing {} into {}",
        style("⟲").blue().bold(),
        style(source.display()).cyan(),
        style(replica.display()).cyan()
    );

    if dry_run {
        display_info("Dry run mode - no changes will be made");
    }
}

/// Print the summary of a finished pass
pub fn display_report(report: &SyncReport) {
    println!();
    println!("{}", style("Sync Statistics:").bold().underlined());
    println!(
        "  Directories created: {}",
        style(report.directories_created).green()
    );
    println!("  Files copied: {}", style(report.files_copied).green());
    println!(
        "  Bytes copied: {}",
        style(format_bytes(report.bytes_copied)).green()
    );
    println!("  Files unchanged: {}", style(report.files_skipped).dim());
    println!("  Files removed: {}", style(report.files_removed).yellow());
    println!(
        "  Directories removed: {}",
        style(report.directories_removed).yellow()
    );
    println!(
        "  Errors: {}",
        if report.errors > 0 {
            style(report.errors).red()
        } else {
            style(report.errors).green()
        }
    );
    println!(
        "  Duration: {}",
        style(format_duration(report.duration)).blue()
    );
    println!();

    if report.cancelled {
        display_warning("Synchronization was interrupted before completion");
    } else if report.errors > 0 {
        display_warning(&format!(
            "Synchronization finished with {} error(s); see the log for details",
            report.errors
        ));
    } else if report.has_changes() {
        display_success("Replica is up to date");
    } else {
        display_success("Replica was already up to date");
    }
}

/// Display success message
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), style(message).green());
}

/// Display info message
pub fn display_info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), message);
}

/// Display warning message
pub fn display_warning(message: &str) {
    println!(
        "{} {}",
        style("⚠").yellow().bold(),
        style(message).yellow()
    );
}

/// Display error message
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
