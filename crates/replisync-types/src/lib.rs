//! Core type system and error handling for Replisync
//!
//! This crate provides the foundational types shared across the Replisync
//! workspace:
//!
//! - **Error handling**: error taxonomy separating per-entry failures from fatal ones
//! - **Events**: structured records of every change applied to a replica tree
//! - **Reports**: per-pass counters for observability and assertions
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use replisync_types::{Result, SyncEventKind, SyncReport};
//!
//! fn example_pass() -> Result<SyncReport> {
//!     let mut report = SyncReport::new();
//!     report.record(SyncEventKind::FileCopied);
//!     Ok(report)
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use types::*;
