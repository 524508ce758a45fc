//! One-way directory reconciliation for Replisync
//!
//! This crate keeps a replica directory tree identical to a source tree:
//!
//! - **Fingerprinting**: streaming content digests (MD5, SHA-256, BLAKE3) decide
//!   whether a file changed; modification times are never trusted
//! - **Propagation**: missing directories are created and changed files copied
//! - **Pruning**: replica files and empty directories absent from the source are removed
//! - **Events**: every change and every per-entry failure is delivered to an
//!   injected [`EventSink`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use replisync_sync::{Reconciler, SyncEvent, SyncOptions};
//! use std::path::Path;
//!
//! let mut reconciler = Reconciler::with_sink(SyncOptions::default(), Vec::<SyncEvent>::new());
//! let report = reconciler.sync_once(Path::new("source"), Path::new("replica"));
//! println!(
//!     "copied {} files, removed {} files",
//!     report.files_copied, report.files_removed
//! );
//! for event in reconciler.sink() {
//!     println!("{}", event);
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod fingerprint;
pub mod paths;
pub mod sink;

pub use engine::{sync_once, Reconciler, SyncOptions};
pub use fingerprint::{Digest, FingerprintAlgorithm, Fingerprinter, DEFAULT_CHUNK_SIZE};
pub use paths::{PathPair, TreeRoots};
pub use replisync_types::{Error, Result, SyncEvent, SyncEventKind, SyncReport};
pub use sink::{EventSink, Tee, TracingSink};
