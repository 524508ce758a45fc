//! Replisync integration test support
//!
//! Fixtures shared by the integration tests: throwaway source/replica trees
//! and helpers to snapshot and compare them.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Tree fixtures and snapshot helpers
pub mod test_utils;

pub use test_utils::{snapshot, Entry, PassOutcome, TestTree};
