//! Error types and handling for Replisync
//!
//! Errors raised while reconciling a single entry are recovered locally by the
//! reconciler: they are reported as events and the pass moves on. Only the
//! startup checks performed by the driver (see [`Error::InvalidRoot`] and
//! [`Error::Config`]) are allowed to terminate the process.

use std::path::{Path, PathBuf};

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The offending entry is skipped, the pass continues
    Entry,
    /// The current pass stops early
    Pass,
    /// The process should terminate
    Fatal,
}

/// Main error type for Replisync operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation on a specific path failed
    #[error("failed to {operation} '{}': {source}", path.display())]
    Io {
        /// What was being attempted (e.g. "copy", "remove file")
        operation: &'static str,
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A path could not be mapped onto the other tree
    #[error("path '{}' is not located under root '{}'", path.display(), root.display())]
    PathResolution {
        /// Path that failed to resolve
        path: PathBuf,
        /// Root it was expected to live under
        root: PathBuf,
    },

    /// A source or replica root is unusable
    #[error("invalid root '{}': {reason}", path.display())]
    InvalidRoot {
        /// Offending root path
        path: PathBuf,
        /// Why the root was rejected
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Operation cancelled
    #[error("Operation cancelled")]
    Cancelled,
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Relative path mapping errors
    PathResolution,
    /// Invalid source/replica roots
    InvalidRoot,
    /// Configuration errors
    Config,
    /// Cancellation
    Cancelled,
}

impl Error {
    /// Wrap an I/O error with the operation and path it belongs to
    pub fn io(operation: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a new path resolution error
    pub fn path_resolution(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Self {
        Self::PathResolution {
            path: path.as_ref().to_path_buf(),
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create a new invalid root error
    pub fn invalid_root<S: Into<String>>(path: impl AsRef<Path>, reason: S) -> Self {
        Self::InvalidRoot {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::PathResolution { .. } => ErrorKind::PathResolution,
            Self::InvalidRoot { .. } => ErrorKind::InvalidRoot,
            Self::Config { .. } => ErrorKind::Config,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { .. } | Self::PathResolution { .. } => ErrorSeverity::Entry,
            Self::Cancelled => ErrorSeverity::Pass,
            Self::InvalidRoot { .. } | Self::Config { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Check if this error should terminate the process
    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. }
            | Self::PathResolution { path, .. }
            | Self::InvalidRoot { path, .. } => Some(path),
            Self::Config { .. } | Self::Cancelled => None,
        }
    }
}
