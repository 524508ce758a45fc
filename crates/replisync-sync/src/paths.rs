//! Mapping between corresponding source and replica paths
//!
//! A path is mapped by stripping the root it lives under and joining the
//! remainder onto the other root. Paths are compared component-wise, so a
//! directory inside the tree that happens to repeat the root's name is never
//! rewritten.

use replisync_types::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// A source path and its replica counterpart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    /// Path relative to both roots
    pub relative: PathBuf,
    /// Absolute path under the source root
    pub source: PathBuf,
    /// Absolute path under the replica root
    pub replica: PathBuf,
}

/// The two roots a reconciliation pass works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRoots {
    source: PathBuf,
    replica: PathBuf,
}

impl TreeRoots {
    /// Create a new root pair
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
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

    /// Build the pair for a path relative to both roots
    pub fn pair(&self, relative: impl Into<PathBuf>) -> PathPair {
        let relative = relative.into();
        PathPair {
            source: join_relative(&self.source, &relative),
            replica: join_relative(&self.replica, &relative),
            relative,
        }
    }

    /// Map a path found under the source root
    pub fn for_source(&self, path: &Path) -> Result<PathPair> {
        relative_to(path, &self.source).map(|relative| self.pair(relative))
    }

    /// Map a path found under the replica root
    pub fn for_replica(&self, path: &Path) -> Result<PathPair> {
        relative_to(path, &self.replica).map(|relative| self.pair(relative))
    }
}

/// Strip `root` from `path`, failing closed on anything that would escape it
pub fn relative_to<'a>(path: &'a Path, root: &Path) -> Result<&'a Path> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| Error::path_resolution(path, root))?;

    if relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
    {
        Ok(relative)
    } else {
        Err(Error::path_resolution(path, root))
    }
}

// `root.join("")` would append a trailing separator
fn join_relative(root: &Path, relative: &Path) -> PathBuf {
    if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}
