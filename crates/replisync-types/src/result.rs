//! Result type alias for Replisync operations

use crate::Error;

/// Result type alias for Replisync operations
pub type Result<T> = std::result::Result<T, Error>;
