//! Result type alias for refsync operations

use crate::Error;

/// Result type alias for refsync operations
pub type Result<T> = std::result::Result<T, Error>;
