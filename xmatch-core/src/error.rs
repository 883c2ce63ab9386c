//! Error types for XMATCH core operations.

use thiserror::Error;

/// Core domain errors. Operator input mistakes (duplicate clicks, bad
/// confidence keys) are not errors; they are absorbed by the session
/// protocol. These are genuine integrity problems.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Row {index} out of bounds for table of {len} rows")]
    RowOutOfBounds { index: usize, len: usize },
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
