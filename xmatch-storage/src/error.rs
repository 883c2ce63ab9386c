//! Error types for XMATCH persistence.

use thiserror::Error;

/// Storage layer errors.
///
/// Anything here is a data-integrity or filesystem problem and is allowed
/// to abort the run; "nothing to save" is deliberately not an error (see
/// `SaveOutcome`).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed table {path}: {reason}")]
    MalformedTable { path: String, reason: String },

    #[error("Column {column} not found in table {path}")]
    MissingColumn { column: String, path: String },

    #[error("Bad value {value:?} in column {column} on line {line}: {reason}")]
    BadValue {
        column: String,
        value: String,
        line: usize,
        reason: String,
    },

    #[error("Recovered source {id} not present in the loaded radio catalogue")]
    UnknownSource { id: String },

    #[error(transparent)]
    Core(#[from] xmatch_core::CoreError),
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
