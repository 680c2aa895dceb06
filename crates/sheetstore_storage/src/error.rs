//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A blob key or key segment is not acceptable to the backend.
    #[error("invalid blob key segment {segment:?}: {reason}")]
    InvalidKey {
        /// The rejected segment.
        segment: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The backing medium holds something the backend cannot interpret,
    /// such as a directory where a blob is expected.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The backend has been closed.
    #[error("storage is closed")]
    Closed,
}

impl StorageError {
    /// Returns `true` if this error was caused by a missing file or directory.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}
