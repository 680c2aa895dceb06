//! Error types for SheetStore core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in SheetStore core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A worksheet (or other addressed item) does not exist.
    #[error("not found: {what}")]
    NotFound {
        /// Description of what was looked up.
        what: String,
    },

    /// A worksheet already occupies the target identity.
    #[error("already exists: {what}")]
    AlreadyExists {
        /// Description of the occupied identity.
        what: String,
    },

    /// The datastore cannot perform this operation.
    #[error("unsupported operation: {operation}: {reason}")]
    Unsupported {
        /// The operation that was refused.
        operation: &'static str,
        /// Why it cannot be performed.
        reason: String,
    },

    /// An archive file is structurally invalid.
    #[error("corrupt archive {path:?}: {message}")]
    CorruptArchive {
        /// Path of the archive, when it came from a file.
        path: Option<PathBuf>,
        /// Description of the problem.
        message: String,
    },

    /// A stored record could not be decoded.
    #[error("corrupt record at {key}: {source}")]
    CorruptRecord {
        /// Storage key of the record.
        key: String,
        /// The decoding failure.
        #[source]
        source: sheetstore_codec::CodecError,
    },

    /// A record could not be encoded for storage.
    #[error("cannot encode record for {key}: {source}")]
    EncodeRecord {
        /// Storage key the record was meant for.
        key: String,
        /// The encoding failure.
        #[source]
        source: sheetstore_codec::CodecError,
    },

    /// A username, subpath or worksheet identity is malformed.
    #[error("invalid identity {value:?}: {reason}")]
    InvalidIdentity {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Blob backend error.
    #[error("storage error: {0}")]
    Storage(#[from] sheetstore_storage::StorageError),

    /// I/O error outside the blob backend (archives, lock file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another process holds the datastore lock.
    #[error("datastore locked: another process has access")]
    DatastoreLocked,

    /// The datastore has been closed.
    #[error("datastore is closed")]
    DatastoreClosed,
}

/// Coarse classification of a [`CoreError`], for callers that only need to
/// branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The addressed worksheet does not exist.
    NotFound,
    /// The target identity is already occupied.
    AlreadyExists,
    /// The operation cannot be performed by this datastore.
    Unsupported,
    /// An archive is structurally invalid.
    CorruptArchive,
    /// The durable medium failed, or holds unreadable data.
    IoFailure,
    /// The caller passed a malformed identity.
    Invalid,
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates an already exists error.
    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists { what: what.into() }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            operation,
            reason: reason.into(),
        }
    }

    /// Creates a corrupt archive error.
    pub fn corrupt_archive(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptArchive {
            path,
            message: message.into(),
        }
    }

    /// Creates an invalid identity error.
    pub fn invalid_identity(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Classifies this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::CorruptArchive { .. } => ErrorKind::CorruptArchive,
            Self::InvalidIdentity { .. } => ErrorKind::Invalid,
            Self::CorruptRecord { .. }
            | Self::EncodeRecord { .. }
            | Self::Storage(_)
            | Self::Io(_)
            | Self::DatastoreLocked
            | Self::DatastoreClosed => ErrorKind::IoFailure,
        }
    }
}
