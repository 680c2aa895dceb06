//! Error types for the codec crate.

use crate::kind::RecordKind;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while framing or unframing a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before a complete frame was read.
    #[error("truncated frame: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required to continue.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// The frame does not start with the record magic.
    #[error("bad record magic: {found:02x?}")]
    BadMagic {
        /// The four bytes found instead.
        found: [u8; 4],
    },

    /// The frame was written by a newer format version.
    #[error("unsupported record format version {version} (newest known is {supported})")]
    UnsupportedVersion {
        /// Version found in the frame.
        version: u16,
        /// Newest version this build understands.
        supported: u16,
    },

    /// The kind tag is not one this build knows.
    #[error("unknown record kind tag {tag}")]
    UnknownKind {
        /// The raw tag byte.
        tag: u8,
    },

    /// The frame holds a different kind of record than requested.
    #[error("expected a {expected} record, found {found}")]
    KindMismatch {
        /// Kind the caller asked for.
        expected: RecordKind,
        /// Kind stored in the frame.
        found: RecordKind,
    },

    /// The payload length field disagrees with the data.
    #[error("payload length mismatch: header says {declared}, frame holds {actual}")]
    LengthMismatch {
        /// Length declared in the header.
        declared: usize,
        /// Length actually present.
        actual: usize,
    },

    /// The payload is larger than any legitimate record.
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Declared or actual payload length.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// The stored digest does not match the frame contents.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Serializing the value to CBOR failed.
    #[error("encoding failed: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },

    /// Deserializing the CBOR payload failed.
    #[error("decoding failed: {message}")]
    Decoding {
        /// Description of the decoding error.
        message: String,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }
}
