//! # SheetStore Codec
//!
//! Checksummed CBOR record framing for SheetStore.
//!
//! Every record SheetStore persists - server configuration, OpenID
//! associations, the user directory, history logs, worksheet configuration
//! and bodies, archive sections - travels inside a *frame*:
//!
//! - a magic number and format version, so foreign or future data is
//!   rejected up front
//! - a [`RecordKind`] tag, so a blob can never be decoded as the wrong
//!   record type
//! - a serde/CBOR payload
//! - a SHA-256 digest over everything before it, so torn or corrupted
//!   bytes are detected instead of deserialized
//!
//! ## Usage
//!
//! ```
//! use sheetstore_codec::{decode_record, encode_record, RecordKind};
//!
//! let history = vec!["2 + 2".to_string(), "plot(sin)".to_string()];
//! let bytes = encode_record(RecordKind::History, &history).unwrap();
//!
//! let decoded: Vec<String> = decode_record(RecordKind::History, &bytes).unwrap();
//! assert_eq!(decoded, history);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod frame;
mod kind;

pub use error::{CodecError, CodecResult};
pub use frame::{
    decode_record, encode_record, from_cbor, open_frame, read_header, split_frames, to_cbor,
    FrameHeader, DIGEST_SIZE, HEADER_SIZE, MAX_PAYLOAD_LEN, RECORD_MAGIC, RECORD_VERSION,
};
pub use kind::RecordKind;
