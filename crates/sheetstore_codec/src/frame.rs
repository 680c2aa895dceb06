//! Record framing.
//!
//! ```text
//! | magic (4) | version (2) | kind (1) | payload_len (4) | payload (CBOR) | sha256 (32) |
//! ```
//!
//! All integers are little-endian. The digest covers the header and the
//! payload, so any flipped bit anywhere in the frame is detected.

use crate::error::{CodecError, CodecResult};
use crate::kind::RecordKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Magic bytes at the start of every record frame.
pub const RECORD_MAGIC: [u8; 4] = *b"SSRC";
/// Current record format version.
pub const RECORD_VERSION: u16 = 1;
/// Header size (magic + version + kind + payload_len).
pub const HEADER_SIZE: usize = 4 + 2 + 1 + 4;
/// Footer size (SHA-256 digest).
pub const DIGEST_SIZE: usize = 32;
/// Maximum payload length accepted when decoding.
///
/// Prevents allocation-based DoS from a corrupted length field.
pub const MAX_PAYLOAD_LEN: usize = 256 * 1024 * 1024;

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Format version the frame was written with.
    pub version: u16,
    /// Kind of record carried.
    pub kind: RecordKind,
    /// Payload length in bytes.
    pub payload_len: usize,
}

impl FrameHeader {
    /// Total encoded size of the frame this header describes.
    #[must_use]
    pub const fn frame_len(&self) -> usize {
        HEADER_SIZE + self.payload_len + DIGEST_SIZE
    }
}

/// Serializes `value` to plain CBOR, without framing.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CodecError::encoding(e.to_string()))?;
    Ok(buf)
}

/// Deserializes a value from plain CBOR, without framing.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR for `T`.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::decoding(e.to_string()))
}

/// Encodes `value` as a framed record of the given kind.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or is too large.
pub fn encode_record<T: Serialize + ?Sized>(kind: RecordKind, value: &T) -> CodecResult<Vec<u8>> {
    let payload = to_cbor(value)?;
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + DIGEST_SIZE);
    buf.extend_from_slice(&RECORD_MAGIC);
    buf.extend_from_slice(&RECORD_VERSION.to_le_bytes());
    buf.push(kind.tag());
    // MAX_PAYLOAD_LEN fits in u32.
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(&payload);

    let digest = Sha256::digest(&buf);
    buf.extend_from_slice(&digest);
    Ok(buf)
}

/// Reads and validates the header at the start of `data`.
///
/// Only the header is checked; the payload and digest are not.
///
/// # Errors
///
/// Returns an error for short input, bad magic, a newer version, an
/// unknown kind, or an oversized length.
pub fn read_header(data: &[u8]) -> CodecResult<FrameHeader> {
    if data.len() < HEADER_SIZE {
        return Err(CodecError::Truncated {
            needed: HEADER_SIZE,
            available: data.len(),
        });
    }

    let found = [data[0], data[1], data[2], data[3]];
    if found != RECORD_MAGIC {
        return Err(CodecError::BadMagic { found });
    }

    let version = u16::from_le_bytes([data[4], data[5]]);
    if version == 0 || version > RECORD_VERSION {
        return Err(CodecError::UnsupportedVersion {
            version,
            supported: RECORD_VERSION,
        });
    }

    let kind = RecordKind::try_from(data[6])?;
    let payload_len = u32::from_le_bytes([data[7], data[8], data[9], data[10]]) as usize;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLarge {
            len: payload_len,
            max: MAX_PAYLOAD_LEN,
        });
    }

    Ok(FrameHeader {
        version,
        kind,
        payload_len,
    })
}

/// Verifies a single complete frame and returns its header and payload.
///
/// `data` must contain exactly one frame.
///
/// # Errors
///
/// Returns an error if the header is invalid, the length is wrong, or
/// the digest does not match.
pub fn open_frame(data: &[u8]) -> CodecResult<(FrameHeader, &[u8])> {
    let header = read_header(data)?;
    let expected = header.frame_len();
    if data.len() < expected {
        return Err(CodecError::Truncated {
            needed: expected,
            available: data.len(),
        });
    }
    if data.len() != expected {
        return Err(CodecError::LengthMismatch {
            declared: header.payload_len,
            actual: data.len().saturating_sub(HEADER_SIZE + DIGEST_SIZE),
        });
    }

    let digest_offset = HEADER_SIZE + header.payload_len;
    let computed = Sha256::digest(&data[..digest_offset]);
    if computed.as_slice() != &data[digest_offset..] {
        return Err(CodecError::ChecksumMismatch);
    }

    Ok((header, &data[HEADER_SIZE..digest_offset]))
}

/// Decodes a framed record, checking that it is of the `expected` kind.
///
/// # Errors
///
/// Returns an error if the frame is invalid, of a different kind, or its
/// payload does not deserialize into `T`.
pub fn decode_record<T: DeserializeOwned>(expected: RecordKind, data: &[u8]) -> CodecResult<T> {
    let (header, payload) = open_frame(data)?;
    if header.kind != expected {
        return Err(CodecError::KindMismatch {
            expected,
            found: header.kind,
        });
    }
    from_cbor(payload)
}

/// Splits a buffer of back-to-back frames into individual frames.
///
/// Only headers are validated here; call [`open_frame`] or
/// [`decode_record`] on each piece to verify it.
///
/// # Errors
///
/// Returns an error if a header is invalid or a frame runs past the end.
pub fn split_frames(mut data: &[u8]) -> CodecResult<Vec<&[u8]>> {
    let mut frames = Vec::new();
    while !data.is_empty() {
        let header = read_header(data)?;
        let len = header.frame_len();
        if len > data.len() {
            return Err(CodecError::Truncated {
                needed: len,
                available: data.len(),
            });
        }
        let (frame, rest) = data.split_at(len);
        frames.push(frame);
        data = rest;
    }
    Ok(frames)
}
