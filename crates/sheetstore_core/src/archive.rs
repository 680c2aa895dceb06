//! Worksheet archives.
//!
//! An archive is a self-contained export of exactly one worksheet. Import
//! needs nothing but the archive bytes.
//!
//! ## Archive Format
//!
//! ```text
//! | magic (4) | version (2) | exported_at_ms (8) | section_count (4) | sections... | sha256 (32) |
//! ```
//!
//! Each section is a codec frame. The sections are, in order, an
//! [`ArchiveManifest`], the worksheet configuration and the worksheet body.
//! The trailing digest covers every byte before it.

use crate::error::{CoreError, CoreResult};
use crate::identity::WorksheetIdent;
use crate::worksheet::{WorksheetBody, WorksheetConfig};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sheetstore_codec::{decode_record, encode_record, split_frames, RecordKind};
use std::path::PathBuf;

/// Magic bytes for archive files.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"SSWA";
/// Current archive format version.
pub const ARCHIVE_VERSION: u16 = 1;
/// Header size (magic + version + exported_at_ms + section_count).
const HEADER_SIZE: usize = 4 + 2 + 8 + 4;
/// Footer size (SHA-256 digest).
const FOOTER_SIZE: usize = 32;
/// Sections in a version 1 archive.
const SECTION_COUNT: u32 = 3;

/// Describes what an archive holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    /// Identity the worksheet was exported from.
    pub source: WorksheetIdent,
    /// Title as written into the archive.
    pub title: String,
    /// Export time, Unix milliseconds.
    pub exported_at_ms: u64,
    /// Number of cells in the body.
    pub cell_count: u64,
}

/// Header fields of an archive, readable without decoding any section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveMetadata {
    /// Format version.
    pub version: u16,
    /// Export time, Unix milliseconds.
    pub exported_at_ms: u64,
    /// Number of sections.
    pub section_count: u32,
    /// Total archive size in bytes.
    pub size: usize,
}

/// A fully decoded archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Header fields.
    pub metadata: ArchiveMetadata,
    /// Manifest section.
    pub manifest: ArchiveManifest,
    /// Worksheet configuration, with any exported title applied.
    pub config: WorksheetConfig,
    /// Worksheet body.
    pub body: WorksheetBody,
}

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Where the archive was written.
    pub path: PathBuf,
    /// The manifest written into it.
    pub manifest: ArchiveManifest,
    /// Archive size in bytes.
    pub size: usize,
}

fn corrupt(message: impl Into<String>) -> CoreError {
    CoreError::corrupt_archive(None, message)
}

/// Serializes a worksheet into archive bytes.
pub fn encode_archive(
    manifest: &ArchiveManifest,
    config: &WorksheetConfig,
    body: &WorksheetBody,
) -> CoreResult<Vec<u8>> {
    let sections = [
        encode_record(RecordKind::ArchiveManifest, manifest),
        encode_record(RecordKind::WorksheetConfig, config),
        encode_record(RecordKind::WorksheetBody, body),
    ];

    let mut data = Vec::new();
    data.extend_from_slice(&ARCHIVE_MAGIC);
    data.extend_from_slice(&ARCHIVE_VERSION.to_le_bytes());
    data.extend_from_slice(&manifest.exported_at_ms.to_le_bytes());
    data.extend_from_slice(&SECTION_COUNT.to_le_bytes());
    for section in sections {
        let section = section.map_err(|source| CoreError::EncodeRecord {
            key: manifest.source.to_string(),
            source,
        })?;
        data.extend_from_slice(&section);
    }
    let digest = Sha256::digest(&data);
    data.extend_from_slice(&digest);
    Ok(data)
}

/// Reads the archive header without verifying the digest or the sections.
pub fn read_archive_metadata(data: &[u8]) -> CoreResult<ArchiveMetadata> {
    if data.len() < HEADER_SIZE + FOOTER_SIZE {
        return Err(corrupt(format!(
            "archive too small: {} bytes",
            data.len()
        )));
    }
    if data[0..4] != ARCHIVE_MAGIC {
        return Err(corrupt("invalid archive magic"));
    }
    let version = u16::from_le_bytes([data[4], data[5]]);
    if version > ARCHIVE_VERSION {
        return Err(corrupt(format!(
            "unsupported archive version {version} (max {ARCHIVE_VERSION})"
        )));
    }
    let mut stamp = [0u8; 8];
    stamp.copy_from_slice(&data[6..14]);
    let mut count = [0u8; 4];
    count.copy_from_slice(&data[14..18]);

    Ok(ArchiveMetadata {
        version,
        exported_at_ms: u64::from_le_bytes(stamp),
        section_count: u32::from_le_bytes(count),
        size: data.len(),
    })
}

/// Decodes and verifies a complete archive.
pub fn read_archive(data: &[u8]) -> CoreResult<Archive> {
    let metadata = read_archive_metadata(data)?;

    let (content, stored) = data.split_at(data.len() - FOOTER_SIZE);
    if Sha256::digest(content).as_slice() != stored {
        return Err(corrupt("archive checksum mismatch"));
    }

    let frames = split_frames(&content[HEADER_SIZE..])
        .map_err(|e| corrupt(format!("malformed section: {e}")))?;
    if frames.len() != metadata.section_count as usize || frames.len() != SECTION_COUNT as usize {
        return Err(corrupt(format!(
            "expected {SECTION_COUNT} sections, header declares {} and archive holds {}",
            metadata.section_count,
            frames.len()
        )));
    }

    let manifest: ArchiveManifest = decode_record(RecordKind::ArchiveManifest, frames[0])
        .map_err(|e| corrupt(format!("manifest: {e}")))?;
    let config: WorksheetConfig = decode_record(RecordKind::WorksheetConfig, frames[1])
        .map_err(|e| corrupt(format!("worksheet configuration: {e}")))?;
    let body: WorksheetBody = decode_record(RecordKind::WorksheetBody, frames[2])
        .map_err(|e| corrupt(format!("worksheet body: {e}")))?;

    if manifest.cell_count != body.cells.len() as u64 {
        return Err(corrupt(format!(
            "manifest lists {} cells but body has {}",
            manifest.cell_count,
            body.cells.len()
        )));
    }

    Ok(Archive {
        metadata,
        manifest,
        config,
        body,
    })
}

/// Checks an archive end to end and returns its header.
pub fn validate_archive(data: &[u8]) -> CoreResult<ArchiveMetadata> {
    read_archive(data).map(|archive| archive.metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worksheet::{Cell, Worksheet};
    use proptest::prelude::*;

    fn sample() -> Vec<u8> {
        let mut ws = Worksheet::new(WorksheetIdent::new("alice", 3).unwrap());
        ws.set_title("Primes");
        ws.body.cells.push(Cell::compute(0, "prime_range(20)").with_output("[2, 3, 5, 7, 11, 13, 17, 19]"));
        ws.body.cells.push(Cell::text(1, "<p>done</p>"));
        let manifest = ArchiveManifest {
            source: ws.ident().clone(),
            title: ws.title().to_string(),
            exported_at_ms: 1_700_000_000_000,
            cell_count: 2,
        };
        encode_archive(&manifest, &ws.config, &ws.body).unwrap()
    }

    #[test]
    fn encode_and_read() {
        let data = sample();
        let archive = read_archive(&data).unwrap();
        assert_eq!(archive.metadata.version, ARCHIVE_VERSION);
        assert_eq!(archive.metadata.section_count, 3);
        assert_eq!(archive.metadata.exported_at_ms, 1_700_000_000_000);
        assert_eq!(archive.manifest.title, "Primes");
        assert_eq!(archive.config.title, "Primes");
        assert_eq!(archive.body.cells.len(), 2);
        assert_eq!(validate_archive(&data).unwrap(), archive.metadata);
    }

    #[test]
    fn metadata_only_reads_header() {
        let mut data = sample();
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        assert!(read_archive_metadata(&data).is_ok());
        assert!(validate_archive(&data).is_err());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = sample();
        data[0] = b'X';
        assert!(matches!(
            read_archive(&data),
            Err(CoreError::CorruptArchive { .. })
        ));
    }

    #[test]
    fn rejects_newer_version() {
        let mut data = sample();
        data[4..6].copy_from_slice(&(ARCHIVE_VERSION + 1).to_le_bytes());
        assert!(matches!(
            read_archive_metadata(&data),
            Err(CoreError::CorruptArchive { .. })
        ));
    }

    #[test]
    fn rejects_truncation() {
        let data = sample();
        for len in [0, 10, HEADER_SIZE + FOOTER_SIZE - 1, data.len() - 1] {
            assert!(read_archive(&data[..len]).is_err(), "accepted {len} bytes");
        }
    }

    #[test]
    fn rejects_other_files() {
        assert!(read_archive(b"PK\x03\x04 this is a zip file, not an archive at all").is_err());
    }

    proptest! {
        #[test]
        fn any_corruption_is_detected(index in any::<prop::sample::Index>(), flip in 1u8..=255) {
            let mut data = sample();
            let at = index.index(data.len());
            data[at] ^= flip;
            prop_assert!(matches!(read_archive(&data), Err(CoreError::CorruptArchive { .. })), "expected CorruptArchive error");
        }
    }
}
