//! Record kind tags.

use crate::error::CodecError;
use std::fmt;

/// The kind of record a frame carries.
///
/// The tag is stored in every frame so that a blob written for one purpose
/// can never be decoded as another, even if the CBOR shapes happen to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordKind {
    /// Global server settings.
    ServerConfig = 1,
    /// OpenID identifier to username associations.
    OpenId = 2,
    /// The user directory.
    Users = 3,
    /// One user's history log.
    History = 4,
    /// A worksheet's lightweight configuration.
    WorksheetConfig = 5,
    /// A worksheet's cells.
    WorksheetBody = 6,
    /// The descriptive header section of an exported archive.
    ArchiveManifest = 7,
}

impl RecordKind {
    /// Every known kind, in tag order.
    pub const ALL: [RecordKind; 7] = [
        RecordKind::ServerConfig,
        RecordKind::OpenId,
        RecordKind::Users,
        RecordKind::History,
        RecordKind::WorksheetConfig,
        RecordKind::WorksheetBody,
        RecordKind::ArchiveManifest,
    ];

    /// Returns the on-disk tag byte.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Returns a short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RecordKind::ServerConfig => "server-config",
            RecordKind::OpenId => "openid",
            RecordKind::Users => "users",
            RecordKind::History => "history",
            RecordKind::WorksheetConfig => "worksheet-config",
            RecordKind::WorksheetBody => "worksheet-body",
            RecordKind::ArchiveManifest => "archive-manifest",
        }
    }
}

impl TryFrom<u8> for RecordKind {
    type Error = CodecError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or(CodecError::UnknownKind { tag })
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
