//! Identity and namespace resolution.
//!
//! Maps user and worksheet identities onto blob keys:
//!
//! ```text
//! server_conf                                  ServerConfig record
//! openid                                       OpenID associations record
//! users                                        user directory record
//! home/<username>/history                      history log
//! home/<username>/sheets/<seg>/.../ws-<id>/conf   worksheet configuration
//! home/<username>/sheets/<seg>/.../ws-<id>/body   worksheet body
//! ```
//!
//! Subpath segments may not start with `ws-` and ids are rendered in
//! canonical decimal, so every (username, id, subpath) triple maps to its
//! own directory and a key can be parsed back into exactly one triple.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sheetstore_storage::BlobKey;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

const SERVER_CONF: &str = "server_conf";
const OPENID: &str = "openid";
const USERS: &str = "users";
const HOME: &str = "home";
const HISTORY: &str = "history";
const SHEETS: &str = "sheets";
const CONF: &str = "conf";
const BODY: &str = "body";
const WORKSHEET_PREFIX: &str = "ws-";

/// Maximum length of a username or a subpath segment.
pub const MAX_NAME_LEN: usize = 64;

/// A validated, case-sensitive username.
///
/// 1 to 64 characters from `[A-Za-z0-9._@+-]`, not starting with `.`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validates and wraps a username.
    pub fn new(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(CoreError::invalid_identity(
                name,
                format!("username must be 1 to {MAX_NAME_LEN} characters"),
            ));
        }
        if name.starts_with('.') {
            return Err(CoreError::invalid_identity(
                name,
                "username may not start with '.'",
            ));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '+' | '-')))
        {
            return Err(CoreError::invalid_identity(
                name,
                format!("username may not contain {bad:?}"),
            ));
        }
        Ok(Self(name))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Username {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Username {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

impl Borrow<str> for Username {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A sub-namespace within a user's worksheets, such as `projects/2024`.
///
/// The empty subpath is the root of the user's namespace. Each segment is
/// 1 to 64 characters from `[A-Za-z0-9_-]` and does not start with `ws-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Subpath(Vec<String>);

impl Subpath {
    /// The root subpath.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Parses a `/`-separated subpath. The empty string is the root.
    pub fn parse(path: &str) -> CoreResult<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::from_segments(trimmed.split('/'))
    }

    /// Builds a subpath from segments, validating each one.
    pub fn from_segments<I, S>(segments: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut subpath = Self::root();
        for segment in segments {
            subpath = subpath.child(segment)?;
        }
        Ok(subpath)
    }

    /// Returns a new subpath with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> CoreResult<Self> {
        let segment = segment.into();
        validate_segment(&segment)?;
        let mut segments = self.0.clone();
        segments.push(segment);
        Ok(Self(segments))
    }

    /// Returns the segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` for the root subpath.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `ancestor` is this subpath or contains it.
    #[must_use]
    pub fn starts_with(&self, ancestor: &Subpath) -> bool {
        self.0.starts_with(&ancestor.0)
    }
}

impl fmt::Display for Subpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl FromStr for Subpath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Vec<String>> for Subpath {
    type Error = CoreError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_segments(value)
    }
}

impl From<Subpath> for Vec<String> {
    fn from(subpath: Subpath) -> Self {
        subpath.0
    }
}

fn validate_segment(segment: &str) -> CoreResult<()> {
    if segment.is_empty() || segment.len() > MAX_NAME_LEN {
        return Err(CoreError::invalid_identity(
            segment,
            format!("subpath segment must be 1 to {MAX_NAME_LEN} characters"),
        ));
    }
    if segment.starts_with(WORKSHEET_PREFIX) {
        return Err(CoreError::invalid_identity(
            segment,
            format!("subpath segment may not start with {WORKSHEET_PREFIX:?}"),
        ));
    }
    if let Some(bad) = segment
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-')))
    {
        return Err(CoreError::invalid_identity(
            segment,
            format!("subpath segment may not contain {bad:?}"),
        ));
    }
    Ok(())
}

/// The full identity of one worksheet: owner, numeric id and subpath.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorksheetIdent {
    owner: Username,
    subpath: Subpath,
    id: u64,
}

impl WorksheetIdent {
    /// Creates an identity in the owner's root namespace.
    pub fn new(owner: &str, id: u64) -> CoreResult<Self> {
        Ok(Self {
            owner: Username::new(owner)?,
            subpath: Subpath::root(),
            id,
        })
    }

    /// Creates an identity from already validated parts.
    #[must_use]
    pub fn from_parts(owner: Username, id: u64, subpath: Subpath) -> Self {
        Self { owner, subpath, id }
    }

    /// Returns this identity moved under `subpath`.
    #[must_use]
    pub fn with_subpath(mut self, subpath: Subpath) -> Self {
        self.subpath = subpath;
        self
    }

    /// Returns the owner.
    #[must_use]
    pub fn owner(&self) -> &Username {
        &self.owner
    }

    /// Returns the numeric id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the subpath.
    #[must_use]
    pub fn subpath(&self) -> &Subpath {
        &self.subpath
    }
}

impl fmt::Display for WorksheetIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subpath.is_root() {
            write!(f, "{}/{}", self.owner, self.id)
        } else {
            write!(f, "{}/{}/{}", self.owner, self.subpath, self.id)
        }
    }
}

/// Resolves identities to blob keys, and worksheet keys back to identities.
#[derive(Debug, Clone, Copy, Default)]
pub struct Namespace;

impl Namespace {
    /// Key of the server configuration record.
    pub fn server_conf() -> CoreResult<BlobKey> {
        Ok(BlobKey::root().child(SERVER_CONF)?)
    }

    /// Key of the OpenID association record.
    pub fn openid() -> CoreResult<BlobKey> {
        Ok(BlobKey::root().child(OPENID)?)
    }

    /// Key of the user directory record.
    pub fn users() -> CoreResult<BlobKey> {
        Ok(BlobKey::root().child(USERS)?)
    }

    /// Prefix holding everything a user owns.
    pub fn home(owner: &Username) -> CoreResult<BlobKey> {
        Ok(BlobKey::root().child(HOME)?.child(owner.as_str())?)
    }

    /// Key of a user's history log.
    pub fn history(owner: &Username) -> CoreResult<BlobKey> {
        Ok(Self::home(owner)?.child(HISTORY)?)
    }

    /// Prefix holding every worksheet under `subpath`, recursively.
    pub fn sheets(owner: &Username, subpath: &Subpath) -> CoreResult<BlobKey> {
        let mut key = Self::home(owner)?.child(SHEETS)?;
        for segment in subpath.segments() {
            key = key.child(segment.as_str())?;
        }
        Ok(key)
    }

    /// Directory key holding one worksheet's blobs.
    pub fn worksheet(ident: &WorksheetIdent) -> CoreResult<BlobKey> {
        Ok(Self::sheets(&ident.owner, &ident.subpath)?
            .child(format!("{WORKSHEET_PREFIX}{}", ident.id))?)
    }

    /// Key of a worksheet's configuration blob. Its presence is what makes
    /// the worksheet exist.
    pub fn worksheet_conf(ident: &WorksheetIdent) -> CoreResult<BlobKey> {
        Ok(Self::worksheet(ident)?.child(CONF)?)
    }

    /// Key of a worksheet's body blob.
    pub fn worksheet_body(ident: &WorksheetIdent) -> CoreResult<BlobKey> {
        Ok(Self::worksheet(ident)?.child(BODY)?)
    }

    /// Parses a worksheet configuration key back into its identity.
    ///
    /// Returns `None` for any key that is not a well-formed worksheet
    /// configuration key, including ids that are not in canonical form.
    #[must_use]
    pub fn parse_worksheet_conf(key: &BlobKey) -> Option<WorksheetIdent> {
        let segments = key.segments();
        let (head, rest) = segments.split_at(segments.len().min(3));
        if head.len() != 3 || head[0] != HOME || head[2] != SHEETS {
            return None;
        }
        let owner = Username::new(head[1].as_str()).ok()?;

        let (last, rest) = rest.split_last()?;
        if last != CONF {
            return None;
        }
        let (dir, subpath) = rest.split_last()?;
        let id: u64 = dir.strip_prefix(WORKSHEET_PREFIX)?.parse().ok()?;
        if *dir != format!("{WORKSHEET_PREFIX}{id}") {
            return None;
        }
        let subpath = Subpath::from_segments(subpath.iter().cloned()).ok()?;

        Some(WorksheetIdent::from_parts(owner, id, subpath))
    }
}
