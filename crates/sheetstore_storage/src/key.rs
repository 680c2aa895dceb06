//! Hierarchical blob keys.

use crate::error::{StorageError, StorageResult};
use std::fmt;

/// An ordered, validated sequence of path segments naming one blob.
///
/// Keys are hierarchical: `home/alice/history` is *under* the prefix
/// `home/alice`. Backends map segments onto whatever structure they use
/// (directories for [`crate::FileBlobStore`], map keys for
/// [`crate::InMemoryBlobStore`]).
///
/// Segment rules are shared by every backend so that any key accepted by
/// one backend is accepted by all of them:
///
/// - non-empty
/// - not `.` or `..`, and not starting with `.` (reserved for temp files)
/// - no `/`, `\` or NUL characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BlobKey {
    segments: Vec<String>,
}

impl BlobKey {
    /// The empty key, which is the prefix of every other key.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Builds a key from segments, validating each one.
    pub fn from_segments<I, S>(segments: I) -> StorageResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut key = Self::root();
        for segment in segments {
            key = key.child(segment)?;
        }
        Ok(key)
    }

    /// Parses a `/`-separated key such as `home/alice/history`.
    pub fn parse(path: &str) -> StorageResult<Self> {
        if path.is_empty() {
            return Ok(Self::root());
        }
        Self::from_segments(path.split('/'))
    }

    /// Returns a new key with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> StorageResult<Self> {
        let segment = segment.into();
        validate_segment(&segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// Returns the segments of this key.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the final segment, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the key with its last segment removed.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns `true` for the empty key.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if `prefix` is this key or one of its ancestors.
    #[must_use]
    pub fn starts_with(&self, prefix: &BlobKey) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns the segments that follow `prefix`, or `None` if `prefix`
    /// is not a prefix of this key.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &BlobKey) -> Option<&[String]> {
        if self.starts_with(prefix) {
            Some(&self.segments[prefix.segments.len()..])
        } else {
            None
        }
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn validate_segment(segment: &str) -> StorageResult<()> {
    let invalid = |reason| {
        Err(StorageError::InvalidKey {
            segment: segment.to_string(),
            reason,
        })
    };

    if segment.is_empty() {
        return invalid("segment is empty");
    }
    if segment.starts_with('.') {
        return invalid("segment starts with '.'");
    }
    if segment.contains(['/', '\\', '\0']) {
        return invalid("segment contains a path separator or NUL");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let key = BlobKey::parse("home/alice/history").unwrap();
        assert_eq!(key.segments().len(), 3);
        assert_eq!(key.name(), Some("history"));
        assert_eq!(key.to_string(), "home/alice/history");
    }

    #[test]
    fn empty_path_is_root() {
        assert!(BlobKey::parse("").unwrap().is_root());
        assert!(BlobKey::root().parent().is_none());
    }

    #[test]
    fn rejects_bad_segments() {
        for bad in ["", ".", "..", ".hidden", "a\\b", "nul\0"] {
            let result = BlobKey::root().child(bad);
            assert!(
                matches!(result, Err(StorageError::InvalidKey { .. })),
                "accepted {bad:?}"
            );
        }
        assert!(BlobKey::parse("a//b").is_err());
        assert!(BlobKey::parse("/a").is_err());
    }

    #[test]
    fn prefix_relationships() {
        let prefix = BlobKey::parse("home/alice").unwrap();
        let key = BlobKey::parse("home/alice/ws-1/conf").unwrap();
        let other = BlobKey::parse("home/alicia/ws-1/conf").unwrap();

        assert!(key.starts_with(&prefix));
        assert!(!other.starts_with(&prefix));
        assert!(key.starts_with(&BlobKey::root()));

        let rest = key.strip_prefix(&prefix).unwrap();
        assert_eq!(rest, ["ws-1".to_string(), "conf".to_string()]);
        assert_eq!(key.parent().unwrap().name(), Some("ws-1"));
    }

    #[test]
    fn ordering_groups_children_after_parent() {
        let mut keys = vec![
            BlobKey::parse("b").unwrap(),
            BlobKey::parse("a/z").unwrap(),
            BlobKey::parse("a").unwrap(),
            BlobKey::parse("a/b").unwrap(),
        ];
        keys.sort();
        let rendered: Vec<_> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["a", "a/b", "a/z", "b"]);
    }
}
