//! File-based blob backend for persistent storage.

use crate::backend::BlobStore;
use crate::error::{StorageError, StorageResult};
use crate::key::BlobKey;
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Suffix of in-flight temporary files; they are also dot-prefixed so
/// they can never collide with a valid key segment.
const TEMP_SUFFIX: &str = ".tmp";

/// A file-based blob backend.
///
/// Each key maps to a file below the root directory: `home/alice/history`
/// is stored at `<root>/home/alice/history`. Data survives process restarts.
///
/// # File Names
///
/// Segments are encoded so that two distinct keys never land on names that
/// differ only by case, which case-insensitive file systems would merge:
///
/// - `a-z`, `0-9`, `.`, `-`, `@` and `+` are kept as they are
/// - an uppercase ASCII letter becomes `_` and its lowercase form (`Alice` is
///   stored as `_alice`)
/// - `_` becomes `__`
/// - anything else becomes `~hh` for each of its UTF-8 bytes
///
/// The encoding is lossless, and listing decodes names back into keys.
///
/// # Durability
///
/// `put` writes to a uniquely named temporary sibling, syncs it, and renames
/// it over the target. When `sync_on_write` is enabled the parent directory
/// is fsynced as well, so the rename itself survives a crash.
///
/// # Thread Safety
///
/// Blob replacement is atomic at the file-system level, so readers never
/// take a lock. Writers share a read guard; `clear` takes the write guard so
/// it never races a half-finished `put`.
///
/// # Example
///
/// ```no_run
/// use sheetstore_storage::{BlobKey, BlobStore, FileBlobStore};
/// use std::path::Path;
///
/// let store = FileBlobStore::open(Path::new("data"), true).unwrap();
/// let key = BlobKey::parse("home/alice/history").unwrap();
/// store.put(&key, b"persistent data").unwrap();
/// store.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBlobStore {
    root: PathBuf,
    sync_on_write: bool,
    structure: RwLock<()>,
}

impl FileBlobStore {
    /// Opens a blob store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, or if `root`
    /// exists but is not a directory.
    pub fn open(root: &Path, sync_on_write: bool) -> StorageResult<Self> {
        fs::create_dir_all(root)?;
        if !root.is_dir() {
            return Err(StorageError::Corrupted(format!(
                "blob root is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root: root.to_path_buf(),
            sync_on_write,
            structure: RwLock::new(()),
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path a key is stored at.
    #[must_use]
    pub fn path_for(&self, key: &BlobKey) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.segments() {
            path.push(encode_segment(segment));
        }
        path
    }

    fn collect(&self, dir: &Path, key: &BlobKey, out: &mut Vec<BlobKey>) -> StorageResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                debug!(path = ?entry.path(), "skipping non UTF-8 entry");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            // Symlinks are never followed, so enumeration cannot cycle.
            let file_type = entry.file_type()?;
            if file_type.is_symlink() {
                debug!(path = ?entry.path(), "skipping symbolic link");
                continue;
            }

            let Some(child) = decode_segment(&name).and_then(|s| key.child(s).ok()) else {
                debug!(path = ?entry.path(), "skipping entry that is not an encoded key segment");
                continue;
            };
            if file_type.is_dir() {
                self.collect(&entry.path(), &child, out)?;
            } else if file_type.is_file() {
                out.push(child);
            }
        }
        Ok(())
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &BlobKey) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) if path.is_dir() => Err(StorageError::Corrupted(format!(
                "expected a blob but found a directory at {}: {e}",
                path.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &BlobKey, data: &[u8]) -> StorageResult<()> {
        if key.is_root() {
            return Err(StorageError::InvalidKey {
                segment: String::new(),
                reason: "cannot store a blob at the root key",
            });
        }

        let _structure = self.structure.read();
        let path = self.path_for(key);
        atomic_write_inner(&path, data, self.sync_on_write)?;
        debug!(key = %key, bytes = data.len(), "blob written");
        Ok(())
    }

    fn contains(&self, key: &BlobKey) -> StorageResult<bool> {
        match fs::metadata(self.path_for(key)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, prefix: &BlobKey) -> StorageResult<Vec<BlobKey>> {
        let path = self.path_for(prefix);
        let mut keys = Vec::new();

        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_file() && !prefix.is_root() => keys.push(prefix.clone()),
            Ok(meta) if meta.is_dir() => self.collect(&path, prefix, &mut keys)?,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        keys.sort();
        Ok(keys)
    }

    fn clear(&self) -> StorageResult<()> {
        let _structure = self.structure.write();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        sync_dir(&self.root)?;
        Ok(())
    }

    fn sync(&self) -> StorageResult<()> {
        sync_dir(&self.root)
    }
}

fn is_plain(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '@' | '+')
}

/// Encodes a key segment as a file name that is unique up to case.
fn encode_segment(segment: &str) -> String {
    let mut name = String::with_capacity(segment.len());
    for c in segment.chars() {
        if is_plain(c) {
            name.push(c);
        } else if c.is_ascii_uppercase() {
            name.push('_');
            name.push(c.to_ascii_lowercase());
        } else if c == '_' {
            name.push_str("__");
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                name.push_str(&format!("~{byte:02x}"));
            }
        }
    }
    name
}

/// Decodes a file name produced by [`encode_segment`]. Names that are not
/// the canonical encoding of any segment yield `None`.
fn decode_segment(name: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(name.len());
    let mut rest = name.bytes();
    while let Some(b) = rest.next() {
        match b {
            b'_' => match rest.next()? {
                b'_' => bytes.push(b'_'),
                c if c.is_ascii_lowercase() => bytes.push(c.to_ascii_uppercase()),
                _ => return None,
            },
            b'~' => {
                let hex = [rest.next()?, rest.next()?];
                let hex = std::str::from_utf8(&hex).ok()?;
                bytes.push(u8::from_str_radix(hex, 16).ok()?);
            }
            c if is_plain(char::from(c)) => bytes.push(c),
            _ => return None,
        }
    }

    let segment = String::from_utf8(bytes).ok()?;
    (encode_segment(&segment) == name).then_some(segment)
}

/// Writes `data` to `path` atomically.
///
/// 1. Write to a uniquely named temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temporary file over the target
/// 4. Sync the directory so the rename is durable
///
/// Parent directories are created as needed. If any step fails the
/// temporary file is removed and the target is left untouched.
///
/// # Errors
///
/// Returns an error if any of the steps fail.
pub fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    atomic_write_inner(path, data, true)
}

fn atomic_write_inner(path: &Path, data: &[u8], sync_parent: bool) -> StorageResult<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::Corrupted(format!("no file name in {}", path.display())))?;
    let temp_path = parent.join(format!(".{file_name}.{}{TEMP_SUFFIX}", Uuid::new_v4().simple()));

    let written = (|| -> io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, path)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if sync_parent {
        sync_dir(parent)?;
    }
    Ok(())
}

/// Syncs a directory so that entry creation, rename and removal are durable.
///
/// On Windows, directory fsync is not supported the same way; NTFS
/// journaling covers metadata durability, so this is a no-op there.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> StorageResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> StorageResult<()> {
    Ok(())
}
