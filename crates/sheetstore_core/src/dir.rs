//! Datastore directory management.
//!
//! This module handles the file system layout of a file-backed datastore:
//!
//! ```text
//! <path>/
//! ├─ LOCK      # Advisory lock: exclusive for writers, shared for readers
//! └─ data/     # Blob root (see `identity` for the layout below it)
//! ```
//!
//! The LOCK file ensures only one process writes to a datastore at a time.
//! Keeping it outside `data/` means `delete()` can wipe every blob without
//! ever releasing the lock.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// File names within the datastore directory.
const LOCK_FILE: &str = "LOCK";
const DATA_DIR: &str = "data";

/// Manages the datastore directory structure and file locking.
///
/// # Thread Safety
///
/// A read-write `DatastoreDir` holds an exclusive lock on the directory, so
/// only one such instance can exist per directory at a time. Read-only
/// instances hold a shared lock and may coexist with each other.
#[derive(Debug)]
pub struct DatastoreDir {
    /// Root directory path.
    path: PathBuf,
    /// Lock file handle (held for the lifetime of the datastore).
    _lock_file: File,
}

impl DatastoreDir {
    /// Opens or creates a datastore directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the datastore directory
    /// * `create_if_missing` - If true, creates the directory if it doesn't exist
    /// * `read_only` - Take a shared lock instead of an exclusive one
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and may not be created
    /// - Another process holds a conflicting lock (`DatastoreLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool, read_only: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing && !read_only {
                fs::create_dir_all(path.join(DATA_DIR))?;
            } else {
                return Err(CoreError::not_found(format!(
                    "datastore directory {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_identity(
                path.display().to_string(),
                "datastore path is not a directory",
            ));
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = if read_only {
            OpenOptions::new().read(true).open(&lock_path).map_err(|_| {
                CoreError::not_found(format!("datastore lock file {}", lock_path.display()))
            })?
        } else {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)?
        };

        // Non-blocking: a held lock is reported, never waited on.
        let locked = if read_only {
            FileExt::try_lock_shared(&lock_file)
        } else {
            FileExt::try_lock_exclusive(&lock_file)
        };
        if locked.is_err() {
            return Err(CoreError::DatastoreLocked);
        }

        if !read_only {
            fs::create_dir_all(path.join(DATA_DIR))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the datastore directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the blob root.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.path.join(DATA_DIR)
    }

    /// Returns the path to the lock file.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.path.join(LOCK_FILE)
    }

    /// Checks whether the blob root holds nothing yet.
    #[must_use]
    pub fn is_new_datastore(&self) -> bool {
        fs::read_dir(self.data_path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("new_store");

        let dir = DatastoreDir::open(&path, true, false).unwrap();
        assert!(path.is_dir());
        assert!(dir.data_path().is_dir());
        assert!(dir.lock_path().is_file());
        assert!(dir.is_new_datastore());
    }

    #[test]
    fn open_fails_if_not_exists_and_no_create() {
        let temp = tempdir().unwrap();
        let result = DatastoreDir::open(&temp.path().join("nonexistent"), false, false);
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn lock_prevents_second_writer() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("locked");

        let _dir1 = DatastoreDir::open(&path, true, false).unwrap();
        let result = DatastoreDir::open(&path, true, false);
        assert!(matches!(result, Err(CoreError::DatastoreLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("reopen");

        {
            let _dir = DatastoreDir::open(&path, true, false).unwrap();
        }
        let _dir2 = DatastoreDir::open(&path, true, false).unwrap();
    }

    #[test]
    fn readers_share_but_exclude_writer() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("shared");
        drop(DatastoreDir::open(&path, true, false).unwrap());

        let _reader1 = DatastoreDir::open(&path, false, true).unwrap();
        let _reader2 = DatastoreDir::open(&path, false, true).unwrap();
        assert!(matches!(
            DatastoreDir::open(&path, true, false),
            Err(CoreError::DatastoreLocked)
        ));
    }

    #[test]
    fn read_only_never_creates() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("absent");
        assert!(DatastoreDir::open(&path, true, true).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn file_path_is_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("plain");
        fs::write(&path, b"x").unwrap();
        assert!(matches!(
            DatastoreDir::open(&path, true, false),
            Err(CoreError::InvalidIdentity { .. })
        ));
    }
}
