//! In-memory blob backend for testing.

use crate::backend::BlobStore;
use crate::error::{StorageError, StorageResult};
use crate::key::BlobKey;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory blob backend.
///
/// This backend stores all blobs in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral datastores that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use sheetstore_storage::{BlobKey, BlobStore, InMemoryBlobStore};
///
/// let store = InMemoryBlobStore::new();
/// let key = BlobKey::parse("users").unwrap();
/// store.put(&key, b"test data").unwrap();
/// assert_eq!(store.get(&key).unwrap().unwrap(), b"test data");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<BTreeMap<BlobKey, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of blobs currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns `true` if no blobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Returns the total number of stored bytes.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.blobs.read().values().map(Vec::len).sum()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get(&self, key: &BlobKey) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(key).cloned())
    }

    fn put(&self, key: &BlobKey, data: &[u8]) -> StorageResult<()> {
        if key.is_root() {
            return Err(StorageError::InvalidKey {
                segment: String::new(),
                reason: "cannot store a blob at the root key",
            });
        }
        self.blobs.write().insert(key.clone(), data.to_vec());
        Ok(())
    }

    fn contains(&self, key: &BlobKey) -> StorageResult<bool> {
        Ok(self.blobs.read().contains_key(key))
    }

    fn list(&self, prefix: &BlobKey) -> StorageResult<Vec<BlobKey>> {
        // Keys sort parent-first, so everything under `prefix` is one
        // contiguous run starting at `prefix` itself.
        let blobs = self.blobs.read();
        Ok(blobs
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| !key.is_root())
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn clear(&self) -> StorageResult<()> {
        self.blobs.write().clear();
        Ok(())
    }

    fn sync(&self) -> StorageResult<()> {
        // Nothing to make durable
        Ok(())
    }
}
