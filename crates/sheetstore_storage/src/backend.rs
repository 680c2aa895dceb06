//! Blob backend trait definition.

use crate::error::StorageResult;
use crate::key::BlobKey;
use std::fmt::Debug;

/// A low-level keyed blob store for SheetStore.
///
/// Backends are **opaque byte stores**. They know nothing about worksheets,
/// users or record formats - SheetStore owns all interpretation of the bytes.
///
/// # Invariants
///
/// - `put` replaces the whole blob atomically: a concurrent `get` observes
///   either the previous bytes or the new bytes, never a mixture
/// - `get` of a key that was never written returns `Ok(None)`
/// - `list` returns every key under the prefix, recursively, in sorted order
/// - A failed `put` leaves the previous value (or absence) observable
/// - Backends must be `Send + Sync`; all methods take `&self` and lock
///   internally
///
/// # Implementors
///
/// - [`super::InMemoryBlobStore`] - For testing
/// - [`super::FileBlobStore`] - For persistent storage
pub trait BlobStore: Send + Sync + Debug {
    /// Returns the bytes stored under `key`, or `None` if there are none.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn get(&self, key: &BlobKey) -> StorageResult<Option<Vec<u8>>>;

    /// Atomically stores `data` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. The previous blob remains
    /// readable in that case.
    fn put(&self, key: &BlobKey, data: &[u8]) -> StorageResult<()>;

    /// Returns `true` if a blob is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be queried.
    fn contains(&self, key: &BlobKey) -> StorageResult<bool>;

    /// Lists every blob key under `prefix`, recursively, sorted.
    ///
    /// A prefix with nothing under it yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be enumerated.
    fn list(&self, prefix: &BlobKey) -> StorageResult<Vec<BlobKey>>;

    /// Removes every blob in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn clear(&self) -> StorageResult<()>;

    /// Makes all completed writes durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&self) -> StorageResult<()>;
}
