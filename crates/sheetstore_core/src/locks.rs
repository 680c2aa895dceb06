//! Per-location lock table.
//!
//! Every worksheet, history log and singleton record gets its own
//! reader-writer lock, created on first use. Operations on different keys
//! never contend; operations on one key are serialized against writers.

use parking_lot::{Mutex, RwLock};
use sheetstore_storage::BlobKey;
use std::collections::HashMap;
use std::sync::Arc;

/// Table size above which idle entries are pruned on the next lookup.
const PRUNE_THRESHOLD: usize = 1024;

/// Hands out one shared lock per blob key.
#[derive(Debug, Default)]
pub(crate) struct LockTable {
    locks: Mutex<HashMap<BlobKey, Arc<RwLock<()>>>>,
}

impl LockTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `key`, creating it if needed.
    ///
    /// The caller locks the returned handle for as long as it touches the
    /// key's blobs.
    pub(crate) fn lock_for(&self, key: &BlobKey) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock();
        if locks.len() >= PRUNE_THRESHOLD {
            // An entry only the table references is idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Number of tracked keys.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Drops every idle entry.
    pub(crate) fn prune(&self) {
        self.locks
            .lock()
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
