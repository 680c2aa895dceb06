//! Whole-record load and save.
//!
//! A record lives in a single blob, so the backend's atomic `put` already
//! guarantees a concurrent reader sees either the old or the new bytes.
//! The per-key lock additionally orders concurrent saves.

use crate::error::{CoreError, CoreResult};
use crate::locks::LockTable;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sheetstore_codec::{decode_record, encode_record, RecordKind};
use sheetstore_storage::{BlobKey, BlobStore};
use tracing::debug;

/// Reads and decodes the record at `key`, or `None` if it was never saved.
pub(crate) fn read_record<T: DeserializeOwned>(
    blobs: &dyn BlobStore,
    kind: RecordKind,
    key: &BlobKey,
) -> CoreResult<Option<T>> {
    let Some(bytes) = blobs.get(key)? else {
        return Ok(None);
    };
    decode_record(kind, &bytes)
        .map(Some)
        .map_err(|source| CoreError::CorruptRecord {
            key: key.to_string(),
            source,
        })
}

/// Encodes `value` and replaces the blob at `key`.
pub(crate) fn write_record<T: Serialize + ?Sized>(
    blobs: &dyn BlobStore,
    kind: RecordKind,
    key: &BlobKey,
    value: &T,
) -> CoreResult<()> {
    let bytes = encode_record(kind, value).map_err(|source| CoreError::EncodeRecord {
        key: key.to_string(),
        source,
    })?;
    blobs.put(key, &bytes)?;
    debug!(%key, kind = kind.name(), bytes = bytes.len(), "record written");
    Ok(())
}

/// Load/save access to the singleton and per-user records.
pub(crate) struct RecordStore<'a> {
    blobs: &'a dyn BlobStore,
    locks: &'a LockTable,
}

impl<'a> RecordStore<'a> {
    pub(crate) fn new(blobs: &'a dyn BlobStore, locks: &'a LockTable) -> Self {
        Self { blobs, locks }
    }

    /// Loads a record, returning its default if it was never saved.
    pub(crate) fn load<T: DeserializeOwned + Default>(
        &self,
        kind: RecordKind,
        key: &BlobKey,
    ) -> CoreResult<T> {
        let lock = self.locks.lock_for(key);
        let _guard = lock.read();
        Ok(read_record(self.blobs, kind, key)?.unwrap_or_default())
    }

    /// Replaces a record wholesale.
    pub(crate) fn save<T: Serialize + ?Sized>(
        &self,
        kind: RecordKind,
        key: &BlobKey,
        value: &T,
    ) -> CoreResult<()> {
        let lock = self.locks.lock_for(key);
        let _guard = lock.write();
        write_record(self.blobs, kind, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HistoryLog, ServerConfig};
    use sheetstore_storage::InMemoryBlobStore;

    fn key(path: &str) -> BlobKey {
        BlobKey::parse(path).unwrap()
    }

    #[test]
    fn never_saved_loads_default() {
        let blobs = InMemoryBlobStore::new();
        let locks = LockTable::new();
        let records = RecordStore::new(&blobs, &locks);
        let conf: ServerConfig = records.load(RecordKind::ServerConfig, &key("server_conf")).unwrap();
        assert!(conf.is_empty());
    }

    #[test]
    fn save_replaces_wholesale() {
        let blobs = InMemoryBlobStore::new();
        let locks = LockTable::new();
        let records = RecordStore::new(&blobs, &locks);
        let k = key("home/a/history");

        let first: HistoryLog = vec!["a".to_string(), "b".to_string()].into();
        records.save(RecordKind::History, &k, &first).unwrap();
        let second: HistoryLog = vec!["c".to_string()].into();
        records.save(RecordKind::History, &k, &second).unwrap();

        let loaded: HistoryLog = records.load(RecordKind::History, &k).unwrap();
        assert_eq!(loaded, second);
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let blobs = InMemoryBlobStore::new();
        let locks = LockTable::new();
        let k = key("users");
        blobs.put(&k, b"not a record").unwrap();

        let records = RecordStore::new(&blobs, &locks);
        let err = records
            .load::<HistoryLog>(RecordKind::Users, &k)
            .unwrap_err();
        assert!(matches!(err, CoreError::CorruptRecord { ref key, .. } if key == "users"));
    }

    #[test]
    fn wrong_kind_is_reported_as_corrupt() {
        let blobs = InMemoryBlobStore::new();
        let k = key("users");
        write_record(&blobs, RecordKind::History, &k, &HistoryLog::new()).unwrap();
        let result: CoreResult<Option<HistoryLog>> = read_record(&blobs, RecordKind::Users, &k);
        assert!(matches!(result, Err(CoreError::CorruptRecord { .. })));
    }
}
