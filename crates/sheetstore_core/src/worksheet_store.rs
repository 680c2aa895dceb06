//! Worksheet create, load, save and listing.
//!
//! A worksheet occupies a directory with two blobs, `body` and `conf`.
//! `conf` is the commit marker: the worksheet exists exactly when its
//! `conf` blob does. Creation writes `body` first, so a crash part way
//! through leaves only an orphaned body that no reader can see and that a
//! retried create overwrites.

use crate::error::{CoreError, CoreResult};
use crate::identity::{Namespace, Subpath, Username, WorksheetIdent};
use crate::locks::LockTable;
use crate::records::{read_record, write_record};
use crate::worksheet::{Worksheet, WorksheetBody, WorksheetConfig};
use sheetstore_codec::RecordKind;
use sheetstore_storage::BlobStore;
use tracing::{debug, warn};

/// What `save_worksheet` rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SaveMode {
    /// Body and configuration.
    #[default]
    Full,
    /// Configuration only; the stored body is left as is.
    ConfigOnly,
}

/// How far `worksheets` descends below the requested subpath.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Depth {
    /// Every worksheet at or below the subpath.
    #[default]
    Recursive,
    /// Only worksheets directly in the subpath.
    Shallow,
}

pub(crate) struct WorksheetStore<'a> {
    blobs: &'a dyn BlobStore,
    locks: &'a LockTable,
}

impl<'a> WorksheetStore<'a> {
    pub(crate) fn new(blobs: &'a dyn BlobStore, locks: &'a LockTable) -> Self {
        Self { blobs, locks }
    }

    /// Persists an empty shell at `ident`.
    pub(crate) fn create(&self, ident: &WorksheetIdent) -> CoreResult<Worksheet> {
        let worksheet = Worksheet::new(ident.clone());
        self.insert(&worksheet)?;
        debug!(worksheet = %ident, "worksheet created");
        Ok(worksheet)
    }

    /// Persists `worksheet` at its identity, failing if that is occupied.
    pub(crate) fn insert(&self, worksheet: &Worksheet) -> CoreResult<()> {
        let ident = worksheet.ident();
        let lock = self.locks.lock_for(&Namespace::worksheet(ident)?);
        let _guard = lock.write();

        let conf_key = Namespace::worksheet_conf(ident)?;
        if self.blobs.contains(&conf_key)? {
            return Err(CoreError::already_exists(format!("worksheet {ident}")));
        }
        write_record(
            self.blobs,
            RecordKind::WorksheetBody,
            &Namespace::worksheet_body(ident)?,
            &worksheet.body,
        )?;
        write_record(self.blobs, RecordKind::WorksheetConfig, &conf_key, &worksheet.config)
    }

    pub(crate) fn load(&self, ident: &WorksheetIdent) -> CoreResult<Worksheet> {
        let lock = self.locks.lock_for(&Namespace::worksheet(ident)?);
        let _guard = lock.read();
        self.load_unlocked(ident)
    }

    fn load_unlocked(&self, ident: &WorksheetIdent) -> CoreResult<Worksheet> {
        let config: WorksheetConfig = read_record(
            self.blobs,
            RecordKind::WorksheetConfig,
            &Namespace::worksheet_conf(ident)?,
        )?
        .ok_or_else(|| CoreError::not_found(format!("worksheet {ident}")))?;

        let body_key = Namespace::worksheet_body(ident)?;
        let body: WorksheetBody =
            match read_record(self.blobs, RecordKind::WorksheetBody, &body_key)? {
                Some(body) => body,
                None => {
                    warn!(worksheet = %ident, "worksheet has no body, loading it empty");
                    WorksheetBody::default()
                }
            };

        Ok(Worksheet::from_parts(ident.clone(), config, body))
    }

    pub(crate) fn save(&self, worksheet: &Worksheet, mode: SaveMode) -> CoreResult<()> {
        let ident = worksheet.ident();
        let lock = self.locks.lock_for(&Namespace::worksheet(ident)?);
        let _guard = lock.write();

        let conf_key = Namespace::worksheet_conf(ident)?;
        if !self.blobs.contains(&conf_key)? {
            return Err(CoreError::not_found(format!("worksheet {ident}")));
        }
        if mode == SaveMode::Full {
            write_record(
                self.blobs,
                RecordKind::WorksheetBody,
                &Namespace::worksheet_body(ident)?,
                &worksheet.body,
            )?;
        }
        write_record(self.blobs, RecordKind::WorksheetConfig, &conf_key, &worksheet.config)?;
        debug!(worksheet = %ident, ?mode, "worksheet saved");
        Ok(())
    }

    /// Lists the worksheets of `owner` under `subpath`, ordered by subpath
    /// and then by numeric id.
    ///
    /// Worksheets that vanish or fail to decode while listing are skipped.
    pub(crate) fn list(
        &self,
        owner: &Username,
        subpath: &Subpath,
        depth: Depth,
    ) -> CoreResult<Vec<Worksheet>> {
        let prefix = Namespace::sheets(owner, subpath)?;
        let mut worksheets = Vec::new();
        for key in self.blobs.list(&prefix)? {
            let Some(ident) = Namespace::parse_worksheet_conf(&key) else {
                continue;
            };
            if depth == Depth::Shallow && ident.subpath() != subpath {
                continue;
            }
            match self.load(&ident) {
                Ok(worksheet) => worksheets.push(worksheet),
                Err(CoreError::NotFound { .. }) => {}
                Err(e @ CoreError::CorruptRecord { .. }) => {
                    warn!(worksheet = %ident, error = %e, "skipping unreadable worksheet");
                }
                Err(e) => return Err(e),
            }
        }
        worksheets.sort_by(|a, b| a.ident().cmp(b.ident()));
        Ok(worksheets)
    }
}
