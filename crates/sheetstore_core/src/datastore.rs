//! The datastore contract and its facade.

use crate::archive::{encode_archive, read_archive, ArchiveManifest, ArchiveSummary};
use crate::config::Config;
#[cfg(feature = "std")]
use crate::dir::DatastoreDir;
use crate::error::{CoreError, CoreResult};
use crate::identity::{Namespace, Subpath, Username, WorksheetIdent};
use crate::locks::LockTable;
use crate::model::{HistoryLog, OpenIdAssociations, ServerConfig, UserDirectory};
use crate::records::RecordStore;
use crate::worksheet::{now_ms, Worksheet};
use crate::worksheet_store::{Depth, SaveMode, WorksheetStore};
#[cfg(feature = "std")]
use parking_lot::Mutex;
use parking_lot::{RwLock, RwLockReadGuard};
use sheetstore_codec::RecordKind;
use sheetstore_storage::{atomic_write, BlobStore, InMemoryBlobStore};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage contract for users, history and worksheets.
///
/// Every backend implements every operation. An operation a backend
/// genuinely cannot perform fails with [`CoreError::Unsupported`].
pub trait Datastore: Send + Sync {
    /// Loads the server configuration, or an empty one if never saved.
    fn load_server_conf(&self) -> CoreResult<ServerConfig>;

    /// Replaces the server configuration.
    fn save_server_conf(&self, conf: &ServerConfig) -> CoreResult<()>;

    /// Loads the OpenID associations, or an empty mapping if never saved.
    fn load_openid(&self) -> CoreResult<OpenIdAssociations>;

    /// Replaces the OpenID associations.
    fn save_openid(&self, associations: &OpenIdAssociations) -> CoreResult<()>;

    /// Loads the user directory, or an empty one if never saved.
    fn load_users(&self) -> CoreResult<UserDirectory>;

    /// Replaces the user directory.
    fn save_users(&self, users: &UserDirectory) -> CoreResult<()>;

    /// Loads a user's history. Users without history get an empty log.
    fn load_user_history(&self, username: &str) -> CoreResult<HistoryLog>;

    /// Replaces a user's history.
    fn save_user_history(&self, username: &str, history: &HistoryLog) -> CoreResult<()>;

    /// Creates and persists an empty worksheet.
    ///
    /// Fails with [`CoreError::AlreadyExists`] if `ident` is occupied.
    fn create_worksheet(&self, ident: &WorksheetIdent) -> CoreResult<Worksheet>;

    /// Loads a worksheet. Fails with [`CoreError::NotFound`] if absent.
    fn load_worksheet(&self, ident: &WorksheetIdent) -> CoreResult<Worksheet>;

    /// Saves an existing worksheet. With [`SaveMode::ConfigOnly`] the
    /// stored body is not rewritten.
    fn save_worksheet(&self, worksheet: &Worksheet, mode: SaveMode) -> CoreResult<()>;

    /// Writes a worksheet to a self-contained archive at `filename`.
    ///
    /// A `title` replaces the worksheet's title in the archive only.
    fn export_worksheet(
        &self,
        ident: &WorksheetIdent,
        filename: &Path,
        title: Option<&str>,
    ) -> CoreResult<ArchiveSummary>;

    /// Materializes the archive at `filename` as a new worksheet at `ident`.
    fn import_worksheet(&self, ident: &WorksheetIdent, filename: &Path) -> CoreResult<Worksheet>;

    /// Lists a user's worksheets under `subpath` (the root if `None`).
    /// A user with no worksheets gets an empty list.
    fn worksheets(
        &self,
        username: &str,
        subpath: Option<&Subpath>,
        depth: Depth,
    ) -> CoreResult<Vec<Worksheet>>;

    /// Irreversibly removes all data. The datastore stays open and empty.
    fn delete(&self) -> CoreResult<()>;

    /// Makes every completed write durable.
    fn flush(&self) -> CoreResult<()>;

    /// Flushes and closes the datastore. Later operations fail with
    /// [`CoreError::DatastoreClosed`]. Closing twice is a no-op.
    fn close(&self) -> CoreResult<()>;
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
    Backend,
}

/// The datastore handle.
///
/// `SheetStore` composes the blob backend, the per-location lock table and
/// the record, worksheet and archive layers behind the [`Datastore`]
/// trait.
///
/// # Opening a Datastore
///
/// ```rust,ignore
/// use sheetstore_core::{Datastore, SheetStore, WorksheetIdent};
/// use std::path::Path;
///
/// let store = SheetStore::open(Path::new("notebooks"))?;
/// let ws = store.create_worksheet(&WorksheetIdent::new("alice", 0)?)?;
/// store.close()?;
/// ```
///
/// # In-Memory Datastores
///
/// For tests, use `SheetStore::open_in_memory()`.
///
/// # Concurrency
///
/// Every operation holds the datastore gate shared; `delete` and `close`
/// hold it exclusively. Below the gate each worksheet, history log and
/// singleton record has its own lock, so writers to different locations
/// never wait on each other.
#[derive(Debug)]
pub struct SheetStore {
    config: Config,
    /// Directory lock holder, dropped on close. None without a directory.
    #[cfg(feature = "std")]
    dir: Mutex<Option<DatastoreDir>>,
    blobs: Box<dyn BlobStore>,
    locks: LockTable,
    location: Location,
    /// Whether the datastore is open.
    is_open: RwLock<bool>,
}

impl SheetStore {
    /// Opens or creates a file-backed datastore with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatastoreLocked`] if another process has it
    /// open for writing.
    #[cfg(feature = "std")]
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens or creates a file-backed datastore.
    ///
    /// ```rust,ignore
    /// let config = Config::default().read_only(true);
    /// let store = SheetStore::open_with_config(Path::new("notebooks"), config)?;
    /// ```
    #[cfg(feature = "std")]
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        use sheetstore_storage::FileBlobStore;

        let dir = DatastoreDir::open(path, config.create_if_missing, config.read_only)?;
        let blobs = FileBlobStore::open(&dir.data_path(), config.sync_on_write)?;
        info!(
            path = %path.display(),
            read_only = config.read_only,
            new = dir.is_new_datastore(),
            "datastore opened"
        );

        Ok(Self {
            config,
            dir: Mutex::new(Some(dir)),
            blobs: Box::new(blobs),
            locks: LockTable::new(),
            location: Location::File(path.to_path_buf()),
            is_open: RwLock::new(true),
        })
    }

    /// Opens an empty datastore that lives only in memory.
    pub fn open_in_memory() -> CoreResult<Self> {
        let mut store = Self::open_with_backend(Config::default(), Box::new(InMemoryBlobStore::new()))?;
        store.location = Location::Memory;
        Ok(store)
    }

    /// Opens a datastore over any blob backend.
    pub fn open_with_backend(config: Config, blobs: Box<dyn BlobStore>) -> CoreResult<Self> {
        debug!(read_only = config.read_only, "datastore opened over blob backend");
        Ok(Self {
            config,
            #[cfg(feature = "std")]
            dir: Mutex::new(None),
            blobs,
            locks: LockTable::new(),
            location: Location::Backend,
            is_open: RwLock::new(true),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the directory of a file-backed datastore.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory | Location::Backend => None,
        }
    }

    /// Checks if the datastore is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    /// Takes the gate shared, failing if the datastore is closed.
    fn enter(&self) -> CoreResult<RwLockReadGuard<'_, bool>> {
        let gate = self.is_open.read();
        if *gate {
            Ok(gate)
        } else {
            Err(CoreError::DatastoreClosed)
        }
    }

    fn ensure_writable(&self, operation: &'static str) -> CoreResult<()> {
        if self.config.read_only {
            Err(CoreError::unsupported(operation, "datastore is opened read-only"))
        } else {
            Ok(())
        }
    }

    fn records(&self) -> RecordStore<'_> {
        RecordStore::new(self.blobs.as_ref(), &self.locks)
    }

    fn sheets(&self) -> WorksheetStore<'_> {
        WorksheetStore::new(self.blobs.as_ref(), &self.locks)
    }

    fn with_archive_path(err: CoreError, path: &Path) -> CoreError {
        match err {
            CoreError::CorruptArchive { path: None, message } => CoreError::CorruptArchive {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        }
    }
}

impl Datastore for SheetStore {
    fn load_server_conf(&self) -> CoreResult<ServerConfig> {
        let _gate = self.enter()?;
        self.records().load(RecordKind::ServerConfig, &Namespace::server_conf()?)
    }

    fn save_server_conf(&self, conf: &ServerConfig) -> CoreResult<()> {
        self.ensure_writable("save_server_conf")?;
        let _gate = self.enter()?;
        self.records().save(RecordKind::ServerConfig, &Namespace::server_conf()?, conf)
    }

    fn load_openid(&self) -> CoreResult<OpenIdAssociations> {
        let _gate = self.enter()?;
        self.records().load(RecordKind::OpenId, &Namespace::openid()?)
    }

    fn save_openid(&self, associations: &OpenIdAssociations) -> CoreResult<()> {
        self.ensure_writable("save_openid")?;
        let _gate = self.enter()?;
        self.records().save(RecordKind::OpenId, &Namespace::openid()?, associations)
    }

    fn load_users(&self) -> CoreResult<UserDirectory> {
        let _gate = self.enter()?;
        self.records().load(RecordKind::Users, &Namespace::users()?)
    }

    fn save_users(&self, users: &UserDirectory) -> CoreResult<()> {
        self.ensure_writable("save_users")?;
        let _gate = self.enter()?;
        self.records().save(RecordKind::Users, &Namespace::users()?, users)?;
        debug!(count = users.len(), "user directory saved");
        Ok(())
    }

    fn load_user_history(&self, username: &str) -> CoreResult<HistoryLog> {
        let owner = Username::new(username)?;
        let _gate = self.enter()?;
        self.records().load(RecordKind::History, &Namespace::history(&owner)?)
    }

    fn save_user_history(&self, username: &str, history: &HistoryLog) -> CoreResult<()> {
        self.ensure_writable("save_user_history")?;
        let owner = Username::new(username)?;
        let _gate = self.enter()?;
        let key = Namespace::history(&owner)?;
        match self.config.history_limit {
            Some(limit) if history.len() > limit => {
                self.records()
                    .save(RecordKind::History, &key, &history.newest(limit))
            }
            _ => self.records().save(RecordKind::History, &key, history),
        }
    }

    fn create_worksheet(&self, ident: &WorksheetIdent) -> CoreResult<Worksheet> {
        self.ensure_writable("create_worksheet")?;
        let _gate = self.enter()?;
        self.sheets().create(ident)
    }

    fn load_worksheet(&self, ident: &WorksheetIdent) -> CoreResult<Worksheet> {
        let _gate = self.enter()?;
        self.sheets().load(ident)
    }

    fn save_worksheet(&self, worksheet: &Worksheet, mode: SaveMode) -> CoreResult<()> {
        self.ensure_writable("save_worksheet")?;
        let _gate = self.enter()?;
        self.sheets().save(worksheet, mode)
    }

    fn export_worksheet(
        &self,
        ident: &WorksheetIdent,
        filename: &Path,
        title: Option<&str>,
    ) -> CoreResult<ArchiveSummary> {
        let _gate = self.enter()?;
        let (source, mut config, body) = self.sheets().load(ident)?.into_parts();
        if let Some(title) = title {
            config.title = title.to_string();
        }

        let manifest = ArchiveManifest {
            source,
            title: config.title.clone(),
            exported_at_ms: now_ms(),
            cell_count: body.cells.len() as u64,
        };
        let data = encode_archive(&manifest, &config, &body)?;
        atomic_write(filename, &data)?;

        info!(worksheet = %ident, path = %filename.display(), bytes = data.len(), "worksheet exported");
        Ok(ArchiveSummary {
            path: filename.to_path_buf(),
            manifest,
            size: data.len(),
        })
    }

    fn import_worksheet(&self, ident: &WorksheetIdent, filename: &Path) -> CoreResult<Worksheet> {
        self.ensure_writable("import_worksheet")?;
        let _gate = self.enter()?;

        let size = fs::metadata(filename)?.len();
        if size > self.config.max_archive_size {
            return Err(CoreError::unsupported(
                "import_worksheet",
                format!(
                    "archive is {size} bytes, limit is {}",
                    self.config.max_archive_size
                ),
            ));
        }
        let data = fs::read(filename)?;
        let archive = read_archive(&data).map_err(|e| Self::with_archive_path(e, filename))?;

        let worksheet = Worksheet::from_parts(ident.clone(), archive.config, archive.body);
        self.sheets().insert(&worksheet)?;

        info!(
            worksheet = %ident,
            source = %archive.manifest.source,
            path = %filename.display(),
            "worksheet imported"
        );
        Ok(worksheet)
    }

    fn worksheets(
        &self,
        username: &str,
        subpath: Option<&Subpath>,
        depth: Depth,
    ) -> CoreResult<Vec<Worksheet>> {
        let owner = Username::new(username)?;
        let root = Subpath::root();
        let _gate = self.enter()?;
        self.sheets().list(&owner, subpath.unwrap_or(&root), depth)
    }

    fn delete(&self) -> CoreResult<()> {
        self.ensure_writable("delete")?;
        let gate = self.is_open.write();
        if !*gate {
            return Err(CoreError::DatastoreClosed);
        }
        self.blobs.clear()?;
        self.locks.prune();
        info!(datastore = %self, "datastore deleted");
        Ok(())
    }

    fn flush(&self) -> CoreResult<()> {
        let _gate = self.enter()?;
        self.blobs.sync()?;
        Ok(())
    }

    fn close(&self) -> CoreResult<()> {
        let mut is_open = self.is_open.write();
        if !*is_open {
            return Ok(());
        }

        if !self.config.read_only {
            self.blobs.sync()?;
        }
        *is_open = false;

        // Release the directory lock so the datastore can be reopened.
        #[cfg(feature = "std")]
        self.dir.lock().take();

        info!(datastore = %self, "datastore closed");
        Ok(())
    }
}

impl fmt::Display for SheetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Location::File(path) => write!(f, "file datastore at {}", path.display()),
            Location::Memory => f.write_str("in-memory datastore"),
            Location::Backend => f.write_str("custom-backend datastore"),
        }
    }
}
