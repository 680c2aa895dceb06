//! Test fixtures and datastore helpers.
//!
//! Provides convenience functions for setting up test datastores
//! and common test scenarios.

use sheetstore_core::{Config, SheetStore, Subpath, WorksheetIdent};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test datastore with automatic cleanup.
pub struct TestDatastore {
    /// The datastore instance.
    pub store: SheetStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestDatastore {
    /// Creates a new in-memory test datastore.
    pub fn memory() -> Self {
        Self {
            store: SheetStore::open_in_memory().expect("Failed to open in-memory datastore"),
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test datastore.
    pub fn file() -> Self {
        Self::file_with_config(Config::default().sync_on_write(false))
    }

    /// Creates a file-backed test datastore with custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SheetStore::open_with_config(&temp_dir.path().join("store"), config)
            .expect("Failed to open file datastore");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the datastore path if file-backed, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("store"))
    }

    /// Returns a scratch directory for archives. File-backed datastores
    /// reuse their temporary directory; in-memory ones get a fresh one.
    pub fn scratch_dir(&mut self) -> &Path {
        self.temp_dir
            .get_or_insert_with(|| TempDir::new().expect("Failed to create temp directory"))
            .path()
    }

    /// Consumes the fixture, keeping only the temporary directory alive.
    ///
    /// Drops (and therefore unlocks) the datastore so the same directory
    /// can be reopened.
    pub fn into_dir(self) -> Option<TempDir> {
        self.temp_dir
    }
}

impl std::ops::Deref for TestDatastore {
    type Target = SheetStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory datastore.
///
/// # Example
///
/// ```rust,ignore
/// use sheetstore_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|store| {
///         assert!(store.load_users().unwrap().is_empty());
///     });
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&SheetStore) -> R,
{
    let test_store = TestDatastore::memory();
    f(&test_store.store)
}

/// Runs a test with a temporary file-backed datastore.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&SheetStore, &Path) -> R,
{
    let test_store = TestDatastore::file();
    let path = test_store.path().expect("File datastore should have a path");
    f(&test_store.store, &path)
}

/// Runs `f` once against each backend, labelled for assertion messages.
pub fn with_each_backend<F>(mut f: F)
where
    F: FnMut(&str, &mut TestDatastore),
{
    f("memory", &mut TestDatastore::memory());
    f("file", &mut TestDatastore::file());
}

/// Builds an identity in the owner's root namespace.
pub fn ident(owner: &str, id: u64) -> WorksheetIdent {
    WorksheetIdent::new(owner, id).expect("Invalid test identity")
}

/// Builds an identity under a `/`-separated subpath.
pub fn ident_in(owner: &str, id: u64, subpath: &str) -> WorksheetIdent {
    ident(owner, id).with_subpath(Subpath::parse(subpath).expect("Invalid test subpath"))
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use sheetstore_core::{
        AccountType, CellKind, Datastore, SaveMode, User, UserDirectory, Username,
    };

    /// Creates a datastore where each user owns `per_user` worksheets
    /// spread over the root and two subpaths.
    pub fn populated_datastore(users: &[&str], per_user: u64) -> TestDatastore {
        let test_store = TestDatastore::memory();
        for user in users {
            for id in 0..per_user {
                let subpath = match id % 3 {
                    0 => "",
                    1 => "projects",
                    _ => "projects/archive",
                };
                let mut ws = test_store
                    .create_worksheet(&ident_in(user, id, subpath))
                    .expect("Failed to create worksheet");
                ws.set_title(format!("{user} #{id}"));
                ws.push_cell(CellKind::Compute, format!("{id} + {id}"));
                test_store
                    .save_worksheet(&ws, SaveMode::Full)
                    .expect("Failed to save worksheet");
            }
        }
        test_store
    }

    /// A small user directory with one administrator.
    pub fn user_directory(names: &[&str]) -> UserDirectory {
        let mut users = UserDirectory::new();
        for (i, name) in names.iter().enumerate() {
            let username = Username::new(*name).expect("Invalid test username");
            let account_type = if i == 0 {
                AccountType::Admin
            } else {
                AccountType::User
            };
            users.insert(
                User::new(username, format!("sha256${name}"))
                    .with_account_type(account_type)
                    .with_email(format!("{name}@example.com")),
            );
        }
        users
    }
}
