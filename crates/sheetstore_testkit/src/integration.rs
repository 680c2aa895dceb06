//! Cross-crate integration test helpers.
//!
//! Provides a harness that mirrors every write in memory so tests can
//! check the datastore against what they expect it to hold.

use sheetstore_core::{
    CoreError, Datastore, Depth, SaveMode, SheetStore, Worksheet, WorksheetBody, WorksheetIdent,
};
use sheetstore_storage::BlobStore;
use std::collections::BTreeMap;

/// A test harness for integration testing.
pub struct IntegrationHarness {
    /// The datastore instance.
    pub store: SheetStore,
    /// Worksheet tracking for verification.
    expected: BTreeMap<WorksheetIdent, (String, WorksheetBody)>,
}

impl IntegrationHarness {
    /// Creates a new integration harness with an in-memory datastore.
    pub fn new() -> Self {
        Self::with_store(SheetStore::open_in_memory().expect("Failed to open datastore"))
    }

    /// Creates a harness over an arbitrary blob backend.
    pub fn with_backend(backend: Box<dyn BlobStore>) -> Self {
        Self::with_store(
            SheetStore::open_with_backend(sheetstore_core::Config::default(), backend)
                .expect("Failed to open datastore"),
        )
    }

    /// Creates a harness over an already opened datastore.
    pub fn with_store(store: SheetStore) -> Self {
        Self {
            store,
            expected: BTreeMap::new(),
        }
    }

    /// Swaps in another handle, keeping the tracked state, and returns the
    /// previous one. Used to check a file datastore after reopening it.
    pub fn replace_store(&mut self, store: SheetStore) -> SheetStore {
        std::mem::replace(&mut self.store, store)
    }

    /// Creates a worksheet, fills it and tracks it for later verification.
    pub fn create(&mut self, ident: &WorksheetIdent, title: &str, body: WorksheetBody) {
        let mut ws = self
            .store
            .create_worksheet(ident)
            .expect("Failed to create worksheet");
        ws.set_title(title);
        ws.body = body.clone();
        self.store
            .save_worksheet(&ws, SaveMode::Full)
            .expect("Failed to save worksheet");
        self.expected
            .insert(ident.clone(), (title.to_string(), body));
    }

    /// Retitles a worksheet with a config-only save.
    pub fn retitle(&mut self, ident: &WorksheetIdent, title: &str) {
        let mut ws = self.load(ident);
        ws.set_title(title);
        self.store
            .save_worksheet(&ws, SaveMode::ConfigOnly)
            .expect("Failed to save worksheet configuration");
        if let Some(entry) = self.expected.get_mut(ident) {
            entry.0 = title.to_string();
        }
    }

    /// Loads a worksheet, panicking if it is missing.
    pub fn load(&self, ident: &WorksheetIdent) -> Worksheet {
        self.store
            .load_worksheet(ident)
            .expect("Failed to load worksheet")
    }

    /// Loads a worksheet and verifies it matches the tracked state.
    pub fn load_and_verify(&self, ident: &WorksheetIdent) -> Option<Worksheet> {
        match self.store.load_worksheet(ident) {
            Ok(ws) => {
                let (title, body) = self
                    .expected
                    .get(ident)
                    .unwrap_or_else(|| panic!("Untracked worksheet {ident} exists"));
                assert_eq!(ws.title(), title, "Title mismatch for {ident}");
                assert_eq!(&ws.body, body, "Body mismatch for {ident}");
                Some(ws)
            }
            Err(CoreError::NotFound { .. }) => {
                assert!(
                    !self.expected.contains_key(ident),
                    "Tracked worksheet {ident} is missing"
                );
                None
            }
            Err(e) => panic!("Failed to load {ident}: {e}"),
        }
    }

    /// Verifies every tracked worksheet, and that listings agree with them.
    pub fn verify_all(&self) {
        for ident in self.expected.keys() {
            assert!(self.load_and_verify(ident).is_some());
        }

        let mut owners: Vec<&str> = self.expected.keys().map(|i| i.owner().as_str()).collect();
        owners.dedup();
        for owner in owners {
            let listed: Vec<WorksheetIdent> = self
                .store
                .worksheets(owner, None, Depth::Recursive)
                .expect("Failed to list worksheets")
                .iter()
                .map(|ws| ws.ident().clone())
                .collect();
            let tracked: Vec<WorksheetIdent> = self
                .expected
                .keys()
                .filter(|i| i.owner().as_str() == owner)
                .cloned()
                .collect();
            assert_eq!(listed, tracked, "Listing mismatch for {owner}");
        }
    }

    /// Returns the number of tracked worksheets.
    pub fn tracked_count(&self) -> usize {
        self.expected.len()
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}
