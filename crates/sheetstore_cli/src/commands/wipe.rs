//! Wipe command implementation.

use super::open_writable;
use crate::error::CliError;
use sheetstore_core::Datastore;
use std::path::Path;
use tracing::warn;

/// Deletes all data in the datastore. Requires explicit confirmation.
pub fn run(path: &Path, confirmed: bool) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::NotConfirmed("wipe the datastore"));
    }

    warn!("Wiping datastore at {:?}", path);
    let store = open_writable(path)?;
    store.delete()?;
    store.close()?;

    println!("✓ Datastore wiped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetstore_core::{Depth, SheetStore, WorksheetIdent};
    use tempfile::tempdir;

    #[test]
    fn refuses_without_confirmation() {
        let temp = tempdir().unwrap();
        let store_path = temp.path().join("store");
        {
            let store = SheetStore::open(&store_path).unwrap();
            store
                .create_worksheet(&WorksheetIdent::new("alice", 0).unwrap())
                .unwrap();
        }

        assert!(matches!(
            run(&store_path, false),
            Err(CliError::NotConfirmed(_))
        ));
        let store = SheetStore::open(&store_path).unwrap();
        assert_eq!(store.worksheets("alice", None, Depth::Recursive).unwrap().len(), 1);
        drop(store);

        run(&store_path, true).unwrap();
        let store = SheetStore::open(&store_path).unwrap();
        assert!(store.worksheets("alice", None, Depth::Recursive).unwrap().is_empty());
    }
}
