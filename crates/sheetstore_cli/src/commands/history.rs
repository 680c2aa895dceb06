//! History command implementation.

use super::open_read_only;
use crate::error::CliError;
use sheetstore_core::Datastore;
use std::path::Path;

/// Prints a user's history, oldest first.
pub fn run(path: &Path, user: &str, limit: Option<usize>) -> Result<(), CliError> {
    let store = open_read_only(path)?;
    let history = store.load_user_history(user)?;
    store.close()?;

    let history = match limit {
        Some(limit) => history.newest(limit),
        None => history,
    };
    if history.is_empty() {
        println!("No history for {user}");
    }
    for entry in history.entries() {
        println!("{entry}");
    }
    Ok(())
}
