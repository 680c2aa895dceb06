//! List command implementation.

use super::{format_timestamp, open_read_only};
use crate::error::CliError;
use crate::Format;
use serde::Serialize;
use sheetstore_core::{Datastore, Depth, Subpath, Worksheet};
use std::path::Path;

/// One listed worksheet.
#[derive(Debug, Serialize)]
pub struct WorksheetEntry {
    /// Numeric id.
    pub id: u64,
    /// Subpath, empty for the root.
    pub subpath: String,
    /// Title.
    pub title: String,
    /// Number of cells.
    pub cells: usize,
    /// Last editor.
    pub last_change_by: String,
    /// Last edit time, Unix milliseconds.
    pub last_change_ms: u64,
}

impl From<&Worksheet> for WorksheetEntry {
    fn from(ws: &Worksheet) -> Self {
        Self {
            id: ws.id(),
            subpath: ws.ident().subpath().to_string(),
            title: ws.title().to_string(),
            cells: ws.body.cells.len(),
            last_change_by: ws.config.last_change.user.to_string(),
            last_change_ms: ws.config.last_change.timestamp_ms,
        }
    }
}

/// Runs the list command.
pub fn run(
    path: &Path,
    user: &str,
    subpath: Option<&str>,
    shallow: bool,
    format: Format,
) -> Result<(), CliError> {
    let subpath = subpath.map(Subpath::parse).transpose()?;
    let depth = if shallow {
        Depth::Shallow
    } else {
        Depth::Recursive
    };

    let store = open_read_only(path)?;
    let entries: Vec<WorksheetEntry> = store
        .worksheets(user, subpath.as_ref(), depth)?
        .iter()
        .map(WorksheetEntry::from)
        .collect();
    store.close()?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        Format::Text => {
            if entries.is_empty() {
                println!("No worksheets for {user}");
            }
            for entry in &entries {
                let location = if entry.subpath.is_empty() {
                    entry.id.to_string()
                } else {
                    format!("{}/{}", entry.subpath, entry.id)
                };
                println!(
                    "{location:<20} {:<32} {:>4} cells  by {} at {}",
                    entry.title,
                    entry.cells,
                    entry.last_change_by,
                    format_timestamp(entry.last_change_ms)
                );
            }
        }
    }
    Ok(())
}
