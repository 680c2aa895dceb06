//! CLI command implementations.

pub mod archive;
pub mod history;
pub mod inspect;
pub mod list;
pub mod users;
pub mod wipe;

use crate::error::CliError;
use sheetstore_core::{Config, CoreResult, SheetStore, Subpath, WorksheetIdent};
use std::path::Path;

/// Opens an existing datastore for reading only, so it can be inspected
/// next to other readers.
pub(crate) fn open_read_only(path: &Path) -> CoreResult<SheetStore> {
    SheetStore::open_with_config(
        path,
        Config::default().create_if_missing(false).read_only(true),
    )
}

/// Opens an existing datastore for writing.
pub(crate) fn open_writable(path: &Path) -> CoreResult<SheetStore> {
    SheetStore::open_with_config(path, Config::default().create_if_missing(false))
}

/// Builds a worksheet identity from command-line arguments.
pub(crate) fn parse_ident(
    user: &str,
    id: u64,
    subpath: Option<&str>,
) -> Result<WorksheetIdent, CliError> {
    let ident = WorksheetIdent::new(user, id)?;
    Ok(match subpath {
        Some(subpath) => ident.with_subpath(Subpath::parse(subpath)?),
        None => ident,
    })
}

/// Formats a Unix millisecond timestamp as seconds since the epoch.
pub(crate) fn format_timestamp(ms: u64) -> String {
    format!("{}.{:03}s since epoch", ms / 1000, ms % 1000)
}
