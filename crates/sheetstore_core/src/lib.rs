//! # SheetStore Core
//!
//! Persistence layer for a multi-user worksheet server.
//!
//! This crate provides:
//! - The [`Datastore`] trait, the storage contract the rest of an
//!   application depends on
//! - [`SheetStore`], its implementation over any blob backend
//! - Whole-record load/save for server configuration, OpenID associations,
//!   the user directory and per-user history
//! - Worksheet create/load/save/listing with config-only saves and
//!   recursive subpath namespaces
//! - Self-contained worksheet archives for export and import
//!
//! ## Example
//!
//! ```rust
//! use sheetstore_core::{CellKind, Datastore, Depth, SaveMode, SheetStore, WorksheetIdent};
//!
//! let store = SheetStore::open_in_memory().unwrap();
//! let ident = WorksheetIdent::new("alice", 0).unwrap();
//!
//! let mut ws = store.create_worksheet(&ident).unwrap();
//! ws.set_title("Number theory");
//! ws.push_cell(CellKind::Compute, "factor(1001)");
//! store.save_worksheet(&ws, SaveMode::Full).unwrap();
//!
//! let listed = store.worksheets("alice", None, Depth::Recursive).unwrap();
//! assert_eq!(listed[0].title(), "Number theory");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod archive;
mod config;
mod datastore;
#[cfg(feature = "std")]
mod dir;
mod error;
mod identity;
mod locks;
mod model;
mod records;
mod worksheet;
mod worksheet_store;

pub use archive::{
    encode_archive, read_archive, read_archive_metadata, validate_archive, Archive,
    ArchiveManifest, ArchiveMetadata, ArchiveSummary, ARCHIVE_MAGIC, ARCHIVE_VERSION,
};
pub use config::Config;
pub use datastore::{Datastore, SheetStore};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use identity::{Namespace, Subpath, Username, WorksheetIdent, MAX_NAME_LEN};
pub use model::{
    AccountType, HistoryLog, OpenIdAssociations, ServerConfig, Setting, User, UserDirectory,
};
pub use worksheet::{
    Cell, CellKind, LastChange, Worksheet, WorksheetBody, WorksheetConfig, DEFAULT_SYSTEM,
    DEFAULT_TITLE,
};
pub use worksheet_store::{Depth, SaveMode};

/// Crate version, as recorded by the CLI's `version` command.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
