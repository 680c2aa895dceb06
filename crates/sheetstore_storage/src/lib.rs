//! # SheetStore Storage
//!
//! Blob backend trait and implementations for SheetStore.
//!
//! This crate provides the lowest-level storage abstraction for SheetStore.
//! Backends are **opaque keyed byte stores** - they do not interpret the
//! blobs they hold.
//!
//! ## Design Principles
//!
//! - Backends store whole blobs under hierarchical [`BlobKey`]s
//! - Every `put` is an atomic whole-blob replacement
//! - No knowledge of worksheets, users or record formats
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`InMemoryBlobStore`] - For testing and ephemeral storage
//! - [`FileBlobStore`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use sheetstore_storage::{BlobKey, BlobStore, InMemoryBlobStore};
//!
//! let store = InMemoryBlobStore::new();
//! let key = BlobKey::parse("home/alice/history").unwrap();
//! store.put(&key, b"hello world").unwrap();
//! assert_eq!(store.get(&key).unwrap().unwrap(), b"hello world");
//! assert_eq!(store.list(&BlobKey::parse("home").unwrap()).unwrap(), vec![key]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod key;
mod memory;

pub use backend::BlobStore;
pub use error::{StorageError, StorageResult};
pub use file::{atomic_write, FileBlobStore};
pub use key::BlobKey;
pub use memory::InMemoryBlobStore;
