//! # SheetStore Testkit
//!
//! Test utilities for SheetStore.
//!
//! This crate provides:
//! - Test fixtures and datastore helpers for both backends
//! - Property-based test generators using proptest
//! - A harness that tracks expected worksheet state
//! - Concurrent stress runners
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sheetstore_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_datastore() {
//!     with_temp_store(|store| {
//!         let ws = store.create_worksheet(&ident("alice", 0))?;
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
