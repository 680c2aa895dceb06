//! CLI error type.

use sheetstore_core::CoreError;
use std::fmt;
use thiserror::Error;

/// Errors reported by `sheetstore` commands.
#[derive(Error)]
pub enum CliError {
    /// The command needs `--path`.
    #[error("datastore path required for {0} (use --path)")]
    MissingPath(&'static str),

    /// A destructive command was not confirmed.
    #[error("refusing to {0} without --yes")]
    NotConfirmed(&'static str),

    /// Datastore failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// I/O failure outside the datastore.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output failure.
    #[error("cannot render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// `main` returning `Err` prints the Debug form; show the message instead.
impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
