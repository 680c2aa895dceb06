//! Users command implementation.

use super::open_read_only;
use crate::error::CliError;
use crate::Format;
use serde::Serialize;
use sheetstore_core::{AccountType, Datastore};
use std::path::Path;

/// Public view of one account. Password hashes are never printed.
#[derive(Debug, Serialize)]
pub struct UserEntry {
    /// Username.
    pub username: String,
    /// Account type.
    pub account_type: AccountType,
    /// Contact address.
    pub email: Option<String>,
    /// Whether the address is confirmed.
    pub email_confirmed: bool,
    /// Whether the account is disabled.
    pub disabled: bool,
}

/// Runs the users command.
pub fn run(path: &Path, format: Format) -> Result<(), CliError> {
    let store = open_read_only(path)?;
    let users = store.load_users()?;
    store.close()?;

    let entries: Vec<UserEntry> = users
        .iter()
        .map(|u| UserEntry {
            username: u.username.to_string(),
            account_type: u.account_type,
            email: u.email.clone(),
            email_confirmed: u.email_confirmed,
            disabled: u.disabled,
        })
        .collect();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        Format::Text => {
            if entries.is_empty() {
                println!("No users");
            }
            for entry in &entries {
                let status = if entry.disabled { "disabled" } else { "active" };
                println!(
                    "{:<24} {:<6} {:<8} {}",
                    entry.username,
                    format!("{:?}", entry.account_type).to_lowercase(),
                    status,
                    entry.email.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}
