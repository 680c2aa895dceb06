//! Inspect command implementation.

use super::open_read_only;
use crate::error::CliError;
use crate::Format;
use serde::Serialize;
use sheetstore_core::{Datastore, Depth, SheetStore};
use std::path::Path;

/// Datastore inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Datastore path.
    pub path: String,
    /// Number of server settings.
    pub server_settings: usize,
    /// Number of OpenID bindings.
    pub openid_bindings: usize,
    /// Per-user statistics.
    pub users: Vec<UserStats>,
    /// Total worksheets across all listed users.
    pub total_worksheets: usize,
}

/// Statistics for a single user.
#[derive(Debug, Serialize)]
pub struct UserStats {
    /// Username.
    pub username: String,
    /// Whether the user is an administrator.
    pub admin: bool,
    /// Number of worksheets, including nested subpaths.
    pub worksheets: usize,
    /// Number of history entries.
    pub history_entries: usize,
}

/// Collects statistics for every user in the directory.
pub fn collect(store: &SheetStore, path: &Path) -> Result<InspectResult, CliError> {
    let mut users = Vec::new();
    for user in store.load_users()?.iter() {
        let name = user.username.as_str();
        users.push(UserStats {
            username: name.to_string(),
            admin: user.is_admin(),
            worksheets: store.worksheets(name, None, Depth::Recursive)?.len(),
            history_entries: store.load_user_history(name)?.len(),
        });
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        server_settings: store.load_server_conf()?.len(),
        openid_bindings: store.load_openid()?.len(),
        total_worksheets: users.iter().map(|u| u.worksheets).sum(),
        users,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, format: Format) -> Result<(), CliError> {
    let store = open_read_only(path)?;
    let result = collect(&store, path)?;
    store.close()?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("SheetStore Datastore: {}", result.path);
    println!("─────────────────────────────────────");
    println!("Server settings:   {}", result.server_settings);
    println!("OpenID bindings:   {}", result.openid_bindings);
    println!("Users:             {}", result.users.len());
    println!("Worksheets:        {}", result.total_worksheets);

    if !result.users.is_empty() {
        println!();
        println!("{:<24} {:>10} {:>10}", "User", "Worksheets", "History");
        for user in &result.users {
            let marker = if user.admin { " (admin)" } else { "" };
            println!(
                "{:<24} {:>10} {:>10}",
                format!("{}{marker}", user.username),
                user.worksheets,
                user.history_entries
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetstore_core::{User, UserDirectory, Username, WorksheetIdent};
    use tempfile::tempdir;

    #[test]
    fn counts_worksheets_per_user() {
        let temp = tempdir().unwrap();
        let store = SheetStore::open(temp.path()).unwrap();
        let mut users = UserDirectory::new();
        users.insert(User::new(Username::new("alice").unwrap(), "h"));
        users.insert(User::new(Username::new("bob").unwrap(), "h"));
        store.save_users(&users).unwrap();
        for id in 0..3 {
            store
                .create_worksheet(&WorksheetIdent::new("alice", id).unwrap())
                .unwrap();
        }

        let result = collect(&store, temp.path()).unwrap();
        assert_eq!(result.total_worksheets, 3);
        assert_eq!(result.users[0].username, "alice");
        assert_eq!(result.users[0].worksheets, 3);
        assert_eq!(result.users[1].worksheets, 0);
    }
}
