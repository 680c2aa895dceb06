//! Whole-record data model: server configuration, OpenID associations,
//! the user directory and per-user history.
//!
//! Each of these is loaded and saved as a unit. A record that was never
//! saved loads as its `Default`.

use crate::identity::Username;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Setting {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// Free text.
    Text(String),
    /// A list of strings.
    List(Vec<String>),
}

impl Setting {
    /// Returns the boolean value, if this is a flag.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Setting {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Setting {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Setting {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Setting {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for Setting {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Global server settings. A singleton per datastore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerConfig {
    entries: BTreeMap<String, Setting>,
}

impl ServerConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a setting.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.entries.get(name)
    }

    /// Sets a value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Setting>) -> Option<Setting> {
        self.entries.insert(name.into(), value.into())
    }

    /// Removes a setting.
    pub fn remove(&mut self, name: &str) -> Option<Setting> {
        self.entries.remove(name)
    }

    /// Number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates settings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Setting)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Mapping from OpenID identifier to the local username it is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenIdAssociations {
    bindings: BTreeMap<String, Username>,
}

impl OpenIdAssociations {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `identifier` to `username`, returning the previous binding.
    pub fn bind(&mut self, identifier: impl Into<String>, username: Username) -> Option<Username> {
        self.bindings.insert(identifier.into(), username)
    }

    /// Removes the binding for `identifier`.
    pub fn unbind(&mut self, identifier: &str) -> Option<Username> {
        self.bindings.remove(identifier)
    }

    /// Looks up the user bound to `identifier`.
    #[must_use]
    pub fn lookup(&self, identifier: &str) -> Option<&Username> {
        self.bindings.get(identifier)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if there are no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates bindings in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Username)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Role of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Full administrative access.
    Admin,
    /// Regular account.
    #[default]
    User,
    /// Anonymous or read-only account.
    Guest,
}

/// One user account. Credential and profile fields are opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique, immutable username.
    pub username: Username,
    /// Password hash in whatever format the application uses.
    pub password_hash: String,
    /// Contact address.
    pub email: Option<String>,
    /// Role of the account.
    pub account_type: AccountType,
    /// Whether the address has been confirmed.
    pub email_confirmed: bool,
    /// Disabled accounts cannot log in.
    pub disabled: bool,
    /// Per-user preferences.
    pub conf: BTreeMap<String, Setting>,
}

impl User {
    /// Creates a regular account with no email and default preferences.
    #[must_use]
    pub fn new(username: Username, password_hash: impl Into<String>) -> Self {
        Self {
            username,
            password_hash: password_hash.into(),
            email: None,
            account_type: AccountType::User,
            email_confirmed: false,
            disabled: false,
            conf: BTreeMap::new(),
        }
    }

    /// Sets the account type.
    #[must_use]
    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = account_type;
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Returns `true` for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.account_type == AccountType::Admin
    }
}

/// Every user known to the server, keyed by username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserDirectory {
    users: BTreeMap<Username, User>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user, keyed by its username.
    pub fn insert(&mut self, user: User) -> Option<User> {
        self.users.insert(user.username.clone(), user)
    }

    /// Looks up a user.
    #[must_use]
    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// Looks up a user for modification.
    pub fn get_mut(&mut self, username: &str) -> Option<&mut User> {
        self.users.get_mut(username)
    }

    /// Removes a user.
    pub fn remove(&mut self, username: &str) -> Option<User> {
        self.users.remove(username)
    }

    /// Returns `true` if `username` is present.
    #[must_use]
    pub fn contains(&self, username: &str) -> bool {
        self.get(username).is_some()
    }

    /// Number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if there are no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Iterates users in username order.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }
}

/// Ordered per-user input history, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<String>,
}

impl HistoryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// Returns the entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a copy holding at most the newest `limit` entries.
    #[must_use]
    pub fn newest(&self, limit: usize) -> Self {
        let skip = self.entries.len().saturating_sub(limit);
        Self {
            entries: self.entries[skip..].to_vec(),
        }
    }
}

impl From<Vec<String>> for HistoryLog {
    fn from(entries: Vec<String>) -> Self {
        Self { entries }
    }
}

impl FromIterator<String> for HistoryLog {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetstore_codec::{decode_record, encode_record, RecordKind};

    fn name(s: &str) -> Username {
        Username::new(s).unwrap()
    }

    #[test]
    fn server_config_accessors() {
        let mut conf = ServerConfig::new();
        assert!(conf.is_empty());
        conf.set("accounts", true);
        conf.set("max_history_length", 1000_i64);
        conf.set("server_name", "notebooks");

        assert_eq!(conf.get("accounts").and_then(Setting::as_bool), Some(true));
        assert_eq!(conf.get("max_history_length").and_then(Setting::as_int), Some(1000));
        assert_eq!(conf.get("server_name").and_then(Setting::as_text), Some("notebooks"));
        assert_eq!(conf.get("accounts").and_then(Setting::as_int), None);
        assert_eq!(conf.len(), 3);
    }

    #[test]
    fn user_directory_is_keyed_by_username() {
        let mut users = UserDirectory::new();
        users.insert(User::new(name("admin"), "h1").with_account_type(AccountType::Admin));
        users.insert(User::new(name("alice"), "h2").with_email("alice@example.com"));
        assert!(users.insert(User::new(name("alice"), "h3")).is_some());

        assert_eq!(users.len(), 2);
        assert!(users.get("admin").unwrap().is_admin());
        assert_eq!(users.get("alice").unwrap().password_hash, "h3");
        assert!(!users.contains("Alice"));

        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["admin", "alice"]);
    }

    #[test]
    fn history_newest() {
        let log: HistoryLog = (0..5).map(|i| format!("cmd {i}")).collect();
        assert_eq!(log.newest(2).entries(), ["cmd 3", "cmd 4"]);
        assert_eq!(log.newest(10), log);
        assert!(log.newest(0).is_empty());
    }

    #[test]
    fn records_survive_the_codec() {
        let mut users = UserDirectory::new();
        let mut user = User::new(name("bob"), "hash");
        user.conf.insert("autosave_interval".into(), Setting::Int(60));
        users.insert(user);
        let bytes = encode_record(RecordKind::Users, &users).unwrap();
        let decoded: UserDirectory = decode_record(RecordKind::Users, &bytes).unwrap();
        assert_eq!(decoded, users);

        let mut ids = OpenIdAssociations::new();
        ids.bind("https://id.example/bob", name("bob"));
        let bytes = encode_record(RecordKind::OpenId, &ids).unwrap();
        let decoded: OpenIdAssociations = decode_record(RecordKind::OpenId, &bytes).unwrap();
        assert_eq!(decoded.lookup("https://id.example/bob"), Some(&name("bob")));
    }
}
