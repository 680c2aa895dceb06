//! Datastore configuration.

/// Configuration for opening a datastore.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the datastore directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Open without write access. Every mutating operation fails with
    /// [`crate::CoreError::Unsupported`], and the directory lock is taken
    /// shared so several readers may coexist.
    pub read_only: bool,

    /// Whether to fsync directories after every write (safer but slower).
    pub sync_on_write: bool,

    /// Largest archive file `import_worksheet` will read, in bytes.
    pub max_archive_size: u64,

    /// When set, `save_user_history` keeps only the newest entries.
    pub history_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            read_only: false,
            sync_on_write: true,
            max_archive_size: 64 * 1024 * 1024, // 64 MB
            history_limit: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the datastore if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets read-only mode.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Sets whether to sync directories on every write.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets the maximum importable archive size.
    #[must_use]
    pub const fn max_archive_size(mut self, size: u64) -> Self {
        self.max_archive_size = size;
        self
    }

    /// Sets how many history entries are retained per user.
    #[must_use]
    pub const fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(!config.read_only);
        assert!(config.sync_on_write);
        assert!(config.history_limit.is_none());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_if_missing(false)
            .read_only(true)
            .sync_on_write(false)
            .max_archive_size(1024)
            .history_limit(Some(500));

        assert!(!config.create_if_missing);
        assert!(config.read_only);
        assert!(!config.sync_on_write);
        assert_eq!(config.max_archive_size, 1024);
        assert_eq!(config.history_limit, Some(500));
    }
}
