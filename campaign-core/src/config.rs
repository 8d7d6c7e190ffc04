//! Store configuration.

use std::path::PathBuf;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "campaignData";

/// Data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "./campaign-data";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CAMPAIGN_DATA_DIR";

/// Environment variable overriding the storage key.
pub const STORAGE_KEY_ENV: &str = "CAMPAIGN_STORAGE_KEY";

/// Configuration for a [`DataService`](crate::DataService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key the serialized state is stored under.
    pub storage_key: String,

    /// Directory used by file-backed storage and backups.
    pub data_dir: PathBuf,

    /// Persist indented JSON instead of compact JSON.
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            pretty: false,
        }
    }

    /// Defaults overridden by `CAMPAIGN_DATA_DIR` and `CAMPAIGN_STORAGE_KEY`.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(dir) = non_empty_var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = non_empty_var(STORAGE_KEY_ENV) {
            config.storage_key = key;
        }
        config
    }

    /// Set the storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Persist pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Directory backups are written to.
    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
