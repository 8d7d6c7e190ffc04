//! Durable key/value storage backends.
//!
//! The store persists its whole state as one JSON document under a single
//! key. Backends are synchronous: a write either completes or fails before
//! the call returns.

use crate::error::{StorageError, StorageResult};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Synchronous key/value storage.
pub trait Storage {
    /// Read the value under `key`, or `None` if nothing is stored.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> StorageResult<()>;
}

/// In-process storage, optionally capped at a byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once keys plus values exceed `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota: Some(quota),
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if let Some(quota) = self.quota {
            let replaced = self.items.get(key).map_or(0, |old| key.len() + old.len());
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// File-backed storage: one `<key>.json` file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_file_stem(key)))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        // Write beside the target and rename so a failed write never leaves
        // a truncated document behind.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replace anything that is not alphanumeric, `-` or `_` with `_`.
pub(crate) fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_item("campaignData").unwrap(), None);

        storage.set_item("campaignData", "{}").unwrap();
        assert_eq!(storage.get_item("campaignData").unwrap().as_deref(), Some("{}"));

        storage.remove_item("campaignData").unwrap();
        storage.remove_item("campaignData").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_storage_quota() {
        let mut storage = MemoryStorage::with_quota(16);
        storage.set_item("key", "0123456789").unwrap();

        let err = storage.set_item("key", "0123456789abcdef").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 16, .. }));

        // The previous value survives a rejected write.
        assert_eq!(storage.get_item("key").unwrap().as_deref(), Some("0123456789"));

        // Replacing with something of equal size is still allowed.
        storage.set_item("key", "9876543210").unwrap();
    }

    #[test]
    fn test_file_storage_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut storage = FileStorage::new(temp_dir.path().join("data")).unwrap();

        assert_eq!(storage.get_item("campaignData").unwrap(), None);
        storage.set_item("campaignData", r#"{"quests":[]}"#).unwrap();
        assert!(storage.path_for("campaignData").exists());
        assert_eq!(
            storage.get_item("campaignData").unwrap().as_deref(),
            Some(r#"{"quests":[]}"#)
        );

        storage.remove_item("campaignData").unwrap();
        storage.remove_item("campaignData").unwrap();
        assert_eq!(storage.get_item("campaignData").unwrap(), None);
    }

    #[test]
    fn test_file_storage_sanitizes_keys() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        let path = storage.path_for("../my campaign!");
        assert_eq!(path.parent(), Some(temp_dir.path()));
        assert!(path.to_string_lossy().ends_with("___my_campaign_.json"));
    }
}
