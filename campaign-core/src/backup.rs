//! Snapshot backups of the whole campaign state.
//!
//! A snapshot is a versioned JSON file holding the exported state plus a
//! small metadata block that can be read without parsing the rest.

use crate::state::State;
use crate::storage::sanitize_file_stem;
use crate::timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from backup operations.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current snapshot file version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A saved copy of the campaign state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSnapshot {
    /// Snapshot format version for compatibility checking.
    pub version: u32,

    /// When the snapshot was taken.
    pub saved_at: String,

    /// The complete state tree.
    pub state: State,

    pub metadata: SnapshotMetadata,
}

/// Summary of a snapshot for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub campaign_name: String,

    /// Entity count per collection path.
    pub collection_counts: BTreeMap<String, usize>,

    pub total_entities: usize,

    /// Duplicated from the parent so `peek_metadata` can report it.
    #[serde(default)]
    pub saved_at: String,
}

impl SavedSnapshot {
    pub fn new(state: State, campaign_name: impl Into<String>) -> Self {
        let saved_at = timestamp::now();
        let metadata = SnapshotMetadata {
            campaign_name: campaign_name.into(),
            collection_counts: state.collection_counts(),
            total_entities: state.entity_count(),
            saved_at: saved_at.clone(),
        };

        Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            state,
            metadata,
        }
    }

    /// Save to a JSON file, creating the parent directory if needed.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), BackupError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, BackupError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;
        check_version(saved.version)?;
        Ok(saved)
    }

    /// Read a snapshot's metadata without materializing its state.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SnapshotMetadata, BackupError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: SnapshotMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;
        check_version(partial.version)?;
        Ok(partial.metadata)
    }
}

fn check_version(found: u32) -> Result<(), BackupError> {
    if found != SNAPSHOT_VERSION {
        return Err(BackupError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found,
        });
    }
    Ok(())
}

/// A snapshot file found on disk.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub metadata: SnapshotMetadata,
}

/// Every readable snapshot in `dir`, newest first. Unreadable or foreign
/// JSON files are skipped. A missing directory is created and yields an
/// empty list.
pub async fn list_backups(dir: impl AsRef<Path>) -> Result<Vec<BackupInfo>, BackupError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).await?;

    let mut backups = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "json") {
            match SavedSnapshot::peek_metadata(&path).await {
                Ok(metadata) => backups.push(BackupInfo { path, metadata }),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "Skipping file"),
            }
        }
    }

    backups.sort_by(|a, b| {
        b.metadata
            .saved_at
            .cmp(&a.metadata.saved_at)
            .then_with(|| b.path.cmp(&a.path))
    });
    Ok(backups)
}

/// A timestamped snapshot file name for `campaign_name` under `dir`.
pub fn backup_path(dir: impl AsRef<Path>, campaign_name: &str) -> PathBuf {
    let stamp = timestamp::now().replace([':', '-', '.'], "");
    dir.as_ref()
        .join(format!("{}_{stamp}.json", sanitize_file_stem(campaign_name)))
}
