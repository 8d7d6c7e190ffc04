//! Error types for the campaign store.
//!
//! Not-found is never an error here: lookups return `Option` and removals
//! return `bool`. These enums cover structural problems, precondition
//! violations and storage failures.

use crate::validate::ValidationErrors;
use thiserror::Error;

/// Result type for store and feature-service operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for durable storage backends.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the store core and the feature services.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A candidate state failed validation. Carries every violation found.
    #[error("Invalid state: {0}")]
    Validation(ValidationErrors),

    /// The addressed slot exists but does not hold a sequence of entities.
    #[error("'{0}' is not a collection")]
    NotACollection(String),

    /// A caller-supplied id is already used in the collection.
    #[error("Duplicate id '{id}' in collection '{collection}'")]
    DuplicateId { collection: String, id: String },

    /// Entity data or updates were not a JSON object.
    #[error("Invalid entity data: {0}")]
    InvalidEntity(String),

    /// A required argument was missing or empty.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from a durable storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The write would exceed the backend's capacity.
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
}
