//! Campaign data store for tabletop game management.
//!
//! This crate provides:
//! - A JSON-shaped state tree of named entity collections
//! - CRUD over those collections with automatic ids and timestamps
//! - Best-effort persistence to pluggable key/value storage
//! - Whole-state validation, export and import
//! - Feature services for characters, conditions, guild logs, loot and notes
//!
//! # Quick Start
//!
//! ```ignore
//! use campaign_core::services::CharacterService;
//! use campaign_core::{DataService, StoreConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = DataService::open(StoreConfig::from_env())?;
//!
//!     let thorin = CharacterService::new(&mut store).create("Thorin", serde_json::Value::Null)?;
//!     println!("{}", thorin.id().unwrap_or_default());
//!
//!     store.close()?;
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod config;
pub mod entity;
pub mod error;
pub mod kind;
pub mod services;
pub mod state;
pub mod storage;
pub mod store;
pub mod timestamp;
pub mod validate;

// Primary public API
pub use backup::{BackupError, SavedSnapshot};
pub use config::StoreConfig;
pub use entity::Entity;
pub use error::{StorageError, StorageResult, StoreError, StoreResult};
pub use kind::EntityKind;
pub use state::State;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{AddOptions, CampaignStore, DataService};
pub use validate::{validate_state, ValidationError, ValidationErrors};
