//! The store core: one authoritative state tree plus durable persistence.
//!
//! All feature services reach campaign data through [`CampaignStore`], which
//! [`DataService`] implements. Every mutating call takes `&mut self`, so two
//! writes can never interleave on the same store.
//!
//! Callers doing read-modify-write across several calls (read a character,
//! edit its inventory, `update`) are not protected against another writer
//! slipping in between if they give up the borrow in the middle. There is no
//! compare-and-swap.

use crate::config::StoreConfig;
use crate::entity::{new_id, Entity, CREATED_AT, ID, UPDATED_AT};
use crate::error::{StoreError, StoreResult};
use crate::kind::EntityKind;
use crate::state::{canonical_collection, entity_id, legacy_target, State};
use crate::storage::{FileStorage, MemoryStorage, Storage};
use crate::timestamp;
use crate::validate::{validate_state, ValidationErrors};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

/// Options for [`CampaignStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOptions {
    /// Assign a fresh id. When `false`, a caller-supplied `id` is kept (a new
    /// one is still generated if the caller supplied none).
    pub generate_id: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self { generate_id: true }
    }
}

impl AddOptions {
    /// Keep the caller's `id` if it has one.
    pub fn keep_id() -> Self {
        Self { generate_id: false }
    }
}

/// The collection-oriented store interface every feature service depends on.
///
/// Everything handed out is a copy: editing a returned [`Entity`] changes
/// nothing until it is passed back through [`update`](Self::update).
pub trait CampaignStore {
    /// All entities in `collection`, in insertion order. An unknown
    /// collection reads as empty and is registered as such.
    fn get_all(&mut self, collection: &str) -> Vec<Entity>;

    /// The entity with `id`, or `None`.
    fn get(&self, collection: &str, id: &str) -> Option<Entity>;

    /// Merge `data` over the kind's defaults, stamp id and timestamps,
    /// append, persist, and return the stored entity.
    fn add(&mut self, collection: &str, data: Value, options: AddOptions) -> StoreResult<Entity>;

    /// Shallow-merge `updates` into the entity with `id`. The id and creation
    /// time never change; `updatedAt` is refreshed. `Ok(None)` if not found.
    fn update(&mut self, collection: &str, id: &str, updates: Value)
        -> StoreResult<Option<Entity>>;

    /// Remove the entity with `id`. Returns whether anything was removed.
    fn remove(&mut self, collection: &str, id: &str) -> bool;

    /// Replace top-level collections with those in `partial`. Legacy names
    /// land in their canonical collection, and recognized collections the
    /// merge leaves missing are filled in empty.
    fn update_state(&mut self, partial: State);

    /// Write the current state to durable storage.
    fn save_data(&mut self);

    /// Entities in `collection` matching `predicate`.
    fn find<F>(&mut self, collection: &str, predicate: F) -> Vec<Entity>
    where
        F: Fn(&Entity) -> bool,
        Self: Sized,
    {
        self.get_all(collection)
            .into_iter()
            .filter(|entity| predicate(entity))
            .collect()
    }

    /// First entity in `collection` whose string `field` equals `value`.
    fn find_by(&mut self, collection: &str, field: &str, value: &str) -> Option<Entity>
    where
        Self: Sized,
    {
        self.get_all(collection)
            .into_iter()
            .find(|entity| entity.get_str(field) == Some(value))
    }
}

/// The campaign data store.
///
/// Owns the state exclusively. Construct one per campaign, pass it (or a
/// service borrowing it) to whoever needs data, and [`close`](Self::close)
/// it when done.
pub struct DataService<S: Storage = MemoryStorage> {
    state: State,
    storage: S,
    config: StoreConfig,
}

impl DataService<MemoryStorage> {
    /// A store backed by fresh in-process storage.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new(), StoreConfig::default())
    }
}

impl DataService<FileStorage> {
    /// Open a file-backed store under `config.data_dir`.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let storage = FileStorage::new(&config.data_dir)?;
        Ok(Self::new(storage, config))
    }

    /// Open a file-backed store for reading: the file on disk is left as it
    /// is until something is mutated.
    pub fn inspect(config: StoreConfig) -> StoreResult<Self> {
        let storage = FileStorage::new(&config.data_dir)?;
        Ok(Self::load(storage, config))
    }
}

impl<S: Storage> DataService<S> {
    /// Create a store, hydrating from `storage` if it already holds state.
    ///
    /// Unreadable or malformed persisted data is logged and replaced by the
    /// initial state in memory; nothing is overwritten until the next save.
    pub fn new(storage: S, config: StoreConfig) -> Self {
        let (mut service, migrated) = Self::hydrated(storage, config);
        if migrated {
            service.save_data();
        }
        service
    }

    /// Like [`new`](Self::new), but never writes back during hydration, even
    /// when legacy collections were migrated in memory. Later mutations
    /// persist as usual.
    pub fn load(storage: S, config: StoreConfig) -> Self {
        Self::hydrated(storage, config).0
    }

    fn hydrated(storage: S, config: StoreConfig) -> (Self, bool) {
        let (state, migrated) = hydrate(&storage, &config.storage_key);
        let service = Self {
            state,
            storage,
            config,
        };
        (service, migrated)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give up the store, handing back its storage without a final save.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Final save, reporting failure instead of just logging it.
    pub fn close(mut self) -> StoreResult<S> {
        self.try_save()?;
        info!(key = %self.config.storage_key, "closed campaign store");
        Ok(self.storage)
    }

    /// Alias for [`CampaignStore::remove`].
    pub fn delete(&mut self, collection: &str, id: &str) -> bool {
        self.remove(collection, id)
    }

    /// Number of entities in `collection` without registering it.
    pub fn count(&self, collection: &str) -> usize {
        let collection = canonical_collection(collection);
        self.state.sequence(collection).map_or(0, Vec::len)
    }

    /// A deep copy of the entire state.
    pub fn export_state(&self) -> State {
        self.state.clone()
    }

    /// The entire state as pretty-printed JSON.
    pub fn export_json(&self) -> StoreResult<String> {
        Ok(self.state.to_json_pretty()?)
    }

    /// Replace the state with `state` if it validates.
    ///
    /// Legacy collection names are migrated and missing recognized
    /// collections filled in before validation. On any violation the current
    /// state is left exactly as it was.
    pub fn import_data(&mut self, state: State) -> StoreResult<()> {
        let mut candidate = state;
        log_migrations(&candidate.migrate_legacy());
        candidate.ensure_collections();

        let errors = validate_state(&candidate);
        if !errors.is_empty() {
            warn!(count = errors.len(), "rejected import of invalid state");
            return Err(StoreError::Validation(ValidationErrors(errors)));
        }

        self.state = candidate;
        info!(entities = self.state.entity_count(), "imported campaign state");
        self.save_data();
        Ok(())
    }

    /// Parse and import a JSON snapshot.
    pub fn import_json(&mut self, json: &str) -> StoreResult<()> {
        let state = State::from_json(json)?;
        self.import_data(state)
    }

    /// Reset to the initial state (all collections empty) and persist.
    pub fn clear_data(&mut self) {
        self.state = State::initial();
        info!(key = %self.config.storage_key, "cleared campaign state");
        self.save_data();
    }

    fn try_save(&mut self) -> StoreResult<()> {
        let serialized = if self.config.pretty {
            self.state.to_json_pretty()?
        } else {
            self.state.to_json()?
        };
        self.storage.set_item(&self.config.storage_key, &serialized)?;
        Ok(())
    }
}

impl<S: Storage> CampaignStore for DataService<S> {
    fn get_all(&mut self, collection: &str) -> Vec<Entity> {
        let collection = canonical_collection(collection);
        match self.state.sequence_or_init(collection) {
            Ok(items) => items.iter().cloned().filter_map(Entity::from_value).collect(),
            Err(error) => {
                warn!(collection, %error, "read of non-collection slot");
                Vec::new()
            }
        }
    }

    fn get(&self, collection: &str, id: &str) -> Option<Entity> {
        let collection = canonical_collection(collection);
        self.state
            .sequence(collection)?
            .iter()
            .find(|item| entity_id(item) == Some(id))
            .cloned()
            .and_then(Entity::from_value)
    }

    fn add(&mut self, collection: &str, data: Value, options: AddOptions) -> StoreResult<Entity> {
        let collection = canonical_collection(collection);
        let fields = into_fields(data)?;

        let id = match fields.get(ID) {
            Some(Value::String(id)) if !options.generate_id && !id.is_empty() => id.clone(),
            Some(Value::Number(id)) if !options.generate_id => id.to_string(),
            _ => new_id(),
        };

        let mut entity = EntityKind::from_collection(collection)
            .map(|kind| kind.defaults())
            .unwrap_or_default();
        entity.extend(fields);

        let now = timestamp::now();
        entity.insert(ID.to_string(), Value::String(id.clone()));
        entity.insert(CREATED_AT.to_string(), Value::String(now.clone()));
        entity.insert(UPDATED_AT.to_string(), Value::String(now));

        let items = self.state.sequence_or_init(collection)?;
        if items.iter().any(|item| entity_id(item) == Some(id.as_str())) {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }
        items.push(Value::Object(entity.clone()));

        debug!(collection, id = %id, "added entity");
        self.save_data();
        Ok(Entity::from(entity))
    }

    fn update(
        &mut self,
        collection: &str,
        id: &str,
        updates: Value,
    ) -> StoreResult<Option<Entity>> {
        let collection = canonical_collection(collection);
        let updates = into_fields(updates)?;

        let updated = {
            let Some(fields) = self
                .state
                .sequence_mut(collection)
                .and_then(|items| items.iter_mut().find(|item| entity_id(item) == Some(id)))
                .and_then(Value::as_object_mut)
            else {
                debug!(collection, id, "update of missing entity");
                return Ok(None);
            };

            let previous = fields
                .get(UPDATED_AT)
                .or_else(|| fields.get(CREATED_AT))
                .and_then(Value::as_str)
                .map(str::to_string);

            for (key, value) in updates {
                if key == ID || key == CREATED_AT {
                    continue;
                }
                fields.insert(key, value);
            }
            fields.insert(
                UPDATED_AT.to_string(),
                Value::String(timestamp::advance(previous.as_deref())),
            );
            Entity::from(fields.clone())
        };

        debug!(collection, id, "updated entity");
        self.save_data();
        Ok(Some(updated))
    }

    fn remove(&mut self, collection: &str, id: &str) -> bool {
        let collection = canonical_collection(collection);
        let Some(items) = self.state.sequence_mut(collection) else {
            return false;
        };
        let Some(position) = items.iter().position(|item| entity_id(item) == Some(id)) else {
            return false;
        };
        items.remove(position);

        debug!(collection, id, "removed entity");
        self.save_data();
        true
    }

    fn update_state(&mut self, partial: State) {
        let keys: Vec<String> = partial.keys().map(str::to_string).collect();
        for (key, value) in partial.into_map() {
            match legacy_target(&key) {
                Some(path) => {
                    if let Err(error) = self.state.set_path(path, value) {
                        warn!(collection = %key, %error, "skipped legacy collection");
                    }
                }
                None => self.state.set(key, value),
            }
        }
        self.state.ensure_collections();
        debug!(?keys, "replaced top-level collections");
        self.save_data();
    }

    fn save_data(&mut self) {
        if let Err(error) = self.try_save() {
            error!(
                key = %self.config.storage_key,
                %error,
                "failed to persist campaign state; in-memory state kept"
            );
        }
    }
}

fn into_fields(data: Value) -> StoreResult<Map<String, Value>> {
    match data {
        Value::Object(fields) => Ok(fields),
        Value::Null => Ok(Map::new()),
        other => Err(StoreError::InvalidEntity(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Load persisted state. Returns the state and whether legacy collections
/// were migrated (so the canonical shape should be written back).
fn hydrate<S: Storage>(storage: &S, key: &str) -> (State, bool) {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "no persisted state, starting fresh");
            return (State::initial(), false);
        }
        Err(error) => {
            warn!(key, %error, "failed to read persisted state, starting fresh");
            return (State::initial(), false);
        }
    };

    let mut state = match State::from_json(&raw) {
        Ok(state) => state,
        Err(error) => {
            warn!(key, %error, "persisted state is not a valid snapshot, starting fresh");
            return (State::initial(), false);
        }
    };

    let migrations = state.migrate_legacy();
    log_migrations(&migrations);
    state.ensure_collections();

    let errors = validate_state(&state);
    if !errors.is_empty() {
        warn!(key, count = errors.len(), "persisted state has validation errors");
        for error in &errors {
            debug!(%error, "validation error");
        }
    }

    info!(key, entities = state.entity_count(), "hydrated campaign state");
    (state, !migrations.is_empty())
}

fn log_migrations(migrations: &[crate::state::LegacyMigration]) {
    for migration in migrations {
        info!(
            from = migration.from,
            to = migration.to,
            moved = migration.moved,
            "migrated legacy collection"
        );
    }
}
