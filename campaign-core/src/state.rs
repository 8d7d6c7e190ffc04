//! The root state document.
//!
//! A `State` maps collection names to sequences of entities, or to nested
//! objects of sequences (`guildLogs`). It is exactly the JSON layout that is
//! persisted and exported.

use crate::entity::ID;
use crate::error::{StoreError, StoreResult};
use crate::kind::{EntityKind, CHARACTERS, GUILD_ACTIVITIES, GUILD_RESOURCES, QUESTS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Legacy collection names and the canonical collection they migrate into.
pub const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("activeQuests", QUESTS),
    ("players", CHARACTERS),
    ("guildActivities", GUILD_ACTIVITIES),
    ("guildResources", GUILD_RESOURCES),
];

/// The canonical collection a legacy name migrates into, if `name` is one.
pub(crate) fn legacy_target(name: &str) -> Option<&'static str> {
    LEGACY_ALIASES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|&(_, to)| to)
}

/// The path `collection` is stored under: legacy names resolve to their
/// canonical collection, every other name to itself.
pub fn canonical_collection(collection: &str) -> &str {
    legacy_target(collection).unwrap_or(collection)
}

/// Record of one legacy collection folded into its canonical place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMigration {
    pub from: &'static str,
    pub to: &'static str,
    pub moved: usize,
}

/// A full snapshot of campaign data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(Map<String, Value>);

impl Default for State {
    fn default() -> Self {
        Self::initial()
    }
}

impl State {
    /// The default shape: every recognized collection present and empty.
    pub fn initial() -> Self {
        let mut state = Self(Map::new());
        state.ensure_collections();
        state
    }

    /// A state with no collections at all.
    pub fn empty() -> Self {
        Self(Map::new())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Top-level collection names, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Replace one top-level slot.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Look up whatever is stored at a (possibly dotted) path.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.0.get(segments.next()?)?;
        segments.try_fold(first, |value, segment| value.as_object()?.get(segment))
    }

    /// The entities stored at `path`, if that slot is a sequence.
    pub fn sequence(&self, path: &str) -> Option<&Vec<Value>> {
        self.lookup(path).and_then(Value::as_array)
    }

    /// Mutable access to an existing sequence; never creates one.
    pub(crate) fn sequence_mut(&mut self, path: &str) -> Option<&mut Vec<Value>> {
        let mut segments = path.split('.');
        let mut value = self.0.get_mut(segments.next()?)?;
        for segment in segments {
            value = value.as_object_mut()?.get_mut(segment)?;
        }
        value.as_array_mut()
    }

    /// Mutable access to the sequence at `path`, registering an empty one
    /// (and any missing parent objects) when absent.
    pub(crate) fn sequence_or_init(&mut self, path: &str) -> StoreResult<&mut Vec<Value>> {
        let (map, leaf) = self.parent_or_init(path)?;
        match map
            .entry(leaf.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => Ok(items),
            _ => Err(StoreError::NotACollection(path.to_string())),
        }
    }

    /// Replace whatever is stored at a (possibly dotted) path, creating
    /// missing parent objects. Sibling slots under the same parent are kept.
    pub(crate) fn set_path(&mut self, path: &str, value: Value) -> StoreResult<()> {
        let (map, leaf) = self.parent_or_init(path)?;
        map.insert(leaf.to_string(), value);
        Ok(())
    }

    /// The object holding the last segment of `path`, and that segment.
    fn parent_or_init<'p>(
        &mut self,
        path: &'p str,
    ) -> StoreResult<(&mut Map<String, Value>, &'p str)> {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(StoreError::NotACollection(path.to_string()));
        }

        let (parents, leaf) = match path.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, path),
        };

        let mut map = &mut self.0;
        if let Some(parents) = parents {
            for segment in parents.split('.') {
                let slot = map
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                map = match slot {
                    Value::Object(inner) => inner,
                    _ => return Err(StoreError::NotACollection(path.to_string())),
                };
            }
        }
        Ok((map, leaf))
    }

    /// Add any missing recognized collection as an empty one.
    ///
    /// Slots that exist with the wrong type are left alone for the validator
    /// to report. Returns whether anything was added.
    pub fn ensure_collections(&mut self) -> bool {
        let mut added = false;
        for kind in EntityKind::ALL {
            let path = kind.collection();
            if self.lookup(path).is_none() && self.sequence_or_init(path).is_ok() {
                added = true;
            }
        }
        added
    }

    /// Fold legacy collection names into their canonical collections.
    ///
    /// Legacy entries are appended after any canonical entries and the legacy
    /// key is removed. A legacy slot that is not a sequence, or whose target
    /// is not a collection, is left in place untouched.
    pub fn migrate_legacy(&mut self) -> Vec<LegacyMigration> {
        let mut migrations = Vec::new();

        for &(from, to) in LEGACY_ALIASES {
            let items = match self.0.remove(from) {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    self.0.insert(from.to_string(), other);
                    continue;
                }
                None => continue,
            };

            match self.sequence_or_init(to) {
                Ok(target) => {
                    let moved = items.len();
                    target.extend(items);
                    migrations.push(LegacyMigration { from, to, moved });
                }
                Err(_) => {
                    self.0.insert(from.to_string(), Value::Array(items));
                }
            }
        }

        migrations
    }

    /// Number of entities in each sequence, keyed by collection path.
    pub fn collection_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (key, value) in &self.0 {
            match value {
                Value::Array(items) => {
                    counts.insert(key.clone(), items.len());
                }
                Value::Object(nested) => {
                    for (sub, value) in nested {
                        if let Value::Array(items) = value {
                            counts.insert(format!("{key}.{sub}"), items.len());
                        }
                    }
                }
                _ => {}
            }
        }
        counts
    }

    /// Total number of entities across all collections.
    pub fn entity_count(&self) -> usize {
        self.collection_counts().values().sum()
    }

    /// Whether `path` holds an entity with the given id.
    pub fn contains_id(&self, path: &str, id: &str) -> bool {
        self.sequence(path)
            .is_some_and(|items| items.iter().any(|item| entity_id(item) == Some(id)))
    }
}

/// The `id` of a stored entity value, if it has a string one.
pub(crate) fn entity_id(value: &Value) -> Option<&str> {
    value.get(ID).and_then(Value::as_str)
}
