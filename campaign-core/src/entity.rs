//! The generic entity record stored in every collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Field holding the entity's identifier.
pub const ID: &str = "id";
/// Field holding the creation timestamp.
pub const CREATED_AT: &str = "createdAt";
/// Field holding the last-modification timestamp.
pub const UPDATED_AT: &str = "updatedAt";

/// Generate a new entity id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A uniquely identified record within a collection.
///
/// Entities are plain JSON objects so that whatever a caller stored comes
/// back out of an export unchanged. Domain fields are read through the typed
/// accessors below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    /// Create an empty entity with no id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str(ID)
    }

    pub fn created_at(&self) -> Option<&str> {
        self.get_str(CREATED_AT)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.get_str(UPDATED_AT)
    }

    /// Raw field access.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.0.get(field).and_then(Value::as_bool)
    }

    pub fn get_array(&self, field: &str) -> Option<&Vec<Value>> {
        self.0.get(field).and_then(Value::as_array)
    }

    /// Extract a value using a JSON pointer (e.g. "/hitPoints/max").
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        if pointer.is_empty() {
            return None;
        }
        let mut segments = pointer.trim_start_matches('/').split('/');
        let first = segments.next()?;
        segments.try_fold(self.0.get(first)?, |value, segment| value.get(segment))
    }

    /// Set a field on this copy. Has no effect on the store until the entity
    /// is passed back through `update`.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Entity {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        entity.into_value()
    }
}
