//! Structural validation of state snapshots.
//!
//! `validate_state` is pure: it reads the candidate, never mutates it, and
//! reports every violation rather than stopping at the first. Whether a
//! non-empty report is fatal is the caller's decision.

use crate::entity::{CREATED_AT, ID, UPDATED_AT};
use crate::kind::{EntityKind, GUILD_LOGS};
use crate::state::State;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// What is wrong at a given location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Problem {
    /// A collection slot holds something other than a sequence.
    NotASequence,
    /// An entity, or a nested collection root, is not an object.
    NotAnObject,
    /// A required field is absent or null.
    MissingField,
    /// A field is present with the wrong type or an empty id.
    InvalidField,
    /// Another entity earlier in the collection uses the same id.
    DuplicateId,
}

/// One violation found by [`validate_state`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub collection: String,
    /// Position of the entity within its collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub problem: Problem,
}

impl ValidationError {
    fn collection(collection: &str, problem: Problem) -> Self {
        Self {
            collection: collection.to_string(),
            index: None,
            id: None,
            field: None,
            problem,
        }
    }

    fn entity(
        collection: &str,
        index: usize,
        id: Option<&str>,
        field: Option<&str>,
        problem: Problem,
    ) -> Self {
        Self {
            collection: collection.to_string(),
            index: Some(index),
            id: id.map(str::to_string),
            field: field.map(str::to_string),
            problem,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection)?;
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        if let Some(id) = &self.id {
            write!(f, " (id {id})")?;
        }
        let field = self.field.as_deref().unwrap_or("?");
        match self.problem {
            Problem::NotASequence => write!(f, ": expected a sequence of entities"),
            Problem::NotAnObject => write!(f, ": expected an object"),
            Problem::MissingField => write!(f, ": missing required field '{field}'"),
            Problem::InvalidField => write!(f, ": invalid value for field '{field}'"),
            Problem::DuplicateId => write!(f, ": duplicate id"),
        }
    }
}

/// Every violation found in a rejected state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for (i, error) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{error}")?;
        }
        Ok(())
    }
}

/// Validate a candidate state.
///
/// Recognized collections may be absent (read as empty) but, when present,
/// must be sequences of objects with a unique non-empty string `id` and the
/// kind's required fields. Unrecognized collections are not inspected.
pub fn validate_state(state: &State) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(root) = state.lookup(GUILD_LOGS) {
        if !root.is_object() {
            errors.push(ValidationError::collection(GUILD_LOGS, Problem::NotAnObject));
        }
    }

    for kind in EntityKind::ALL {
        let collection = kind.collection();
        match state.lookup(collection) {
            None => {}
            Some(Value::Array(items)) => validate_entities(kind, items, &mut errors),
            Some(_) => errors.push(ValidationError::collection(collection, Problem::NotASequence)),
        }
    }

    errors
}

fn validate_entities(kind: EntityKind, items: &[Value], errors: &mut Vec<ValidationError>) {
    let collection = kind.collection();
    let mut seen = HashSet::new();

    for (index, item) in items.iter().enumerate() {
        let Some(fields) = item.as_object() else {
            errors.push(ValidationError::entity(
                collection,
                index,
                None,
                None,
                Problem::NotAnObject,
            ));
            continue;
        };

        let id = match fields.get(ID) {
            None | Some(Value::Null) => {
                errors.push(ValidationError::entity(
                    collection,
                    index,
                    None,
                    Some(ID),
                    Problem::MissingField,
                ));
                None
            }
            Some(Value::String(id)) if !id.is_empty() => Some(id.as_str()),
            Some(_) => {
                errors.push(ValidationError::entity(
                    collection,
                    index,
                    None,
                    Some(ID),
                    Problem::InvalidField,
                ));
                None
            }
        };

        if let Some(id) = id {
            if !seen.insert(id) {
                errors.push(ValidationError::entity(
                    collection,
                    index,
                    Some(id),
                    Some(ID),
                    Problem::DuplicateId,
                ));
            }
        }

        for &field in kind.required_fields() {
            if fields.get(field).map_or(true, Value::is_null) {
                errors.push(ValidationError::entity(
                    collection,
                    index,
                    id,
                    Some(field),
                    Problem::MissingField,
                ));
            }
        }

        for field in [CREATED_AT, UPDATED_AT] {
            if fields.get(field).is_some_and(|value| !value.is_string()) {
                errors.push(ValidationError::entity(
                    collection,
                    index,
                    id,
                    Some(field),
                    Problem::InvalidField,
                ));
            }
        }
    }
}
