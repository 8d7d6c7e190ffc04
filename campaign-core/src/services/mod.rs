//! Feature services: domain operations expressed as store calls.
//!
//! Each service borrows a [`CampaignStore`](crate::CampaignStore) for as long
//! as it is in use and holds no state of its own.

mod character;
mod condition;
mod guild;
mod loot;
mod notes;

pub use character::CharacterService;
pub use condition::{ActiveCondition, ConditionService, StandardCondition, MAX_EXHAUSTION, STANDARD_CONDITIONS};
pub use guild::{GuildService, ACTIVITY_STATUSES};
pub use loot::LootService;
pub use notes::NotesService;

use crate::error::{StoreError, StoreResult};
use serde_json::{Map, Value};

/// Trimmed `value`, or a precondition error naming `what`.
pub(crate) fn require_text(value: &str, what: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Precondition(format!("{what} is required")));
    }
    Ok(trimmed.to_string())
}

/// `extra` fields (an object or null) with `base` fields layered on top.
pub(crate) fn with_fields(extra: Value, base: Value) -> StoreResult<Value> {
    let mut merged = object(extra, "extra fields")?;
    merged.extend(object(base, "fields")?);
    Ok(Value::Object(merged))
}

fn object(value: Value, what: &str) -> StoreResult<Map<String, Value>> {
    match value {
        Value::Object(fields) => Ok(fields),
        Value::Null => Ok(Map::new()),
        _ => Err(StoreError::InvalidEntity(format!("{what} must be an object"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("  Thorin ", "name").unwrap(), "Thorin");
        let err = require_text("   ", "name").unwrap_err();
        assert_eq!(err.to_string(), "Precondition failed: name is required");
    }

    #[test]
    fn test_with_fields_base_wins() {
        let merged = with_fields(json!({ "name": "x", "race": "elf" }), json!({ "name": "Lyra" })).unwrap();
        assert_eq!(merged, json!({ "name": "Lyra", "race": "elf" }));
        assert!(with_fields(json!(3), json!({})).is_err());
    }
}
