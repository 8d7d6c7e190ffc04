//! Conditions: the standard 5e catalog, custom conditions, and conditions
//! applied to characters.

use super::require_text;
use crate::entity::Entity;
use crate::error::{StoreError, StoreResult};
use crate::kind::{CHARACTERS, CONDITIONS};
use crate::store::{AddOptions, CampaignStore};
use crate::timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Highest exhaustion level; a sixth level is fatal.
pub const MAX_EXHAUSTION: u8 = 6;

const EXHAUSTION: &str = "Exhaustion";

/// A condition from the standard rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardCondition {
    pub name: &'static str,
    pub description: &'static str,
    /// The creature can't take actions or reactions.
    pub incapacitating: bool,
}

const fn standard(
    name: &'static str,
    description: &'static str,
    incapacitating: bool,
) -> StandardCondition {
    StandardCondition {
        name,
        description,
        incapacitating,
    }
}

pub const STANDARD_CONDITIONS: &[StandardCondition] = &[
    standard("Blinded", "Can't see; attacks against it have advantage, its attacks have disadvantage.", false),
    standard("Charmed", "Can't attack the charmer; the charmer has advantage on social checks.", false),
    standard("Deafened", "Can't hear; fails checks that require hearing.", false),
    standard("Frightened", "Disadvantage while the source of fear is in sight; can't move closer to it.", false),
    standard("Grappled", "Speed becomes 0.", false),
    standard("Incapacitated", "Can't take actions or reactions.", true),
    standard("Invisible", "Can't be seen without magic; its attacks have advantage.", false),
    standard("Paralyzed", "Incapacitated, can't move or speak; nearby hits are critical.", true),
    standard("Petrified", "Turned to stone, incapacitated, resistant to all damage.", true),
    standard("Poisoned", "Disadvantage on attack rolls and ability checks.", false),
    standard("Prone", "Can only crawl; melee attacks against it have advantage.", false),
    standard("Restrained", "Speed 0; disadvantage on attacks and Dexterity saves.", false),
    standard("Stunned", "Incapacitated, can't move, speaks only falteringly.", true),
    standard("Unconscious", "Incapacitated, drops what it holds, falls prone.", true),
    standard(EXHAUSTION, "Cumulative levels of penalties; level 6 is death.", false),
];

/// A condition currently affecting a character, as stored on the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCondition {
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub applied_at: String,
    /// Only set for exhaustion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

/// Condition operations over `conditions` and character sheets.
pub struct ConditionService<'a, S: CampaignStore> {
    store: &'a mut S,
}

impl<'a, S: CampaignStore> ConditionService<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// The built-in catalog.
    pub fn catalog() -> &'static [StandardCondition] {
        STANDARD_CONDITIONS
    }

    /// Look up a standard condition, case-insensitively.
    pub fn find_standard(name: &str) -> Option<&'static StandardCondition> {
        STANDARD_CONDITIONS
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Campaign-specific conditions.
    pub fn list_custom(&mut self) -> Vec<Entity> {
        self.store.get_all(CONDITIONS)
    }

    pub fn create_custom(
        &mut self,
        name: &str,
        description: &str,
        effects: Vec<String>,
    ) -> StoreResult<Entity> {
        let name = require_text(name, "condition name")?;
        if Self::find_standard(&name).is_some() || self.find_custom(&name).is_some() {
            return Err(StoreError::Precondition(format!(
                "condition '{name}' already exists"
            )));
        }
        self.store.add(
            CONDITIONS,
            json!({ "name": name, "description": description, "effects": effects }),
            AddOptions::default(),
        )
    }

    /// Apply a condition to a character.
    ///
    /// Applying a condition the character already has changes nothing,
    /// except exhaustion, which gains a level (up to [`MAX_EXHAUSTION`]).
    /// `Ok(None)` if the character does not exist.
    pub fn apply(
        &mut self,
        character_id: &str,
        name: &str,
        source: &str,
    ) -> StoreResult<Option<Entity>> {
        let name = self.canonical_name(name)?;
        let Some(character) = self.store.get(CHARACTERS, character_id) else {
            return Ok(None);
        };

        let mut conditions = stored_conditions(&character);
        let is_exhaustion = name == EXHAUSTION;

        match conditions.iter_mut().find(|entry| entry_matches(entry, &name)) {
            Some(entry) if is_exhaustion => {
                let level = entry
                    .get("level")
                    .and_then(Value::as_u64)
                    .map_or(1, |level| level.min(u64::from(MAX_EXHAUSTION)) as u8);
                if level >= MAX_EXHAUSTION {
                    return Ok(Some(character));
                }
                match entry {
                    Value::Object(fields) => {
                        fields.insert("level".to_string(), json!(level + 1));
                    }
                    plain => {
                        *plain = json!({
                            "name": name,
                            "source": "",
                            "appliedAt": "",
                            "level": level + 1,
                        });
                    }
                }
            }
            Some(_) => return Ok(Some(character)),
            None => conditions.push(serde_json::to_value(ActiveCondition {
                name,
                source: source.to_string(),
                applied_at: timestamp::now(),
                level: is_exhaustion.then_some(1),
            })?),
        }

        self.store_conditions(character_id, conditions)
    }

    /// Remove a condition (exhaustion entirely, regardless of level).
    /// The character is returned unchanged if it did not have it.
    pub fn remove(&mut self, character_id: &str, name: &str) -> StoreResult<Option<Entity>> {
        let Some(character) = self.store.get(CHARACTERS, character_id) else {
            return Ok(None);
        };

        let mut conditions = stored_conditions(&character);
        let before = conditions.len();
        conditions.retain(|entry| !entry_matches(entry, name.trim()));
        if conditions.len() == before {
            return Ok(Some(character));
        }

        self.store_conditions(character_id, conditions)
    }

    /// Conditions on a character; empty if the character does not exist.
    pub fn active_for(&self, character_id: &str) -> Vec<ActiveCondition> {
        self.store
            .get(CHARACTERS, character_id)
            .map(|character| active_conditions(&character))
            .unwrap_or_default()
    }

    /// Whether any applied condition prevents actions.
    pub fn is_incapacitated(&self, character_id: &str) -> bool {
        self.active_for(character_id).iter().any(|c| {
            Self::find_standard(&c.name).is_some_and(|standard| standard.incapacitating)
        })
    }

    fn find_custom(&mut self, name: &str) -> Option<Entity> {
        self.store
            .get_all(CONDITIONS)
            .into_iter()
            .find(|c| c.get_str("name").is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    /// The stored spelling of a known condition.
    fn canonical_name(&mut self, name: &str) -> StoreResult<String> {
        let name = require_text(name, "condition name")?;
        if let Some(standard) = Self::find_standard(&name) {
            return Ok(standard.name.to_string());
        }
        self.find_custom(&name)
            .and_then(|c| c.get_str("name").map(str::to_string))
            .ok_or_else(|| StoreError::Precondition(format!("unknown condition '{name}'")))
    }

    fn store_conditions(
        &mut self,
        character_id: &str,
        conditions: Vec<Value>,
    ) -> StoreResult<Option<Entity>> {
        self.store
            .update(CHARACTERS, character_id, json!({ "conditions": conditions }))
    }
}

/// The raw `conditions` array of a character sheet. Edits go through this
/// so entries the typed view cannot read are written back untouched.
fn stored_conditions(character: &Entity) -> Vec<Value> {
    character.get_array("conditions").cloned().unwrap_or_default()
}

/// Whether a stored entry (an object with `name`, or a plain name) is the
/// condition `name`.
fn entry_matches(entry: &Value, name: &str) -> bool {
    let stored = match entry {
        Value::String(stored) => Some(stored.as_str()),
        other => other.get("name").and_then(Value::as_str),
    };
    stored.is_some_and(|stored| stored.eq_ignore_ascii_case(name))
}

/// Typed view of the conditions on a character sheet. Entries that are not
/// condition objects (or plain names) are left out of the view.
fn active_conditions(character: &Entity) -> Vec<ActiveCondition> {
    character
        .get_array("conditions")
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(ActiveCondition {
                        name: name.clone(),
                        source: String::new(),
                        applied_at: String::new(),
                        level: None,
                    }),
                    other => serde_json::from_value(other.clone()).ok(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::CharacterService;
    use crate::DataService;

    fn store_with_character() -> (DataService, String) {
        let mut store = DataService::in_memory();
        let id = CharacterService::new(&mut store)
            .create("Thorin", Value::Null)
            .unwrap()
            .id()
            .unwrap()
            .to_string();
        (store, id)
    }

    #[test]
    fn test_catalog() {
        assert_eq!(STANDARD_CONDITIONS.len(), 15);
        let stunned = ConditionService::<DataService>::find_standard("stunned").unwrap();
        assert_eq!(stunned.name, "Stunned");
        assert!(stunned.incapacitating);
        assert!(ConditionService::<DataService>::find_standard("Bewildered").is_none());
    }

    #[test]
    fn test_apply_and_remove() {
        let (mut store, id) = store_with_character();
        let mut conditions = ConditionService::new(&mut store);

        conditions.apply(&id, "poisoned", "spider bite").unwrap().unwrap();
        conditions.apply(&id, "Poisoned", "second bite").unwrap().unwrap();

        let active = conditions.active_for(&id);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Poisoned");
        assert_eq!(active[0].source, "spider bite");
        assert!(!conditions.is_incapacitated(&id));

        conditions.apply(&id, "Paralyzed", "ghoul").unwrap();
        assert!(conditions.is_incapacitated(&id));

        conditions.remove(&id, "paralyzed").unwrap();
        assert!(!conditions.is_incapacitated(&id));
        assert_eq!(conditions.active_for(&id).len(), 1);
    }

    #[test]
    fn test_exhaustion_stacks() {
        let (mut store, id) = store_with_character();
        let mut conditions = ConditionService::new(&mut store);

        for _ in 0..10 {
            conditions.apply(&id, "exhaustion", "forced march").unwrap();
        }
        let active = conditions.active_for(&id);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].level, Some(MAX_EXHAUSTION));
    }

    #[test]
    fn test_unknown_condition_is_rejected() {
        let (mut store, id) = store_with_character();
        let mut conditions = ConditionService::new(&mut store);
        let err = conditions.apply(&id, "Bewildered", "?").unwrap_err();
        assert!(matches!(err, StoreError::Precondition(_)));
    }

    #[test]
    fn test_custom_conditions() {
        let (mut store, id) = store_with_character();
        let mut conditions = ConditionService::new(&mut store);

        conditions
            .create_custom("Cursed", "Bestow curse", vec!["disadvantage on Wisdom saves".into()])
            .unwrap();
        assert!(conditions.create_custom("cursed", "", vec![]).is_err());
        assert!(conditions.create_custom("Prone", "", vec![]).is_err());
        assert_eq!(conditions.list_custom().len(), 1);

        conditions.apply(&id, "CURSED", "hag").unwrap().unwrap();
        assert_eq!(conditions.active_for(&id)[0].name, "Cursed");
    }

    #[test]
    fn test_edits_keep_unmodelled_entries() {
        let (mut store, id) = store_with_character();
        let sheet = json!([
            { "name": "Blessed", "duration": "1 min" },
            { "label": "custom-ui" },
            "Exhaustion",
        ]);
        store
            .update(CHARACTERS, &id, json!({ "conditions": sheet.clone() }))
            .unwrap();

        let mut conditions = ConditionService::new(&mut store);
        let applied = conditions.apply(&id, "Prone", "trip").unwrap().unwrap();
        let stored = applied.get_array("conditions").unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[..2], sheet.as_array().unwrap()[..2]);
        assert_eq!(stored[3]["name"], "Prone");

        let tired = conditions.apply(&id, "exhaustion", "no rest").unwrap().unwrap();
        let stored = tired.get_array("conditions").unwrap();
        assert_eq!(stored[2]["name"], "Exhaustion");
        assert_eq!(stored[2]["level"], 2);

        let cleared = conditions.remove(&id, "prone").unwrap().unwrap();
        let stored = cleared.get_array("conditions").unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[..2], sheet.as_array().unwrap()[..2]);
    }

    #[test]
    fn test_missing_character() {
        let mut store = DataService::in_memory();
        let mut conditions = ConditionService::new(&mut store);
        assert!(conditions.apply("nobody", "Prone", "trip").unwrap().is_none());
        assert!(conditions.remove("nobody", "Prone").unwrap().is_none());
        assert!(conditions.active_for("nobody").is_empty());
    }
}
