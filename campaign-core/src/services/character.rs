//! Party and character sheets.

use super::{require_text, with_fields};
use crate::entity::{new_id, Entity, ID};
use crate::error::StoreResult;
use crate::kind::CHARACTERS;
use crate::store::{AddOptions, CampaignStore};
use serde_json::{json, Value};

/// Character operations over the `characters` collection.
pub struct CharacterService<'a, S: CampaignStore> {
    store: &'a mut S,
}

impl<'a, S: CampaignStore> CharacterService<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Create a character. `extra` may carry any other sheet fields.
    pub fn create(&mut self, name: &str, extra: Value) -> StoreResult<Entity> {
        let name = require_text(name, "character name")?;
        let data = with_fields(extra, json!({ "name": name }))?;
        self.store.add(CHARACTERS, data, AddOptions::default())
    }

    pub fn list(&mut self) -> Vec<Entity> {
        self.store.get_all(CHARACTERS)
    }

    /// Player characters only.
    pub fn party(&mut self) -> Vec<Entity> {
        self.store
            .find(CHARACTERS, |c| c.get_str("type") == Some("player"))
    }

    pub fn get(&self, id: &str) -> Option<Entity> {
        self.store.get(CHARACTERS, id)
    }

    pub fn update(&mut self, id: &str, updates: Value) -> StoreResult<Option<Entity>> {
        self.store.update(CHARACTERS, id, updates)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.store.remove(CHARACTERS, id)
    }

    /// Append an item to the character's inventory, giving it an id if it
    /// has none. `Ok(None)` if the character does not exist.
    pub fn add_inventory_item(&mut self, id: &str, item: Value) -> StoreResult<Option<Entity>> {
        let Some(character) = self.get(id) else {
            return Ok(None);
        };

        let mut item = with_fields(item, Value::Null)?;
        if let Value::Object(fields) = &mut item {
            if !fields.get(ID).is_some_and(Value::is_string) {
                fields.insert(ID.to_string(), Value::String(new_id()));
            }
        }

        let mut inventory = character.get_array("inventory").cloned().unwrap_or_default();
        inventory.push(item);
        self.update(id, json!({ "inventory": inventory }))
    }

    /// Remove an inventory item by its id. The character is returned
    /// unchanged if it does not hold that item.
    pub fn remove_inventory_item(&mut self, id: &str, item_id: &str) -> StoreResult<Option<Entity>> {
        let Some(character) = self.get(id) else {
            return Ok(None);
        };

        let inventory = character.get_array("inventory").cloned().unwrap_or_default();
        let before = inventory.len();
        let remaining: Vec<Value> = inventory
            .into_iter()
            .filter(|item| item.get(ID).and_then(Value::as_str) != Some(item_id))
            .collect();

        if remaining.len() == before {
            return Ok(Some(character));
        }
        self.update(id, json!({ "inventory": remaining }))
    }

    /// Set current hit points, clamped to `0..=max`.
    pub fn set_hit_points(&mut self, id: &str, current: i64) -> StoreResult<Option<Entity>> {
        let Some(character) = self.get(id) else {
            return Ok(None);
        };

        let max = character
            .pointer("/hitPoints/max")
            .and_then(Value::as_i64)
            .unwrap_or(current.max(0));
        let current = current.clamp(0, max.max(0));
        self.update(id, json!({ "hitPoints": { "current": current, "max": max } }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::DataService;

    #[test]
    fn test_create_and_party() {
        let mut store = DataService::in_memory();
        let mut characters = CharacterService::new(&mut store);

        let thorin = characters
            .create("Thorin", json!({ "class": "fighter", "level": 3 }))
            .unwrap();
        characters
            .create("Ameiko", json!({ "type": "npc" }))
            .unwrap();

        assert_eq!(thorin.get_str("class"), Some("fighter"));
        assert_eq!(thorin.get_i64("level"), Some(3));
        assert_eq!(characters.list().len(), 2);

        let party = characters.party();
        assert_eq!(party.len(), 1);
        assert_eq!(party[0].get_str("name"), Some("Thorin"));
    }

    #[test]
    fn test_create_requires_name() {
        let mut store = DataService::in_memory();
        let err = CharacterService::new(&mut store)
            .create("  ", Value::Null)
            .unwrap_err();
        assert!(matches!(err, StoreError::Precondition(_)));
        assert_eq!(store.count(CHARACTERS), 0);
    }

    #[test]
    fn test_inventory() {
        let mut store = DataService::in_memory();
        let mut characters = CharacterService::new(&mut store);
        let id = characters.create("Lyra", Value::Null).unwrap().id().unwrap().to_string();

        let with_rope = characters
            .add_inventory_item(&id, json!({ "name": "Rope" }))
            .unwrap()
            .unwrap();
        let inventory = with_rope.get_array("inventory").unwrap();
        assert_eq!(inventory.len(), 1);
        let rope_id = inventory[0]["id"].as_str().unwrap().to_string();

        let unchanged = characters
            .remove_inventory_item(&id, "no-such-item")
            .unwrap()
            .unwrap();
        assert_eq!(unchanged, with_rope);

        let emptied = characters.remove_inventory_item(&id, &rope_id).unwrap().unwrap();
        assert!(emptied.get_array("inventory").unwrap().is_empty());

        assert!(characters
            .add_inventory_item("missing", json!({ "name": "Torch" }))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_hit_points_are_clamped() {
        let mut store = DataService::in_memory();
        let mut characters = CharacterService::new(&mut store);
        let id = characters
            .create("Bram", json!({ "hitPoints": { "current": 20, "max": 20 } }))
            .unwrap()
            .id()
            .unwrap()
            .to_string();

        let hurt = characters.set_hit_points(&id, -5).unwrap().unwrap();
        assert_eq!(hurt.pointer("/hitPoints/current"), Some(&json!(0)));

        let healed = characters.set_hit_points(&id, 99).unwrap().unwrap();
        assert_eq!(healed.pointer("/hitPoints/current"), Some(&json!(20)));
        assert_eq!(healed.pointer("/hitPoints/max"), Some(&json!(20)));
    }
}
