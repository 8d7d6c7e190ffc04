//! Party loot and its distribution.

use super::{require_text, with_fields};
use crate::entity::{new_id, Entity};
use crate::error::StoreResult;
use crate::kind::{CHARACTERS, LOOT};
use crate::store::{AddOptions, CampaignStore};
use serde_json::{json, Value};

/// Operations over the `loot` collection.
pub struct LootService<'a, S: CampaignStore> {
    store: &'a mut S,
}

impl<'a, S: CampaignStore> LootService<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn add(&mut self, name: &str, extra: Value) -> StoreResult<Entity> {
        let name = require_text(name, "loot name")?;
        let data = with_fields(extra, json!({ "name": name }))?;
        self.store.add(LOOT, data, AddOptions::default())
    }

    pub fn list(&mut self) -> Vec<Entity> {
        self.store.get_all(LOOT)
    }

    pub fn get(&self, id: &str) -> Option<Entity> {
        self.store.get(LOOT, id)
    }

    pub fn update(&mut self, id: &str, updates: Value) -> StoreResult<Option<Entity>> {
        self.store.update(LOOT, id, updates)
    }

    /// Loot nobody has claimed yet.
    pub fn unassigned(&mut self) -> Vec<Entity> {
        self.store
            .find(LOOT, |l| l.get("assignedTo").map_or(true, Value::is_null))
    }

    /// Hand loot to a character: mark it assigned and copy it into the
    /// character's inventory. Loot already held by someone else leaves that
    /// character's inventory first; re-assigning to the current holder
    /// changes nothing. `Ok(None)` if the loot or the character does not
    /// exist.
    pub fn assign(&mut self, loot_id: &str, character_id: &str) -> StoreResult<Option<Entity>> {
        let Some(loot) = self.get(loot_id) else {
            return Ok(None);
        };
        let Some(character) = self.store.get(CHARACTERS, character_id) else {
            return Ok(None);
        };

        match loot.get_str("assignedTo") {
            Some(holder) if holder == character_id => return Ok(Some(loot)),
            Some(holder) => self.take_from(holder, loot_id)?,
            None => {}
        }

        let mut inventory = character.get_array("inventory").cloned().unwrap_or_default();
        inventory.push(json!({
            "id": new_id(),
            "name": loot.get_str("name").unwrap_or_default(),
            "quantity": loot.get_i64("quantity").unwrap_or(1),
            "lootId": loot_id,
        }));
        self.store
            .update(CHARACTERS, character_id, json!({ "inventory": inventory }))?;

        self.update(loot_id, json!({ "assignedTo": character_id }))
    }

    /// Drop the inventory entries copied from `loot_id` off `holder`, if
    /// that character still exists.
    fn take_from(&mut self, holder: &str, loot_id: &str) -> StoreResult<()> {
        let Some(character) = self.store.get(CHARACTERS, holder) else {
            return Ok(());
        };
        let Some(inventory) = character.get_array("inventory") else {
            return Ok(());
        };

        let remaining: Vec<Value> = inventory
            .iter()
            .filter(|item| item.get("lootId").and_then(Value::as_str) != Some(loot_id))
            .cloned()
            .collect();
        if remaining.len() != inventory.len() {
            self.store
                .update(CHARACTERS, holder, json!({ "inventory": remaining }))?;
        }
        Ok(())
    }

    /// Sum of `value * quantity` over all loot.
    pub fn total_value(&mut self) -> f64 {
        self.list()
            .iter()
            .map(|l| l.get_f64("value").unwrap_or(0.0) * l.get_f64("quantity").unwrap_or(1.0))
            .sum()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.store.remove(LOOT, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::CharacterService;
    use crate::DataService;

    #[test]
    fn test_add_and_value() {
        let mut store = DataService::in_memory();
        let mut loot = LootService::new(&mut store);

        loot.add("Gold coins", json!({ "type": "currency", "quantity": 50, "value": 1 }))
            .unwrap();
        loot.add("Ruby", json!({ "value": 500, "rarity": "rare" })).unwrap();

        assert_eq!(loot.list().len(), 2);
        assert_eq!(loot.total_value(), 550.0);
        assert_eq!(loot.unassigned().len(), 2);
    }

    #[test]
    fn test_assign_to_character() {
        let mut store = DataService::in_memory();
        let character_id = CharacterService::new(&mut store)
            .create("Lyra", Value::Null)
            .unwrap()
            .id()
            .unwrap()
            .to_string();

        let mut loot = LootService::new(&mut store);
        let cloak = loot.add("Cloak of Elvenkind", Value::Null).unwrap();
        let cloak_id = cloak.id().unwrap();

        let assigned = loot.assign(cloak_id, &character_id).unwrap().unwrap();
        assert_eq!(assigned.get_str("assignedTo"), Some(character_id.as_str()));
        assert!(loot.unassigned().is_empty());
        assert!(loot.assign(cloak_id, "nobody").unwrap().is_none());
        assert!(loot.assign("nothing", &character_id).unwrap().is_none());

        let character = CharacterService::new(&mut store).get(&character_id).unwrap();
        let inventory = character.get_array("inventory").unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0]["name"], "Cloak of Elvenkind");
        assert_eq!(inventory[0]["lootId"], cloak.id().unwrap());
    }

    #[test]
    fn test_reassign_moves_loot() {
        let mut store = DataService::in_memory();
        let mut characters = CharacterService::new(&mut store);
        let lyra = characters.create("Lyra", Value::Null).unwrap().id().unwrap().to_string();
        let ezren = characters
            .create("Ezren", json!({ "inventory": [{ "id": "staff", "name": "Staff" }] }))
            .unwrap()
            .id()
            .unwrap()
            .to_string();

        let mut loot = LootService::new(&mut store);
        let wand_id = loot.add("Wand of Magic Missile", Value::Null).unwrap().id().unwrap().to_string();
        loot.assign(&wand_id, &lyra).unwrap().unwrap();
        loot.assign(&wand_id, &ezren).unwrap().unwrap();
        let again = loot.assign(&wand_id, &ezren).unwrap().unwrap();
        assert_eq!(again.get_str("assignedTo"), Some(ezren.as_str()));

        let inventory_len = |store: &DataService, id: &str| {
            store
                .get(CHARACTERS, id)
                .and_then(|c| c.get_array("inventory").map(Vec::len))
                .unwrap_or(0)
        };
        assert_eq!(inventory_len(&store, &lyra), 0);
        assert_eq!(inventory_len(&store, &ezren), 2);
    }
}
