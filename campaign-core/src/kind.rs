//! Recognized entity kinds and their collections.
//!
//! Each kind has exactly one canonical collection. Nested collections are
//! addressed with a dotted path (`guildLogs.activities`).

use serde_json::{json, Map, Value};

pub const QUESTS: &str = "quests";
pub const CHARACTERS: &str = "characters";
pub const NPCS: &str = "npcs";
pub const LOCATIONS: &str = "locations";
pub const LOOT: &str = "loot";
pub const NOTES: &str = "notes";
pub const CONDITIONS: &str = "conditions";
pub const GUILD_LOGS: &str = "guildLogs";
pub const GUILD_ACTIVITIES: &str = "guildLogs.activities";
pub const GUILD_RESOURCES: &str = "guildLogs.resources";

/// Kinds of entity the store knows defaults and required fields for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Quest,
    Character,
    Npc,
    Location,
    Loot,
    Note,
    Condition,
    GuildActivity,
    GuildResource,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Quest,
        EntityKind::Character,
        EntityKind::Npc,
        EntityKind::Location,
        EntityKind::Loot,
        EntityKind::Note,
        EntityKind::Condition,
        EntityKind::GuildActivity,
        EntityKind::GuildResource,
    ];

    /// Display name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Quest => "Quest",
            EntityKind::Character => "Character",
            EntityKind::Npc => "NPC",
            EntityKind::Location => "Location",
            EntityKind::Loot => "Loot",
            EntityKind::Note => "Note",
            EntityKind::Condition => "Condition",
            EntityKind::GuildActivity => "Guild activity",
            EntityKind::GuildResource => "Guild resource",
        }
    }

    /// Canonical collection path.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Quest => QUESTS,
            EntityKind::Character => CHARACTERS,
            EntityKind::Npc => NPCS,
            EntityKind::Location => LOCATIONS,
            EntityKind::Loot => LOOT,
            EntityKind::Note => NOTES,
            EntityKind::Condition => CONDITIONS,
            EntityKind::GuildActivity => GUILD_ACTIVITIES,
            EntityKind::GuildResource => GUILD_RESOURCES,
        }
    }

    pub fn from_collection(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.collection() == path)
    }

    /// Fields every entity of this kind must carry (besides `id`).
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Quest => &["title", "type", "status"],
            EntityKind::Note => &["title"],
            EntityKind::GuildActivity => &["name", "type"],
            EntityKind::Character
            | EntityKind::Npc
            | EntityKind::Location
            | EntityKind::Loot
            | EntityKind::Condition
            | EntityKind::GuildResource => &["name"],
        }
    }

    /// Domain defaults that caller-supplied fields are merged over on `add`.
    pub fn defaults(&self) -> Map<String, Value> {
        let defaults = match self {
            EntityKind::Quest => json!({
                "title": "",
                "description": "",
                "type": "side",
                "status": "ongoing",
                "objectives": [],
                "rewards": [],
            }),
            EntityKind::Character => json!({
                "name": "",
                "type": "player",
                "race": "",
                "class": "",
                "level": 1,
                "hitPoints": { "current": 10, "max": 10 },
                "inventory": [],
                "conditions": [],
                "notes": "",
            }),
            EntityKind::Npc => json!({
                "name": "",
                "role": "",
                "location": "",
                "disposition": "neutral",
                "description": "",
            }),
            EntityKind::Location => json!({
                "name": "",
                "type": "",
                "description": "",
                "discovered": false,
            }),
            EntityKind::Loot => json!({
                "name": "",
                "type": "item",
                "quantity": 1,
                "value": 0,
                "rarity": "common",
                "assignedTo": null,
                "description": "",
            }),
            EntityKind::Note => json!({
                "title": "",
                "content": "",
                "category": "general",
                "tags": [],
            }),
            EntityKind::Condition => json!({
                "name": "",
                "description": "",
                "effects": [],
            }),
            EntityKind::GuildActivity => json!({
                "name": "",
                "type": "mission",
                "status": "planned",
                "participants": [],
                "notes": "",
            }),
            EntityKind::GuildResource => json!({
                "name": "",
                "type": "gold",
                "quantity": 0,
                "notes": "",
            }),
        };

        match defaults {
            Value::Object(fields) => fields,
            _ => Map::new(),
        }
    }
}
