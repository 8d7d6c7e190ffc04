//! Session notes.

use super::{require_text, with_fields};
use crate::entity::Entity;
use crate::error::StoreResult;
use crate::kind::NOTES;
use crate::store::{AddOptions, CampaignStore};
use serde_json::{json, Value};

/// Operations over the `notes` collection.
pub struct NotesService<'a, S: CampaignStore> {
    store: &'a mut S,
}

impl<'a, S: CampaignStore> NotesService<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn create(&mut self, title: &str, content: &str) -> StoreResult<Entity> {
        self.create_with(title, content, Value::Null)
    }

    /// Create a note with extra fields such as `category` or `tags`.
    pub fn create_with(&mut self, title: &str, content: &str, extra: Value) -> StoreResult<Entity> {
        let title = require_text(title, "note title")?;
        let data = with_fields(extra, json!({ "title": title, "content": content }))?;
        self.store.add(NOTES, data, AddOptions::default())
    }

    pub fn list(&mut self) -> Vec<Entity> {
        self.store.get_all(NOTES)
    }

    /// Notes whose title, content or tags contain `query`, ignoring case.
    pub fn search(&mut self, query: &str) -> Vec<Entity> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.list();
        }
        self.store.find(NOTES, |note| {
            let contains = |field: &str| {
                note.get_str(field)
                    .is_some_and(|text| text.to_lowercase().contains(&query))
            };
            let tagged = note.get_array("tags").is_some_and(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .any(|tag| tag.to_lowercase().contains(&query))
            });
            contains("title") || contains("content") || tagged
        })
    }

    pub fn by_category(&mut self, category: &str) -> Vec<Entity> {
        self.store
            .find(NOTES, |note| note.get_str("category") == Some(category))
    }

    /// Add a tag unless the note already has it.
    pub fn tag(&mut self, id: &str, tag: &str) -> StoreResult<Option<Entity>> {
        let tag = require_text(tag, "tag")?;
        let Some(note) = self.store.get(NOTES, id) else {
            return Ok(None);
        };

        let mut tags = note.get_array("tags").cloned().unwrap_or_default();
        if tags.iter().any(|t| t.as_str() == Some(tag.as_str())) {
            return Ok(Some(note));
        }
        tags.push(Value::String(tag));
        self.store.update(NOTES, id, json!({ "tags": tags }))
    }

    pub fn update(&mut self, id: &str, updates: Value) -> StoreResult<Option<Entity>> {
        self.store.update(NOTES, id, updates)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.store.remove(NOTES, id)
    }
}
