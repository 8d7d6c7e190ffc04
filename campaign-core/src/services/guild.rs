//! Guild logs: downtime activities and shared resources.

use super::{require_text, with_fields};
use crate::entity::Entity;
use crate::error::{StoreError, StoreResult};
use crate::kind::{GUILD_ACTIVITIES, GUILD_RESOURCES};
use crate::store::{AddOptions, CampaignStore};
use crate::timestamp;
use serde_json::{json, Value};

/// Statuses an activity can be in.
pub const ACTIVITY_STATUSES: &[&str] = &["planned", "in-progress", "completed", "failed"];

/// Operations over `guildLogs.activities` and `guildLogs.resources`.
pub struct GuildService<'a, S: CampaignStore> {
    store: &'a mut S,
}

impl<'a, S: CampaignStore> GuildService<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    // =========================================================================
    // Activities
    // =========================================================================

    pub fn add_activity(
        &mut self,
        name: &str,
        activity_type: &str,
        extra: Value,
    ) -> StoreResult<Entity> {
        let name = require_text(name, "activity name")?;
        let activity_type = require_text(activity_type, "activity type")?;
        let data = with_fields(extra, json!({ "name": name, "type": activity_type }))?;
        self.store.add(GUILD_ACTIVITIES, data, AddOptions::default())
    }

    pub fn activities(&mut self) -> Vec<Entity> {
        self.store.get_all(GUILD_ACTIVITIES)
    }

    pub fn activities_with_status(&mut self, status: &str) -> Vec<Entity> {
        self.store
            .find(GUILD_ACTIVITIES, |a| a.get_str("status") == Some(status))
    }

    pub fn set_activity_status(&mut self, id: &str, status: &str) -> StoreResult<Option<Entity>> {
        if !ACTIVITY_STATUSES.contains(&status) {
            return Err(StoreError::Precondition(format!(
                "unknown activity status '{status}'"
            )));
        }
        self.store
            .update(GUILD_ACTIVITIES, id, json!({ "status": status }))
    }

    /// Mark an activity completed and record how it turned out.
    pub fn complete_activity(&mut self, id: &str, outcome: &str) -> StoreResult<Option<Entity>> {
        self.store.update(
            GUILD_ACTIVITIES,
            id,
            json!({
                "status": "completed",
                "outcome": outcome,
                "completedAt": timestamp::now(),
            }),
        )
    }

    pub fn remove_activity(&mut self, id: &str) -> bool {
        self.store.remove(GUILD_ACTIVITIES, id)
    }

    // =========================================================================
    // Resources
    // =========================================================================

    pub fn add_resource(&mut self, name: &str, quantity: i64, extra: Value) -> StoreResult<Entity> {
        let name = require_text(name, "resource name")?;
        let data = with_fields(extra, json!({ "name": name, "quantity": quantity.max(0) }))?;
        self.store.add(GUILD_RESOURCES, data, AddOptions::default())
    }

    pub fn resources(&mut self) -> Vec<Entity> {
        self.store.get_all(GUILD_RESOURCES)
    }

    /// Add `delta` to a resource's quantity. The quantity never drops below
    /// zero.
    pub fn adjust_resource(&mut self, id: &str, delta: i64) -> StoreResult<Option<Entity>> {
        let Some(resource) = self.store.get(GUILD_RESOURCES, id) else {
            return Ok(None);
        };
        let quantity = resource.get_i64("quantity").unwrap_or(0);
        let adjusted = quantity.saturating_add(delta).max(0);
        self.store
            .update(GUILD_RESOURCES, id, json!({ "quantity": adjusted }))
    }

    pub fn remove_resource(&mut self, id: &str) -> bool {
        self.store.remove(GUILD_RESOURCES, id)
    }
}
