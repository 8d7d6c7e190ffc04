//! Persistence, hydration and backup tests.

use campaign_core::backup::{backup_path, list_backups, SavedSnapshot};
use campaign_core::kind::{CHARACTERS, GUILD_ACTIVITIES, NOTES, QUESTS};
use campaign_core::{
    AddOptions, CampaignStore, DataService, FileStorage, MemoryStorage, State, Storage,
    StoreConfig,
};
use serde_json::json;
use tempfile::TempDir;

const KEY: &str = "campaignData";

#[test]
fn test_every_mutation_persists() {
    let mut store = DataService::in_memory();
    let note = store
        .add(NOTES, json!({ "title": "Sandpoint" }), AddOptions::default())
        .unwrap();

    let persisted = store.storage().get_item(KEY).unwrap().unwrap();
    assert!(persisted.contains("Sandpoint"));

    store.remove(NOTES, note.id().unwrap());
    let persisted = State::from_json(&store.storage().get_item(KEY).unwrap().unwrap()).unwrap();
    assert_eq!(persisted.sequence(NOTES).map(Vec::len), Some(0));
}

#[test]
fn test_reload_from_storage() {
    let mut store = DataService::in_memory();
    let quest = store
        .add(
            QUESTS,
            json!({ "title": "Skinsaw Murders", "type": "main", "status": "ongoing" }),
            AddOptions::default(),
        )
        .unwrap();
    let storage = store.close().unwrap();

    let reopened = DataService::new(storage, StoreConfig::default());
    assert_eq!(reopened.get(QUESTS, quest.id().unwrap()), Some(quest));
}

#[test]
fn test_quota_failure_keeps_memory_state() {
    let mut store = DataService::new(MemoryStorage::with_quota(64), StoreConfig::default());

    let note = store
        .add(NOTES, json!({ "title": "This will not fit in 64 bytes of storage" }), AddOptions::default())
        .unwrap();
    assert_eq!(store.get(NOTES, note.id().unwrap()), Some(note));
    assert!(store.storage().get_item(KEY).unwrap().is_none());

    assert!(store.close().is_err());
}

#[test]
fn test_corrupt_storage_starts_fresh() {
    let mut storage = MemoryStorage::new();
    storage.set_item(KEY, "{ not json").unwrap();

    let store = DataService::new(storage, StoreConfig::default());
    assert_eq!(store.export_state(), State::initial());
    assert_eq!(store.storage().get_item(KEY).unwrap().as_deref(), Some("{ not json"));
}

#[test]
fn test_legacy_collections_migrate_on_hydrate() {
    let mut storage = MemoryStorage::new();
    let legacy = json!({
        "activeQuests": [{ "id": "q1", "title": "Old", "type": "main", "status": "ongoing" }],
        "players": [{ "id": "p1", "name": "Seoni" }],
        "characters": [{ "id": "c1", "name": "Merisiel" }],
        "guildActivities": [{ "id": "g1", "name": "Patrol", "type": "mission" }],
    });
    storage.set_item(KEY, &legacy.to_string()).unwrap();

    let mut store = DataService::new(storage, StoreConfig::default());

    assert!(store.get(QUESTS, "q1").is_some());
    assert!(store.get(GUILD_ACTIVITIES, "g1").is_some());
    let names: Vec<String> = store
        .get_all(CHARACTERS)
        .iter()
        .filter_map(|c| c.get_str("name").map(str::to_string))
        .collect();
    assert_eq!(names, ["Merisiel", "Seoni"]);

    let persisted = State::from_json(&store.storage().get_item(KEY).unwrap().unwrap()).unwrap();
    assert!(persisted.lookup("players").is_none());
    assert!(persisted.lookup("activeQuests").is_none());
    assert_eq!(persisted.sequence(CHARACTERS).map(Vec::len), Some(2));
}

#[test]
fn test_file_storage_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::new()
        .with_data_dir(dir.path())
        .with_storage_key("runelords")
        .with_pretty(true);

    let mut store = DataService::open(config.clone()).unwrap();
    let note = store
        .add(NOTES, json!({ "title": "Thistletop" }), AddOptions::default())
        .unwrap();
    store.close().unwrap();

    let file = FileStorage::new(dir.path()).unwrap().path_for("runelords");
    assert!(file.exists());

    let reopened = DataService::open(config).unwrap();
    assert_eq!(reopened.get(NOTES, note.id().unwrap()), Some(note));
}

#[test]
fn test_inspect_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::new().with_data_dir(dir.path());
    let mut storage = FileStorage::new(dir.path()).unwrap();
    let legacy = r#"{"players":[{"id":"p1","name":"Harsk"}]}"#;
    storage.set_item(KEY, legacy).unwrap();

    let mut store = DataService::inspect(config).unwrap();
    assert_eq!(store.get_all(CHARACTERS).len(), 1);
    assert_eq!(storage.get_item(KEY).unwrap().as_deref(), Some(legacy));
}

#[tokio::test]
async fn test_backup_and_restore() {
    let dir = TempDir::new().unwrap();
    let mut store = DataService::in_memory();
    store
        .add(NOTES, json!({ "title": "Before the fire" }), AddOptions::default())
        .unwrap();

    let path = backup_path(dir.path(), "Runelords");
    SavedSnapshot::new(store.export_state(), "Runelords")
        .save_json(&path)
        .await
        .unwrap();

    store.clear_data();
    assert!(store.get_all(NOTES).is_empty());

    let backups = list_backups(dir.path()).await.unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].metadata.total_entities, 1);

    let snapshot = SavedSnapshot::load_json(&backups[0].path).await.unwrap();
    store.import_data(snapshot.state).unwrap();
    assert_eq!(store.get_all(NOTES).len(), 1);
}
