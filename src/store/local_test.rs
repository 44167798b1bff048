use serde_json::json;

use super::*;
use crate::error::ErrorCode;

// =============================================================
// Shared behaviour
// =============================================================

fn exercise(store: &dyn LocalStore) {
    assert_eq!(store.get("maps", "m1").unwrap(), None);
    assert!(store.list("maps").unwrap().is_empty());

    store.put("maps", "m2", &json!({ "shapes": [] })).unwrap();
    store.put("maps", "m1", &json!({ "shapes": [1] })).unwrap();
    store.put("characters", "c1", &json!({ "name": "Hero" })).unwrap();
    assert_eq!(store.get("maps", "m1").unwrap(), Some(json!({ "shapes": [1] })));
    assert_eq!(store.list("maps").unwrap(), vec!["m1", "m2"]);

    store.put("maps", "m1", &json!({ "shapes": [1, 2] })).unwrap();
    assert_eq!(store.get("maps", "m1").unwrap(), Some(json!({ "shapes": [1, 2] })));

    store.set_active("maps", Some("m1")).unwrap();
    assert_eq!(store.active("maps").unwrap().as_deref(), Some("m1"));
    assert_eq!(store.active("characters").unwrap(), None);

    assert!(store.remove("maps", "m1").unwrap());
    assert!(!store.remove("maps", "m1").unwrap());
    assert_eq!(store.active("maps").unwrap(), None, "removing the active document clears it");
    assert_eq!(store.list("maps").unwrap(), vec!["m2"]);

    store.set_active("maps", Some("m2")).unwrap();
    store.set_active("maps", None).unwrap();
    assert_eq!(store.active("maps").unwrap(), None);
}

#[test]
fn memory_store_contract() {
    exercise(&MemoryStore::new());
}

#[test]
fn file_store_contract() {
    let dir = tempfile::tempdir().unwrap();
    exercise(&FileStore::new(dir.path()));
}

// =============================================================
// FileStore specifics
// =============================================================

#[test]
fn file_store_layout() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.put("characters", "hero", &json!({ "id": "hero" })).unwrap();
    store.set_active("characters", Some("hero")).unwrap();
    assert!(dir.path().join("characters/hero.json").is_file());
    let active = std::fs::read_to_string(dir.path().join("characters/.active")).unwrap();
    assert_eq!(active, "hero");
    assert!(!dir.path().join("characters/hero.tmp").exists());
}

#[test]
fn file_store_ignores_non_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.put("maps", "a", &json!({})).unwrap();
    std::fs::write(dir.path().join("maps/notes.txt"), "x").unwrap();
    assert_eq!(store.list("maps").unwrap(), vec!["a"]);
}

#[test]
fn file_store_reports_corrupt_documents() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    std::fs::create_dir_all(dir.path().join("maps")).unwrap();
    std::fs::write(dir.path().join("maps/bad.json"), "{").unwrap();
    let err = store.get("maps", "bad").unwrap_err();
    assert_eq!(err.error_code(), "E_STORE_JSON");
}

#[test]
fn path_escaping_keys_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    for key in ["", "..", "a/b", "a.b"] {
        let err = store.put("maps", key, &json!({})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)), "key {key:?}");
        assert!(!err.retryable());
    }
    assert!(matches!(store.list("../etc"), Err(StoreError::InvalidKey(_))));
}
