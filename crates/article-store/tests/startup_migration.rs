//! End-to-end startup migration against real files.
//!
//! Covers the whole contract: read once, migrate in memory, write once, and
//! never touch the file when anything goes wrong.

use std::fs;
use std::path::Path;

use article_store::{
    DocumentStatus, DocumentStore, EngineError, FileStore, MemoryStore, MigrationEngine,
    MigrationOutcome,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

fn v1_fixture() -> Value {
    json!({
        "version": 1,
        "articles": [
            { "id": "7f3c", "title": "Rust ownership", "body": "Borrowing rules", "tags": ["rust", "memory"] },
            { "id": "a910", "title": "Shopping", "body": "milk, eggs", "tags": [] },
            { "id": "b2e4", "title": "Ideas", "body": "", "tags": ["todo", "later", "ideas"] }
        ]
    })
}

#[test]
fn fresh_install_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");

    let mut engine = MigrationEngine::new(FileStore::new(&path));
    assert_eq!(engine.migrate().unwrap(), MigrationOutcome::Absent);
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn v1_file_is_rewritten_at_current_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_json(&path, &v1_fixture());

    let mut engine = MigrationEngine::new(FileStore::new(&path));
    assert_eq!(
        engine.migrate().unwrap(),
        MigrationOutcome::Migrated { from: 1, to: 4 }
    );

    let doc = read_json(&path);
    assert_eq!(doc["version"], json!(4));
    let list = doc["articles"]["list"].as_array().unwrap();
    assert_eq!(list.len(), 3);

    let ids: Vec<_> = list.iter().map(|a| a["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["7f3c", "a910", "b2e4"]);

    assert_eq!(list[0]["tags"], json!(["memory", "rust"]));
    assert_eq!(list[2]["tags"], json!(["ideas", "later", "todo"]));
    assert_eq!(list[0]["created"], json!("2020-01-01T00:00:00.000Z"));
    assert_eq!(list[1]["created"], json!("2020-01-01T00:00:01.000Z"));
    assert_eq!(list[2]["updated"], json!("2020-01-01T00:00:02.000Z"));
    assert!(list.iter().all(|a| a["likes"] == json!(0)));
    assert!(list.iter().all(|a| a["isDeleted"] == json!(false)));
    assert_eq!(list[0]["body"], json!("Borrowing rules"));
}

#[test]
fn migrating_twice_equals_migrating_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_json(&path, &v1_fixture());

    MigrationEngine::new(FileStore::new(&path)).migrate().unwrap();
    let once = fs::read(&path).unwrap();

    let outcome = MigrationEngine::new(FileStore::new(&path)).migrate().unwrap();
    assert_eq!(outcome, MigrationOutcome::Current { version: 4 });
    assert_eq!(fs::read(&path).unwrap(), once);
}

#[test]
fn current_file_is_not_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    let raw = b"{\n  \"version\": 4,\n  \"articles\": { \"list\": [] }\n}\n";
    fs::write(&path, raw).unwrap();
    let modified = fs::metadata(&path).unwrap().modified().unwrap();

    let mut engine = MigrationEngine::new(FileStore::new(&path));
    assert_eq!(
        engine.migrate().unwrap(),
        MigrationOutcome::Current { version: 4 }
    );
    assert_eq!(fs::read(&path).unwrap(), raw);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
}

#[test]
fn future_file_is_refused_and_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    let raw = br#"{"version":12,"articles":{"pages":[]}}"#;
    fs::write(&path, raw).unwrap();

    let mut engine = MigrationEngine::new(FileStore::new(&path));
    let err = engine.migrate().unwrap_err();
    assert!(matches!(
        err,
        EngineError::UnsupportedFutureVersion {
            found: 12,
            current: 4,
            ..
        }
    ));
    assert!(err.to_string().contains("articles.json"));
    assert_eq!(fs::read(&path).unwrap(), raw);
}

#[test]
fn malformed_file_is_refused_and_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    let raw = br#"{"version":1,"articles":[{"id":"1","tags":["a"]}"#;
    fs::write(&path, raw).unwrap();

    let mut engine = MigrationEngine::new(FileStore::new(&path));
    assert!(matches!(
        engine.migrate().unwrap_err(),
        EngineError::MalformedDocument { .. }
    ));
    assert_eq!(fs::read(&path).unwrap(), raw);
}

#[test]
fn backup_holds_the_original_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_json(&path, &v1_fixture());
    let original = fs::read(&path).unwrap();

    let store = FileStore::new(&path).keep_backup(true);
    let backup = store.backup_path();
    MigrationEngine::new(store).migrate().unwrap();

    assert_eq!(fs::read(&backup).unwrap(), original);
    assert_eq!(read_json(&path)["version"], json!(4));
}

#[test]
fn unknown_top_level_fields_survive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    let mut fixture = v1_fixture();
    fixture["settings"] = json!({ "sort": "newest" });
    write_json(&path, &fixture);

    MigrationEngine::new(FileStore::new(&path)).migrate().unwrap();
    assert_eq!(read_json(&path)["settings"], json!({ "sort": "newest" }));
}

#[test]
fn status_then_migrate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_json(&path, &json!({ "version": 2, "articles": [] }));

    let mut engine = MigrationEngine::new(FileStore::new(&path));
    assert_eq!(
        engine.status().unwrap(),
        DocumentStatus::Pending {
            version: 2,
            steps: vec![(2, 3), (3, 4)]
        }
    );
    engine.migrate().unwrap();
    assert_eq!(
        engine.status().unwrap(),
        DocumentStatus::Current { version: 4 }
    );
    assert!(engine.store().exists().unwrap());
}

#[cfg(unix)]
#[test]
fn migration_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_json(&path, &json!({ "version": 3, "articles": [] }));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    MigrationEngine::new(FileStore::new(&path)).migrate().unwrap();

    assert_eq!(read_json(&path)["version"], json!(4));
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
}

#[test]
fn v3_timestamps_survive_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");
    write_json(
        &path,
        &json!({
            "version": 3,
            "articles": [{
                "id": "1", "title": "t", "body": "b", "tags": ["a"],
                "created": "2021-01-01T00:00:00.123456Z",
                "updated": "2021-01-01T02:00:00+02:00",
                "likes": 2, "isDeleted": false
            }]
        }),
    );

    MigrationEngine::new(FileStore::new(&path)).migrate().unwrap();

    let record = &read_json(&path)["articles"]["list"][0];
    assert_eq!(record["created"], json!("2021-01-01T00:00:00.123456Z"));
    assert_eq!(record["updated"], json!("2021-01-01T02:00:00+02:00"));
}

fn v1_document(records: &[(String, Vec<String>)]) -> Vec<u8> {
    let articles: Vec<_> = records
        .iter()
        .map(|(id, tags)| json!({ "id": id, "title": id, "body": "", "tags": tags }))
        .collect();
    serde_json::to_vec(&json!({ "version": 1, "articles": articles })).unwrap()
}

proptest! {
    #[test]
    fn any_v1_document_is_written_exactly_once(
        records in prop::collection::vec(
            ("[a-z]{1,6}", prop::collection::vec("[a-z]{1,4}", 0..4)),
            0..16,
        )
    ) {
        let mut engine = MigrationEngine::new(MemoryStore::with_contents(v1_document(&records)));

        prop_assert_eq!(
            engine.migrate().unwrap(),
            MigrationOutcome::Migrated { from: 1, to: 4 }
        );
        let once = engine.store().contents().unwrap().to_vec();

        prop_assert_eq!(
            engine.migrate().unwrap(),
            MigrationOutcome::Current { version: 4 }
        );
        prop_assert_eq!(engine.store().contents().unwrap(), once.as_slice());
        prop_assert_eq!(engine.store().write_count(), 1);
    }

    #[test]
    fn any_future_version_is_refused(version in 5u32..=u32::MAX) {
        let raw = serde_json::to_vec(&json!({ "version": version })).unwrap();
        let mut engine = MigrationEngine::new(MemoryStore::with_contents(raw.clone()));

        let refused = matches!(
            engine.migrate(),
            Err(EngineError::UnsupportedFutureVersion { .. })
        );
        prop_assert!(refused);
        prop_assert_eq!(engine.store().contents().unwrap(), raw.as_slice());
    }
}
