//! # Startup migration: bring an old document up to date
//!
//! Writes a v1 document to a temporary directory, runs the engine the way an
//! application would at startup, then runs it again to show the second run
//! is a no-op.
//!
//! Run: `cargo run -p article-store --example startup`

use std::fs;

use article_store::{run_startup_migration, DocumentStatus, FileStore, MigrationEngine};
use serde_json::{json, Value};

fn main() {
    println!("=== Startup Migration Example ===\n");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.json");

    // ── Step 1: An install from the first release ──────────────────
    println!("1. Writing a v1 document...");
    let v1 = json!({
        "version": 1,
        "articles": [
            { "id": "1", "title": "Welcome", "body": "First note", "tags": ["intro", "help"] },
            { "id": "2", "title": "Groceries", "body": "milk", "tags": [] }
        ]
    });
    fs::write(&path, serde_json::to_vec_pretty(&v1).unwrap()).unwrap();
    println!("   {}", path.display());

    // ── Step 2: What would run ──────────────────────────────────────
    let store = FileStore::new(&path).keep_backup(true);
    let mut engine = MigrationEngine::builder(store).pretty(true).build();

    if let DocumentStatus::Pending { version, steps } = engine.status().unwrap() {
        println!("\n2. Document is at v{version}; pending steps:");
        for (from, to) in steps {
            println!("   v{from} → v{to}");
        }
    }

    // ── Step 3: Migrate once ────────────────────────────────────────
    println!("\n3. Migrating...");
    let outcome = run_startup_migration(&mut engine).unwrap();
    println!("   {outcome:?}");

    let migrated: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    println!("{}", serde_json::to_string_pretty(&migrated).unwrap());

    // ── Step 4: Migrate again ───────────────────────────────────────
    println!("\n4. Running again (next startup)...");
    let before = fs::read(&path).unwrap();
    let outcome = run_startup_migration(&mut engine).unwrap();
    assert_eq!(fs::read(&path).unwrap(), before);
    println!("   {outcome:?} (file untouched)");

    println!(
        "\n   Previous content kept at {}",
        engine.store().backup_path().display()
    );
    println!("\n=== Done ===");
}
