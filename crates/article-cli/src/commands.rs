use std::path::Path;

use article_migrate::{article_chain, Document, MigrationStep, ARTICLES_FIELD, CURRENT_VERSION};
use article_store::{DocumentStatus, DocumentStore, FileStore, MigrationEngine, MigrationOutcome};
use serde_json::Value;
use tracing::info;

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

/// `article status <file>`: Show version and pending steps.
pub fn status(path: &Path) -> Result {
    let store = FileStore::new(path);
    let size = store.load()?.map(|bytes| bytes.len() as u64);
    let engine = MigrationEngine::new(store);

    println!("Document: {}", path.display());
    match size {
        Some(size) => println!("Size: {}", format_bytes(size)),
        None => println!("Size: (no file)"),
    }
    println!("Current version: v{CURRENT_VERSION}");
    println!();

    match engine.status()? {
        DocumentStatus::Absent => println!("  (no document, nothing to migrate)"),
        DocumentStatus::Current { version } => {
            println!("  Version: v{version} (up to date)");
            print_record_count(path)?;
        }
        DocumentStatus::Pending { version, steps } => {
            println!("  Version: v{version} ({} step(s) pending)", steps.len());
            for (from, to) in steps {
                println!("    v{from} -> v{to}");
            }
            print_record_count(path)?;
        }
        DocumentStatus::Future { version } => {
            println!("  Version: v{version} (newer than this build, will not be touched)");
        }
    }
    println!();

    Ok(())
}

/// `article migrate <file>`: Run the migration in place.
pub fn migrate(path: &Path, pretty: bool, backup: bool, dry_run: bool) -> Result {
    if dry_run {
        let engine = MigrationEngine::new(FileStore::new(path));
        return match engine.status()? {
            DocumentStatus::Absent => {
                println!("No document at {}; nothing to do.", path.display());
                Ok(())
            }
            DocumentStatus::Current { version } => {
                println!("Already at v{version}; nothing to do.");
                Ok(())
            }
            DocumentStatus::Pending { version, steps } => {
                println!(
                    "Would migrate v{version} -> v{CURRENT_VERSION} ({} step(s)):",
                    steps.len()
                );
                for (from, to) in steps {
                    println!("  v{from} -> v{to}");
                }
                Ok(())
            }
            DocumentStatus::Future { version } => Err(format!(
                "{} is at v{version}, newer than supported v{CURRENT_VERSION}",
                path.display()
            )
            .into()),
        };
    }

    let store = FileStore::new(path).keep_backup(backup);
    let backup_path = store.backup_path();
    let mut engine = MigrationEngine::builder(store).pretty(pretty).build();

    let outcome = engine.migrate()?;
    info!(path = %path.display(), ?outcome, "migrate command finished");

    match outcome {
        MigrationOutcome::Absent => println!("No document at {}; nothing to do.", path.display()),
        MigrationOutcome::Current { version } => println!("Already at v{version}; nothing to do."),
        MigrationOutcome::Migrated { from, to } => {
            println!("Migrated {} from v{from} to v{to}.", path.display());
            if backup {
                println!("Previous content kept at {}", backup_path.display());
            }
        }
        MigrationOutcome::Skipped => println!("Migration skipped."),
    }

    Ok(())
}

/// `article steps`: List the registered steps.
pub fn steps() -> Result {
    let chain = article_chain();

    println!("Current version: v{}", chain.current_version());
    println!();
    println!("  {:<10} {}", "Step", "Description");
    println!("  {}", "-".repeat(60));
    for step in chain.steps() {
        println!(
            "  {:<10} {}",
            format!("v{} -> v{}", step.source_version(), step.target_version()),
            truncate(step.description(), 48),
        );
    }
    println!();

    Ok(())
}

fn print_record_count(path: &Path) -> Result {
    let Some(bytes) = FileStore::new(path).load()? else {
        return Ok(());
    };
    let doc = Document::from_slice(&bytes)?;
    if let Some(count) = count_records(doc.body.get(ARTICLES_FIELD)) {
        println!("  Articles: {count}");
    }
    Ok(())
}

/// Record count for either the flat (v1-v3) or wrapped (v4) layout.
fn count_records(articles: Option<&Value>) -> Option<usize> {
    match articles? {
        Value::Array(list) => Some(list.len()),
        Value::Object(map) => map.get("list")?.as_array().map(Vec::len),
        _ => None,
    }
}

/// Human-readable size using binary units (`B`, `KiB`, `MiB`, `GiB`).
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    }
}
