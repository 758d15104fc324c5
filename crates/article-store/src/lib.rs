//! # article-store
//!
//! Storage locations for the article document, and the engine that migrates
//! whatever is stored there before the application loads it.
//!
//! ## Quick Start
//!
//! ```
//! use article_store::{FileStore, MigrationEngine, MigrationOutcome};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("articles.json");
//! std::fs::write(&path, br#"{"version":1,"articles":[{"id":"1","tags":["b","a"]}]}"#).unwrap();
//!
//! let mut engine = MigrationEngine::new(FileStore::new(&path));
//! assert_eq!(engine.migrate().unwrap(), MigrationOutcome::Migrated { from: 1, to: 4 });
//! ```
//!
//! ## Backends
//!
//! | Backend | Use case |
//! |---------|----------|
//! | [`FileStore`] | The document as a JSON file on disk |
//! | [`MemoryStore`] | Testing, hosts that hand over raw bytes |

mod engine;
mod file;
mod memory;
mod migrator;
mod traits;

pub use engine::{
    DocumentStatus, EngineBuilder, EngineConfig, EngineError, MigrationEngine, MigrationOutcome,
};
pub use file::{FileStore, FileStoreError};
pub use memory::{MemoryError, MemoryStore};
pub use migrator::{run_startup_migration, DataMigrator, NoOpMigrator};
pub use traits::DocumentStore;
