use std::convert::Infallible;
use std::error::Error as StdError;

use crate::engine::{EngineError, MigrationEngine, MigrationOutcome};
use crate::traits::DocumentStore;

/// Something a startup routine calls once before loading application data.
///
/// The caller aborts startup when this returns an error.
pub trait DataMigrator {
    /// Error type reported to the caller.
    type Error: StdError + Send + Sync + 'static;

    /// Bring persisted data up to the current schema version.
    fn migrate(&mut self) -> Result<MigrationOutcome, Self::Error>;
}

impl<S: DocumentStore> DataMigrator for MigrationEngine<S> {
    type Error = EngineError<S::Error>;

    fn migrate(&mut self) -> Result<MigrationOutcome, Self::Error> {
        MigrationEngine::migrate(self)
    }
}

/// A migrator for hosts with no file-backed document (e.g. a browser build).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMigrator;

impl DataMigrator for NoOpMigrator {
    type Error = Infallible;

    fn migrate(&mut self) -> Result<MigrationOutcome, Self::Error> {
        tracing::debug!("no-op migrator: nothing to migrate");
        Ok(MigrationOutcome::Skipped)
    }
}

/// Run `migrator` as the startup step, boxing its error for the caller.
pub fn run_startup_migration<M: DataMigrator>(
    migrator: &mut M,
) -> Result<MigrationOutcome, Box<dyn StdError + Send + Sync>> {
    migrator.migrate().map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)
}
