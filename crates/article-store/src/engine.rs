//! Startup migration of a persisted article document.
//!
//! `MigrationEngine` wraps a storage location and a migration chain. It reads
//! the document once, migrates it in memory when it is behind, and writes the
//! result back once. A failure at any point leaves the stored document exactly
//! as it was.
//!
//! # Example
//!
//! ```
//! use article_store::{MemoryStore, MigrationEngine, MigrationOutcome};
//!
//! let store = MemoryStore::with_contents(br#"{"version":3,"articles":[]}"#.to_vec());
//! let mut engine = MigrationEngine::new(store);
//!
//! assert_eq!(engine.migrate().unwrap(), MigrationOutcome::Migrated { from: 3, to: 4 });
//! assert_eq!(engine.migrate().unwrap(), MigrationOutcome::Current { version: 4 });
//! ```

use std::error::Error as StdError;

use article_migrate::{
    article_chain, Document, MigrationChain, MigrationError, MIN_SUPPORTED_VERSION,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::traits::DocumentStore;

/// Error type for `MigrationEngine` operations.
///
/// Every kind leaves the stored document untouched.
#[derive(Debug, Error)]
pub enum EngineError<E: StdError + 'static> {
    /// The stored content is not a valid document for its declared version.
    #[error("malformed document at {location}: {reason}")]
    MalformedDocument { location: String, reason: String },
    /// The document was written by a newer build than this one.
    #[error("document at {location} is at v{found}, newer than the v{current} this build supports")]
    UnsupportedFutureVersion {
        location: String,
        found: u32,
        current: u32,
    },
    /// The chain has no step for an intermediate version.
    #[error("no migration path for {location}: missing step from v{missing} while migrating v{from} to v{to}")]
    BrokenMigrationChain {
        location: String,
        missing: u32,
        from: u32,
        to: u32,
    },
    /// The migrated document could not be serialized.
    #[error("failed to serialize migrated document for {location}: {reason}")]
    Serialization { location: String, reason: String },
    /// Error from the underlying storage backend.
    #[error("store error at {location}: {source}")]
    Store {
        location: String,
        #[source]
        source: E,
    },
}

/// What a successful [`MigrationEngine::migrate`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No document exists at the location; nothing was created.
    Absent,
    /// The document is already at the current version; nothing was written.
    Current { version: u32 },
    /// The document was migrated and written back once.
    Migrated { from: u32, to: u32 },
    /// The migrator has no storage to migrate.
    Skipped,
}

/// Read-only view of what `migrate` would do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    /// No document exists at the location.
    Absent,
    /// The document is at the current version.
    Current { version: u32 },
    /// The document is behind; `steps` are the `(from, to)` pairs that would run.
    Pending { version: u32, steps: Vec<(u32, u32)> },
    /// The document is newer than this build.
    Future { version: u32 },
}

/// Configuration for `MigrationEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Write the migrated document as indented JSON instead of compact JSON.
    pub pretty: bool,
    /// Check the chain for gaps from `min_supported_version` before touching
    /// storage.
    pub verify_chain: bool,
    /// Oldest version the chain is expected to cover.
    pub min_supported_version: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            verify_chain: true,
            min_supported_version: MIN_SUPPORTED_VERSION,
        }
    }
}

/// Migrates the document at one storage location to the chain's current
/// version.
///
/// Assumes exclusive access to the location for the duration of a call; run
/// it once at startup, before anything else opens the document.
pub struct MigrationEngine<S: DocumentStore> {
    store: S,
    chain: MigrationChain,
    config: EngineConfig,
}

/// Builder for constructing a `MigrationEngine` with custom configuration.
pub struct EngineBuilder<S: DocumentStore> {
    store: S,
    chain: MigrationChain,
    config: EngineConfig,
}

impl<S: DocumentStore> EngineBuilder<S> {
    /// Use `chain` instead of the built-in article chain.
    pub fn chain(mut self, chain: MigrationChain) -> Self {
        self.chain = chain;
        self
    }

    /// Write indented JSON.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.config.pretty = pretty;
        self
    }

    /// Enable or disable the up-front chain check.
    pub fn verify_chain(mut self, verify: bool) -> Self {
        self.config.verify_chain = verify;
        self
    }

    /// Set the oldest version the chain is expected to cover.
    pub fn min_supported_version(mut self, version: u32) -> Self {
        self.config.min_supported_version = version;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the `MigrationEngine`.
    pub fn build(self) -> MigrationEngine<S> {
        MigrationEngine {
            store: self.store,
            chain: self.chain,
            config: self.config,
        }
    }
}

impl<S: DocumentStore> MigrationEngine<S> {
    /// Create an engine for `store` using the built-in article chain.
    pub fn new(store: S) -> Self {
        Self::builder(store).build()
    }

    /// Create a builder for advanced configuration.
    pub fn builder(store: S) -> EngineBuilder<S> {
        EngineBuilder {
            store,
            chain: article_chain(),
            config: EngineConfig::default(),
        }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the engine and return the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Get the migration chain.
    pub fn chain(&self) -> &MigrationChain {
        &self.chain
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bring the stored document to the chain's current version.
    ///
    /// - no document: `Absent`, nothing is created;
    /// - already current: `Current`, nothing is written;
    /// - older: every step runs in memory, then the result is written once.
    ///
    /// On error the stored document is left exactly as it was.
    pub fn migrate(&mut self) -> Result<MigrationOutcome, EngineError<S::Error>> {
        let location = self.store.location();
        let current = self.chain.current_version();

        let raw = match self.load(&location)? {
            Some(raw) => raw,
            None => {
                debug!(%location, "no document to migrate");
                return Ok(MigrationOutcome::Absent);
            }
        };

        let document = Document::from_slice(&raw).map_err(|e| self.map_error(e, &location))?;
        let from = document.version;

        if from == current {
            debug!(%location, version = from, "document is current");
            return Ok(MigrationOutcome::Current { version: from });
        }
        if from > current {
            warn!(%location, found = from, current, "document is newer than this build");
            return Err(EngineError::UnsupportedFutureVersion {
                location,
                found: from,
                current,
            });
        }

        if self.config.verify_chain {
            self.chain
                .validate_chain(self.config.min_supported_version.min(from))
                .map_err(|e| self.map_error(e, &location))?;
        }

        info!(%location, from, to = current, "migrating document");
        let migrated = self
            .chain
            .migrate_to_current(document)
            .map_err(|e| self.map_error(e, &location))?;

        let bytes = if self.config.pretty {
            migrated.to_vec_pretty()
        } else {
            migrated.to_vec()
        }
        .map_err(|e| self.map_error(e, &location))?;

        self.store
            .replace(&bytes)
            .map_err(|source| EngineError::Store {
                location: location.clone(),
                source,
            })?;

        info!(%location, from, to = current, "document migrated");
        Ok(MigrationOutcome::Migrated { from, to: current })
    }

    /// Report what [`migrate`](Self::migrate) would do, without writing.
    pub fn status(&self) -> Result<DocumentStatus, EngineError<S::Error>> {
        let location = self.store.location();
        let current = self.chain.current_version();

        let raw = match self.load(&location)? {
            Some(raw) => raw,
            None => return Ok(DocumentStatus::Absent),
        };

        let version = Document::peek_version(&raw).map_err(|e| self.map_error(e, &location))?;
        if version == current {
            return Ok(DocumentStatus::Current { version });
        }
        if version > current {
            return Ok(DocumentStatus::Future { version });
        }

        let steps = self
            .chain
            .path(version)
            .map_err(|e| self.map_error(e, &location))?;
        Ok(DocumentStatus::Pending { version, steps })
    }

    fn load(&self, location: &str) -> Result<Option<Vec<u8>>, EngineError<S::Error>> {
        self.store.load().map_err(|source| EngineError::Store {
            location: location.to_string(),
            source,
        })
    }

    fn map_error(&self, error: MigrationError, location: &str) -> EngineError<S::Error> {
        let location = location.to_string();
        match error {
            MigrationError::Malformed(reason) => {
                EngineError::MalformedDocument { location, reason }
            }
            MigrationError::FutureVersion { found, current } => {
                EngineError::UnsupportedFutureVersion {
                    location,
                    found,
                    current,
                }
            }
            MigrationError::GapInChain { missing, from, to } => EngineError::BrokenMigrationChain {
                location,
                missing,
                from,
                to,
            },
            MigrationError::Serialization(reason) => {
                EngineError::Serialization { location, reason }
            }
            // Registration errors cannot come out of a built chain; report them
            // as a broken chain at the current version.
            MigrationError::DuplicateStep { version }
            | MigrationError::StepOutOfRange { version, .. }
            | MigrationError::NotAdjacent { from: version, .. } => {
                EngineError::BrokenMigrationChain {
                    location,
                    missing: version,
                    from: version,
                    to: self.chain.current_version(),
                }
            }
        }
    }
}
