use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::document::Document;

/// A single migration step that transforms a document body from one version
/// to the next.
///
/// Steps form a linear chain: v1→v2, v2→v3, etc. The target version is always
/// the source version plus one. Each step must be **deterministic and pure**:
/// the same body always produces the same output.
pub trait MigrationStep: Send + Sync {
    /// Source version.
    fn source_version(&self) -> u32;

    /// Target version.
    fn target_version(&self) -> u32 {
        self.source_version() + 1
    }

    /// Short human-readable summary of what the step changes.
    fn description(&self) -> &str;

    /// Transform the body of a document at `source_version`.
    fn apply(&self, body: Map<String, Value>) -> Result<Map<String, Value>, MigrationError>;
}

/// Error during migration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// The document could not be parsed, or its body does not match the
    /// shape its declared version requires.
    #[error("malformed document: {0}")]
    Malformed(String),
    /// The document version is newer than the current version.
    #[error("document version v{found} is newer than current v{current}")]
    FutureVersion { found: u32, current: u32 },
    /// No step is registered for an intermediate version.
    #[error("no migration step registered for v{missing} (migrating v{from} to v{to})")]
    GapInChain { missing: u32, from: u32, to: u32 },
    /// A second step was registered for the same source version.
    #[error("a migration step for v{version} is already registered")]
    DuplicateStep { version: u32 },
    /// A step was registered whose source is not below the current version.
    #[error("migration step from v{version} does not lead towards current v{current}")]
    StepOutOfRange { version: u32, current: u32 },
    /// A step was registered whose target is not its source plus one.
    #[error("migration step v{from}→v{to} skips versions; steps must advance by exactly one")]
    NotAdjacent { from: u32, to: u32 },
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// The ordered set of migration steps, indexed by source version.
///
/// When a document at version N needs to reach version M (where N < M),
/// the chain runs steps N→N+1, N+1→N+2, ..., M-1→M in sequence, entirely in
/// memory.
///
/// # Example
///
/// ```
/// use article_migrate::{Document, MigrationChain, MigrationError, MigrationStep};
/// use serde_json::{json, Map, Value};
///
/// struct AddOwner;
///
/// impl MigrationStep for AddOwner {
///     fn source_version(&self) -> u32 { 1 }
///     fn description(&self) -> &str { "add owner" }
///     fn apply(&self, mut body: Map<String, Value>) -> Result<Map<String, Value>, MigrationError> {
///         body.insert("owner".into(), json!("nobody"));
///         Ok(body)
///     }
/// }
///
/// let mut chain = MigrationChain::new(2);
/// chain.register(Box::new(AddOwner)).unwrap();
///
/// let doc = Document::from_slice(br#"{"version":1}"#).unwrap();
/// let migrated = chain.migrate_to_current(doc).unwrap();
/// assert_eq!(migrated.version, 2);
/// assert_eq!(migrated.body["owner"], json!("nobody"));
/// ```
pub struct MigrationChain {
    current_version: u32,
    steps: BTreeMap<u32, Box<dyn MigrationStep>>,
}

impl MigrationChain {
    /// Create an empty chain targeting `current_version`.
    pub fn new(current_version: u32) -> Self {
        Self {
            current_version,
            steps: BTreeMap::new(),
        }
    }

    /// Register a migration step under its source version.
    pub fn register(&mut self, step: Box<dyn MigrationStep>) -> Result<(), MigrationError> {
        let version = step.source_version();
        if version >= self.current_version {
            return Err(MigrationError::StepOutOfRange {
                version,
                current: self.current_version,
            });
        }
        if step.target_version() != version + 1 {
            return Err(MigrationError::NotAdjacent {
                from: version,
                to: step.target_version(),
            });
        }
        if self.steps.contains_key(&version) {
            return Err(MigrationError::DuplicateStep { version });
        }
        self.steps.insert(version, step);
        Ok(())
    }

    // Unchecked registration for the built-in chain; its shape is pinned by tests.
    pub(crate) fn insert(&mut self, step: Box<dyn MigrationStep>) {
        self.steps.insert(step.source_version(), step);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_step(mut self, step: Box<dyn MigrationStep>) -> Result<Self, MigrationError> {
        self.register(step)?;
        Ok(self)
    }

    /// The current (target) schema version.
    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// Check if a document at `version` needs migration.
    pub fn needs_migration(&self, version: u32) -> bool {
        version != self.current_version
    }

    /// The `(from, to)` pairs that would run for a document at `from_version`.
    ///
    /// Empty when the document is already current.
    pub fn path(&self, from_version: u32) -> Result<Vec<(u32, u32)>, MigrationError> {
        self.check_version(from_version)?;
        (from_version..self.current_version)
            .map(|v| {
                self.step_for(v, from_version)
                    .map(|s| (s.source_version(), s.target_version()))
            })
            .collect()
    }

    /// Migrate a document to `current_version`.
    ///
    /// Each step receives the output of the previous one. Nothing is written
    /// anywhere; the caller persists the returned document.
    pub fn migrate_to_current(&self, document: Document) -> Result<Document, MigrationError> {
        let from_version = document.version;
        self.check_version(from_version)?;

        let Document {
            mut version,
            mut body,
        } = document;

        while version < self.current_version {
            let step = self.step_for(version, from_version)?;
            debug!(
                from = version,
                to = version + 1,
                step = step.description(),
                "applying migration step"
            );
            body = step.apply(body)?;
            version += 1;
        }

        Ok(Document::new(version, body))
    }

    /// Validate that the chain is complete from `min_version` to `current_version`.
    pub fn validate_chain(&self, min_version: u32) -> Result<(), MigrationError> {
        (min_version..self.current_version)
            .try_for_each(|v| self.step_for(v, min_version).map(|_| ()))
    }

    /// List all registered migration steps as (from, to) pairs.
    pub fn registered_steps(&self) -> Vec<(u32, u32)> {
        self.steps
            .values()
            .map(|s| (s.source_version(), s.target_version()))
            .collect()
    }

    /// Iterate the registered steps in source-version order.
    pub fn steps(&self) -> impl Iterator<Item = &dyn MigrationStep> {
        self.steps.values().map(|s| &**s as &dyn MigrationStep)
    }

    fn check_version(&self, version: u32) -> Result<(), MigrationError> {
        if version > self.current_version {
            return Err(MigrationError::FutureVersion {
                found: version,
                current: self.current_version,
            });
        }
        Ok(())
    }

    fn step_for(&self, version: u32, from: u32) -> Result<&dyn MigrationStep, MigrationError> {
        match self.steps.get(&version) {
            Some(step) => Ok(step.as_ref()),
            None => Err(MigrationError::GapInChain {
                missing: version,
                from,
                to: self.current_version,
            }),
        }
    }
}

impl fmt::Debug for MigrationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationChain")
            .field("current_version", &self.current_version)
            .field("steps", &self.registered_steps())
            .finish()
    }
}
