use thiserror::Error;

use crate::traits::DocumentStore;

/// In-memory storage backend.
///
/// The document lives in a `Vec<u8>`; nothing touches disk. Ideal for
/// testing, and for hosts that keep the document somewhere other than a file
/// and hand the bytes over.
///
/// # Example
///
/// ```
/// use article_store::{DocumentStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// assert_eq!(store.load().unwrap(), None);
///
/// store.replace(br#"{"version":4}"#).unwrap();
/// assert_eq!(store.load().unwrap().unwrap(), br#"{"version":4}"#);
/// assert_eq!(store.write_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: Option<Vec<u8>>,
    writes: usize,
    fail_writes: bool,
}

/// Error type for the in-memory backend.
///
/// Only produced when writes were switched off with
/// [`MemoryStore::fail_writes`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("MemoryStore error: {0}")]
pub struct MemoryError(String);

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `contents`.
    pub fn with_contents(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Some(contents.into()),
            ..Self::default()
        }
    }

    /// Make every subsequent [`replace`](DocumentStore::replace) fail.
    pub fn fail_writes(mut self, fail: bool) -> Self {
        self.fail_writes = fail;
        self
    }

    /// Current contents, if any.
    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl DocumentStore for MemoryStore {
    type Error = MemoryError;

    fn location(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.contents.clone())
    }

    fn replace(&mut self, contents: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MemoryError("writes are disabled".to_string()));
        }
        self.contents = Some(contents.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn exists(&self) -> Result<bool, Self::Error> {
        Ok(self.contents.is_some())
    }
}
