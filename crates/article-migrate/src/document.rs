use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::MigrationError;

/// Top-level field that carries the schema version.
pub const VERSION_FIELD: &str = "version";

/// Top-level field that carries the article records.
pub const ARTICLES_FIELD: &str = "articles";

/// A persisted article document, tagged with its schema version.
///
/// Wire format (JSON object):
/// ```text
/// { "version": <u32>, "articles": <shape defined by version>, ...other fields }
/// ```
///
/// Everything except `version` lives in `body` untouched, so fields this
/// build does not know about survive a migration.
///
/// # Example
///
/// ```
/// use article_migrate::Document;
///
/// let doc = Document::from_slice(br#"{"version":3,"articles":[]}"#).unwrap();
/// assert_eq!(doc.version, 3);
/// assert!(doc.body.contains_key("articles"));
///
/// let bytes = doc.to_vec().unwrap();
/// assert_eq!(Document::peek_version(&bytes).unwrap(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Schema version the body currently conforms to.
    pub version: u32,
    /// All other top-level fields.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

impl Document {
    /// Create a document from a version and a body.
    pub fn new(version: u32, body: Map<String, Value>) -> Self {
        Self { version, body }
    }

    /// Parse a document from raw bytes.
    ///
    /// Fails with [`MigrationError::Malformed`] when the bytes are not a JSON
    /// object with an integer `version` in `u32` range.
    pub fn from_slice(data: &[u8]) -> Result<Self, MigrationError> {
        serde_json::from_slice(data).map_err(|e| MigrationError::Malformed(e.to_string()))
    }

    /// Read only the `version` field; the rest of the body is not decoded
    /// into memory.
    pub fn peek_version(data: &[u8]) -> Result<u32, MigrationError> {
        serde_json::from_slice::<Header>(data)
            .map(|h| h.version)
            .map_err(|e| MigrationError::Malformed(e.to_string()))
    }

    /// Serialize to compact JSON.
    pub fn to_vec(&self) -> Result<Vec<u8>, MigrationError> {
        serde_json::to_vec(self).map_err(|e| MigrationError::Serialization(e.to_string()))
    }

    /// Serialize to indented JSON.
    pub fn to_vec_pretty(&self) -> Result<Vec<u8>, MigrationError> {
        serde_json::to_vec_pretty(self).map_err(|e| MigrationError::Serialization(e.to_string()))
    }
}
