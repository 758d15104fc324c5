//! Typed shapes of the document body, one per supported schema version.
//!
//! Only the attributes the migration chain reads or writes are typed. Every
//! other attribute (`id`, `title`, `body`, and anything added by the
//! application later) is carried in a flattened map and written back
//! verbatim.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Attributes carried through a step without interpretation.
pub type Fields = Map<String, Value>;

/// A document body shape bound to one schema version.
pub trait Schema: Serialize + DeserializeOwned {
    /// Schema version this shape describes.
    const VERSION: u32;
}

/// An article before timestamps were introduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleV1 {
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

/// v2 adds creation/update timestamps and a like counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleV2 {
    pub tags: Vec<String>,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub likes: u64,
    #[serde(flatten)]
    pub fields: Fields,
}

/// v3 adds soft deletion; tags are kept sorted from here on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleV3 {
    pub tags: Vec<String>,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub likes: u64,
    #[serde(rename = "isDeleted")]
    pub is_deleted: bool,
    #[serde(flatten)]
    pub fields: Fields,
}

/// v4 changed the container, not the record.
pub type ArticleV4 = ArticleV3;

/// Body at v1: a flat list of articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyV1 {
    pub articles: Vec<ArticleV1>,
    #[serde(flatten)]
    pub extra: Fields,
}

/// Body at v2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyV2 {
    pub articles: Vec<ArticleV2>,
    #[serde(flatten)]
    pub extra: Fields,
}

/// Body at v3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyV3 {
    pub articles: Vec<ArticleV3>,
    #[serde(flatten)]
    pub extra: Fields,
}

/// Body at v4: the article list is nested under `articles.list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyV4 {
    pub articles: ArticleList,
    #[serde(flatten)]
    pub extra: Fields,
}

/// Container introduced in v4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleList {
    pub list: Vec<ArticleV4>,
}

impl Schema for BodyV1 {
    const VERSION: u32 = 1;
}

impl Schema for BodyV2 {
    const VERSION: u32 = 2;
}

impl Schema for BodyV3 {
    const VERSION: u32 = 3;
}

impl Schema for BodyV4 {
    const VERSION: u32 = 4;
}

/// An RFC 3339 timestamp that keeps the exact text it was read from.
///
/// Stored values are written back unchanged, whatever precision or offset
/// they carry. Values created here render in UTC with millisecond precision
/// and a `Z` suffix, e.g. `2020-01-01T00:00:00.000Z`.
///
/// Ordering and [`instant`](Self::instant) use the parsed point in time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    instant: DateTime<Utc>,
    raw: String,
}

impl Timestamp {
    /// Timestamp for `instant` in the persisted format.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            instant,
        }
    }

    /// Parse an RFC 3339 value, keeping `raw` as written.
    pub fn parse(raw: impl Into<String>) -> Result<Self, chrono::ParseError> {
        let raw = raw.into();
        let instant = DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc);
        Ok(Self { instant, raw })
    }

    /// The point in time, normalized to UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Seconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.instant.timestamp()
    }

    /// The text that is persisted.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::from_instant(instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(raw).map_err(de::Error::custom)
    }
}
