//! # article-migrate
//!
//! Versioned schema migrations for article documents.
//!
//! The application persists its articles as one JSON document tagged with a
//! schema `version`. When the shape of that document changes between
//! releases, `article-migrate` carries old documents forward to the shape the
//! current build expects, without losing data.
//!
//! ## How It Works
//!
//! 1. A persisted document is parsed into a [`Document`] (version + body).
//! 2. The version is compared to [`CURRENT_VERSION`].
//! 3. If it is older, a **chain of migration steps** runs in memory, one
//!    version at a time.
//! 4. The caller writes the migrated document back once (see `article-store`).
//!
//! ## Key Concepts
//!
//! - **Typed shapes**: every supported version has its own body type
//!   ([`BodyV1`] … [`BodyV4`]); a step is a pure function between two of them.
//! - **Deterministic**: migrating the same document twice produces identical bytes.
//! - **Linear chain**: migrations run v1→v2→v3→...→current, never skipping steps.
//! - **Lossless**: attributes the chain does not know about are carried verbatim.

mod articles;
mod chain;
mod document;
mod schema;
mod typed;

pub use articles::{
    add_deleted_flag_and_sort_tags, add_timestamps_and_likes, article_chain, seeded_timestamp,
    wrap_articles_in_list, CURRENT_VERSION, MIN_SUPPORTED_VERSION, TIMESTAMP_EPOCH_SECS,
};
pub use chain::{MigrationChain, MigrationError, MigrationStep};
pub use document::{Document, ARTICLES_FIELD, VERSION_FIELD};
pub use schema::{
    ArticleList, ArticleV1, ArticleV2, ArticleV3, ArticleV4, BodyV1, BodyV2, BodyV3, BodyV4,
    Fields, Schema, Timestamp,
};
pub use typed::TypedStep;
