//! The article document's migration chain.

use chrono::{DateTime, Utc};

use crate::chain::MigrationChain;
use crate::schema::{
    ArticleList, ArticleV2, ArticleV3, BodyV1, BodyV2, BodyV3, BodyV4, Fields, Schema, Timestamp,
};
use crate::typed::TypedStep;

/// Schema version this build reads and writes.
pub const CURRENT_VERSION: u32 = BodyV4::VERSION;

/// Oldest schema version the chain can migrate from.
pub const MIN_SUPPORTED_VERSION: u32 = BodyV1::VERSION;

/// Seed for timestamps introduced by the v1→v2 step: `2020-01-01T00:00:00Z`.
pub const TIMESTAMP_EPOCH_SECS: i64 = 1_577_836_800;

/// Build the production chain: v1→v2→v3→v4.
pub fn article_chain() -> MigrationChain {
    let mut chain = MigrationChain::new(CURRENT_VERSION);
    chain.insert(TypedStep::boxed(
        "add created/updated timestamps and likes counter",
        add_timestamps_and_likes,
    ));
    chain.insert(TypedStep::boxed(
        "add isDeleted flag and sort tags",
        add_deleted_flag_and_sort_tags,
    ));
    chain.insert(TypedStep::boxed(
        "wrap articles in a list container",
        wrap_articles_in_list,
    ));
    chain
}

/// Timestamp assigned to the article at `index` by the v1→v2 step.
pub fn seeded_timestamp(index: usize) -> Timestamp {
    let offset = i64::try_from(index).unwrap_or(i64::MAX);
    let instant = DateTime::from_timestamp(TIMESTAMP_EPOCH_SECS.saturating_add(offset), 0)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    Timestamp::from_instant(instant)
}

/// v1→v2: every article gets `created` == `updated`, one second apart in
/// original order starting at the epoch, and `likes = 0`.
pub fn add_timestamps_and_likes(old: BodyV1) -> BodyV2 {
    let articles = old
        .articles
        .into_iter()
        .enumerate()
        .map(|(index, article)| {
            let ts = seeded_timestamp(index);
            ArticleV2 {
                tags: article.tags,
                created: ts.clone(),
                updated: ts,
                likes: 0,
                fields: without(article.fields, &["created", "updated", "likes"]),
            }
        })
        .collect();

    BodyV2 {
        articles,
        extra: old.extra,
    }
}

/// v2→v3: every article gets `isDeleted = false` and its tags sorted.
pub fn add_deleted_flag_and_sort_tags(old: BodyV2) -> BodyV3 {
    let articles = old
        .articles
        .into_iter()
        .map(|article| {
            let mut tags = article.tags;
            tags.sort();
            ArticleV3 {
                tags,
                created: article.created,
                updated: article.updated,
                likes: article.likes,
                is_deleted: false,
                fields: without(article.fields, &["isDeleted"]),
            }
        })
        .collect();

    BodyV3 {
        articles,
        extra: old.extra,
    }
}

/// v3→v4: the flat list moves under `articles.list`. Records are untouched.
pub fn wrap_articles_in_list(old: BodyV3) -> BodyV4 {
    BodyV4 {
        articles: ArticleList { list: old.articles },
        extra: old.extra,
    }
}

// Attributes a step introduces replace any stale attribute of the same name.
fn without(mut fields: Fields, keys: &[&str]) -> Fields {
    for key in keys {
        fields.remove(*key);
    }
    fields
}
