//! Property tests for the article migration chain.
//!
//! For any v1 document, the chain must reach the current version with every
//! step's rule holding on every record.

use article_migrate::{
    add_deleted_flag_and_sort_tags, add_timestamps_and_likes, article_chain,
    wrap_articles_in_list, ArticleV1, BodyV1, Document, Fields, CURRENT_VERSION,
    TIMESTAMP_EPOCH_SECS,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn articles_strategy() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::vec(
        (
            "[a-z0-9]{1,8}",
            prop::collection::vec("[a-zA-Z0-9 _-]{0,6}", 0..6),
        ),
        0..24,
    )
}

fn v1_body(articles: &[(String, Vec<String>)]) -> BodyV1 {
    BodyV1 {
        articles: articles
            .iter()
            .map(|(id, tags)| {
                let mut fields = Fields::new();
                fields.insert("id".into(), json!(id));
                fields.insert("title".into(), json!(format!("title {id}")));
                fields.insert("body".into(), json!("..."));
                ArticleV1 {
                    tags: tags.clone(),
                    fields,
                }
            })
            .collect(),
        extra: Fields::new(),
    }
}

fn v1_document(articles: &[(String, Vec<String>)]) -> Document {
    let mut body = match serde_json::to_value(v1_body(articles)).unwrap() {
        Value::Object(map) => map,
        other => panic!("body serialized to {other}"),
    };
    body.insert("preferences".into(), json!({ "theme": "dark" }));
    Document::new(1, body)
}

proptest! {
    #[test]
    fn timestamps_advance_one_second_per_record(articles in articles_strategy()) {
        let out = add_timestamps_and_likes(v1_body(&articles));

        prop_assert_eq!(out.articles.len(), articles.len());
        for (index, a) in out.articles.iter().enumerate() {
            prop_assert_eq!(a.created.timestamp(), TIMESTAMP_EPOCH_SECS + index as i64);
            prop_assert_eq!(&a.updated, &a.created);
            prop_assert_eq!(a.likes, 0);
        }
        for pair in out.articles.windows(2) {
            prop_assert!(pair[0].created < pair[1].created);
        }
    }

    #[test]
    fn tags_end_up_sorted_and_nothing_is_deleted(articles in articles_strategy()) {
        let out = add_deleted_flag_and_sort_tags(add_timestamps_and_likes(v1_body(&articles)));

        for (a, (_, input_tags)) in out.articles.iter().zip(&articles) {
            let mut expected = input_tags.clone();
            expected.sort();
            prop_assert_eq!(&a.tags, &expected);
            prop_assert!(!a.is_deleted);
        }
    }

    #[test]
    fn wrapping_preserves_records_and_order(articles in articles_strategy()) {
        let v3 = add_deleted_flag_and_sort_tags(add_timestamps_and_likes(v1_body(&articles)));
        let before = v3.articles.clone();
        let out = wrap_articles_in_list(v3);
        prop_assert_eq!(out.articles.list, before);
    }

    #[test]
    fn chain_reaches_current_version(articles in articles_strategy(), start in 1u32..=3) {
        let chain = article_chain();
        let mut doc = v1_document(&articles);
        // Bring the document to `start` first, then run the rest of the chain.
        for step in chain.steps().take((start - 1) as usize) {
            doc = Document::new(step.target_version(), step.apply(doc.body).unwrap());
        }

        let migrated = chain.migrate_to_current(doc).unwrap();
        prop_assert_eq!(migrated.version, CURRENT_VERSION);

        let list = migrated.body["articles"]["list"].as_array().unwrap();
        prop_assert_eq!(list.len(), articles.len());
        for (record, (id, _)) in list.iter().zip(&articles) {
            prop_assert_eq!(&record["id"], &json!(id));
        }
        prop_assert_eq!(&migrated.body["preferences"], &json!({ "theme": "dark" }));
    }

    #[test]
    fn migration_is_deterministic(articles in articles_strategy()) {
        let chain = article_chain();
        let first = chain.migrate_to_current(v1_document(&articles)).unwrap();
        let second = chain.migrate_to_current(v1_document(&articles)).unwrap();
        prop_assert_eq!(first.to_vec().unwrap(), second.to_vec().unwrap());
    }

    #[test]
    fn current_document_is_a_fixed_point(articles in articles_strategy()) {
        let chain = article_chain();
        let migrated = chain.migrate_to_current(v1_document(&articles)).unwrap();
        let bytes = migrated.to_vec().unwrap();

        let again = chain.migrate_to_current(Document::from_slice(&bytes).unwrap()).unwrap();
        prop_assert_eq!(again.to_vec().unwrap(), bytes);
    }
}
