// Semantics shared by every NewsStore implementation, exercised against the
// in-memory store: conditional insert, category union, engagement-driven
// popularity reordering, both descending scans, and cursor resumption.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use newsreel_common::{keys, Engagement, Media, Metrics, NewsItem, Scope};
use newsreel_store::{FeedOrdering, InsertOutcome, MemoryStore, NewsStore, QueryService};

fn scope() -> Scope {
    Scope::new("IN", "EN")
}

fn item(url: &str, day: u32, categories: &[&str]) -> NewsItem {
    let scope = scope();
    let published = Utc.with_ymd_and_hms(2025, 3, day, 8, 0, 0).unwrap();
    let id = keys::time_ordered_id(published);
    let metrics = Metrics::default();
    NewsItem {
        identity_hash: keys::identity_hash(&scope, url),
        time_ordered_id: id,
        popularity_key: keys::popularity_key(&metrics, &id),
        scope,
        source_name: "NDTV".into(),
        source_id: "ndtv".into(),
        canonical_url: url.into(),
        headline: format!("Story {day}"),
        summary: "A summary".into(),
        published,
        categories: categories.iter().map(|c| c.to_string()).collect(),
        media: Media::default(),
        metrics,
        // Far-future expiry so "now" never trips it.
        ttl: (Utc::now() + Duration::days(365)).timestamp(),
    }
}

#[tokio::test]
async fn conditional_insert_keeps_one_item_per_hash() {
    let store = MemoryStore::new();
    let first = item("https://example.com/a", 1, &["sports"]);

    assert!(matches!(
        store.insert_new(&first).await.unwrap(),
        InsertOutcome::Inserted
    ));

    // Same URL re-polled later: conflict, carrying the stored item.
    let duplicate = item("https://example.com/a", 1, &["cricket"]);
    match store.insert_new(&duplicate).await.unwrap() {
        InsertOutcome::AlreadyExists(existing) => {
            assert_eq!(existing.time_ordered_id, first.time_ordered_id);
        }
        InsertOutcome::Inserted => panic!("duplicate must not insert"),
    }

    let items = store.query_by_time(&scope(), 10, None).await.unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn category_union_is_idempotent_and_commutative() {
    let store = MemoryStore::new();
    let stored = item("https://example.com/a", 1, &["a", "b"]);
    store.insert_new(&stored).await.unwrap();

    let bc: BTreeSet<String> = ["b", "c"].iter().map(|s| s.to_string()).collect();
    let ab: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();

    store
        .merge_categories(&scope(), stored.time_ordered_id, &bc)
        .await
        .unwrap();
    store
        .merge_categories(&scope(), stored.time_ordered_id, &ab)
        .await
        .unwrap();
    // Repeat of the same input changes nothing.
    store
        .merge_categories(&scope(), stored.time_ordered_id, &bc)
        .await
        .unwrap();

    let got = store
        .find_by_hash(&scope(), &stored.identity_hash)
        .await
        .unwrap()
        .expect("stored item");
    let expected: BTreeSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    assert_eq!(got.categories, expected);
    // Merge never touched metrics or summary.
    assert_eq!(got.metrics, Metrics::default());
    assert_eq!(got.summary, stored.summary);
}

#[tokio::test]
async fn engagement_recomputes_popularity_key_and_reorders() {
    let store = MemoryStore::new();
    let older = item("https://example.com/a", 1, &[]);
    let newer = item("https://example.com/b", 2, &[]);
    store.insert_new(&older).await.unwrap();
    store.insert_new(&newer).await.unwrap();

    // Tied at score 0: ties break newest-first.
    let popular = store.query_by_popularity(&scope(), 10, None).await.unwrap();
    assert_eq!(popular[0].canonical_url, newer.canonical_url);

    // One share on the older item (worth 100) outranks the tie.
    let updated = store
        .record_engagement(&scope(), older.time_ordered_id, Engagement::Share)
        .await
        .unwrap();
    assert_eq!(updated.metrics.shares, 1);
    assert_eq!(
        updated.popularity_key,
        format!("TOP#0000000100#{}", older.time_ordered_id)
    );

    let popular = store.query_by_popularity(&scope(), 10, None).await.unwrap();
    assert_eq!(popular[0].canonical_url, older.canonical_url);

    // The chronological ordering is untouched by engagement.
    let by_time = store.query_by_time(&scope(), 10, None).await.unwrap();
    assert_eq!(by_time[0].canonical_url, newer.canonical_url);
}

#[tokio::test]
async fn time_scan_is_newest_first_and_resumes_after_cursor() {
    let store = MemoryStore::new();
    for day in 1..=5 {
        store
            .insert_new(&item(&format!("https://example.com/{day}"), day, &[]))
            .await
            .unwrap();
    }

    let first_page = store.query_by_time(&scope(), 2, None).await.unwrap();
    assert_eq!(first_page[0].headline, "Story 5");
    assert_eq!(first_page[1].headline, "Story 4");

    let after = first_page.last().unwrap().time_ordered_id;
    let second_page = store.query_by_time(&scope(), 2, Some(after)).await.unwrap();
    assert_eq!(second_page[0].headline, "Story 3");
    assert_eq!(second_page[1].headline, "Story 2");
}

#[tokio::test]
async fn scans_are_scoped_to_one_partition() {
    let store = MemoryStore::new();
    store
        .insert_new(&item("https://example.com/a", 1, &[]))
        .await
        .unwrap();

    let other = Scope::new("US", "EN");
    assert!(store.query_by_time(&other, 10, None).await.unwrap().is_empty());
    assert!(store
        .query_by_popularity(&other, 10, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn expired_items_are_invisible_and_purgeable() {
    let store = MemoryStore::new();
    let mut expired = item("https://example.com/old", 1, &[]);
    expired.ttl = (Utc::now() - Duration::days(1)).timestamp();
    let live = item("https://example.com/new", 2, &[]);
    store.insert_new(&expired).await.unwrap();
    store.insert_new(&live).await.unwrap();

    assert!(store
        .find_by_hash(&scope(), &expired.identity_hash)
        .await
        .unwrap()
        .is_none());
    let items = store.query_by_time(&scope(), 10, None).await.unwrap();
    assert_eq!(items.len(), 1);

    assert_eq!(store.purge_expired(Utc::now()).await.unwrap(), 1);
    assert_eq!(store.purge_expired(Utc::now()).await.unwrap(), 0);
}

#[tokio::test]
async fn query_service_pages_through_both_orderings() {
    let store = Arc::new(MemoryStore::new());
    for day in 1..=5 {
        store
            .insert_new(&item(&format!("https://example.com/{day}"), day, &[]))
            .await
            .unwrap();
    }
    let service = QueryService::new(store.clone(), 50);

    // Time ordering: walk to exhaustion through opaque cursors.
    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = service
            .query_feed(&scope(), FeedOrdering::Time, 2, cursor.as_deref())
            .await
            .unwrap();
        seen.extend(page.items.iter().map(|i| i.headline.clone()));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    assert_eq!(seen, vec!["Story 5", "Story 4", "Story 3", "Story 2", "Story 1"]);

    // Popularity ordering with a promoted item: pagination preserves the
    // score-then-recency order across pages.
    let by_pop = store.query_by_time(&scope(), 10, None).await.unwrap();
    store
        .record_engagement(&scope(), by_pop[4].time_ordered_id, Engagement::Share)
        .await
        .unwrap();

    let first = service
        .query_feed(&scope(), FeedOrdering::Popularity, 3, None)
        .await
        .unwrap();
    assert_eq!(first.items[0].headline, "Story 1"); // shared → score 100
    assert_eq!(first.items[1].headline, "Story 5");
    let second = service
        .query_feed(
            &scope(),
            FeedOrdering::Popularity,
            3,
            first.next_cursor.as_deref(),
        )
        .await
        .unwrap();
    assert_eq!(second.items[0].headline, "Story 3");
    assert_eq!(second.items[1].headline, "Story 2");
}

#[tokio::test]
async fn malformed_cursor_restarts_from_first_page() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_new(&item("https://example.com/a", 1, &[]))
        .await
        .unwrap();
    let service = QueryService::new(store, 50);

    for ordering in [FeedOrdering::Time, FeedOrdering::Popularity] {
        let page = service
            .query_feed(&scope(), ordering, 10, Some("!!garbage!!"))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1, "corrupt cursor must not error");
    }
}
