use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use newsreel_common::{Engagement, NewsItem, Scope};

use crate::error::Result;

/// Outcome of a conditional insert. A variant, not an error: the duplicate
/// path is normal pipeline flow and callers must handle it.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted,
    /// An item with the same (scope, identity_hash) already exists; carries
    /// the stored item so the caller can union categories against it.
    AlreadyExists(NewsItem),
}

/// Keyed article store with two independent total orderings per scope
/// (chronological via `time_ordered_id`, popularity via `popularity_key`)
/// and a secondary lookup by identity hash.
///
/// All writes are atomic per (scope, identity_hash): concurrent workers
/// processing the same duplicate URL resolve to exactly one insert, with the
/// losers observing `AlreadyExists`.
#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Dedup lookup. Expired items count as absent.
    async fn find_by_hash(&self, scope: &Scope, identity_hash: &str) -> Result<Option<NewsItem>>;

    /// Conditional insert keyed on (scope, identity_hash).
    async fn insert_new(&self, item: &NewsItem) -> Result<InsertOutcome>;

    /// Atomic read-modify-write union of category sets.
    async fn merge_categories(
        &self,
        scope: &Scope,
        time_ordered_id: Uuid,
        categories: &BTreeSet<String>,
    ) -> Result<()>;

    /// Atomically bump one engagement counter and recompute the popularity
    /// key from the new counters. Returns the updated item.
    async fn record_engagement(
        &self,
        scope: &Scope,
        time_ordered_id: Uuid,
        engagement: Engagement,
    ) -> Result<NewsItem>;

    /// Newest-first scan. When `after` is set, resumes strictly after that
    /// `time_ordered_id`.
    async fn query_by_time(
        &self,
        scope: &Scope,
        limit: u32,
        after: Option<Uuid>,
    ) -> Result<Vec<NewsItem>>;

    /// Highest-score-first scan (ties newest-first, as encoded in the key).
    /// When `after` is set, resumes strictly after that `popularity_key`.
    async fn query_by_popularity(
        &self,
        scope: &Scope,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Vec<NewsItem>>;

    /// Remove items whose ttl has passed. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
