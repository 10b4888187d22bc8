use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use newsreel_common::{keys, Engagement, NewsItem, Scope};

use crate::error::{Result, StoreError};
use crate::store::{InsertOutcome, NewsStore};

/// In-memory store: BTreeMap orderings under one lock, so the conditional
/// insert and both read-modify-write operations are atomic. Backs the test
/// suite and local runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    items: HashMap<(String, Uuid), NewsItem>,
    by_hash: HashMap<(String, String), Uuid>,
    // Ordering indexes keyed by (partition_key, sort_key). The BTreeMap's
    // ascending byte order is the single source of ordering truth; queries
    // walk it in reverse.
    by_time: BTreeMap<(String, String), Uuid>,
    by_popularity: BTreeMap<(String, String), Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn index_keys(item: &NewsItem) -> ((String, String), (String, String)) {
        let partition = item.scope.partition_key();
        (
            (partition.clone(), item.time_ordered_id.to_string()),
            (partition, item.popularity_key.clone()),
        )
    }

    fn insert_indexed(&mut self, item: NewsItem) {
        let (time_key, pop_key) = Self::index_keys(&item);
        let partition = item.scope.partition_key();
        self.by_hash
            .insert((partition.clone(), item.identity_hash.clone()), item.time_ordered_id);
        self.by_time.insert(time_key, item.time_ordered_id);
        self.by_popularity.insert(pop_key, item.time_ordered_id);
        self.items.insert((partition, item.time_ordered_id), item);
    }

    fn remove_indexed(&mut self, partition: &str, id: Uuid) -> Option<NewsItem> {
        let item = self.items.remove(&(partition.to_string(), id))?;
        let (time_key, pop_key) = Self::index_keys(&item);
        self.by_hash
            .remove(&(partition.to_string(), item.identity_hash.clone()));
        self.by_time.remove(&time_key);
        self.by_popularity.remove(&pop_key);
        Some(item)
    }

    fn get_mut(&mut self, scope: &Scope, id: Uuid) -> Result<&mut NewsItem> {
        let partition = scope.partition_key();
        self.items
            .get_mut(&(partition.clone(), id))
            .ok_or(StoreError::NotFound {
                partition_key: partition,
                time_ordered_id: id.to_string(),
            })
    }
}

#[async_trait]
impl NewsStore for MemoryStore {
    async fn find_by_hash(&self, scope: &Scope, identity_hash: &str) -> Result<Option<NewsItem>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let partition = scope.partition_key();
        let item = inner
            .by_hash
            .get(&(partition.clone(), identity_hash.to_string()))
            .and_then(|id| inner.items.get(&(partition.clone(), *id)))
            .filter(|item| !item.is_expired(Utc::now()))
            .cloned();
        Ok(item)
    }

    async fn insert_new(&self, item: &NewsItem) -> Result<InsertOutcome> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let partition = item.scope.partition_key();
        if let Some(existing_id) = inner
            .by_hash
            .get(&(partition.clone(), item.identity_hash.clone()))
            .copied()
        {
            if let Some(existing) = inner.items.get(&(partition, existing_id)) {
                return Ok(InsertOutcome::AlreadyExists(existing.clone()));
            }
        }
        inner.insert_indexed(item.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn merge_categories(
        &self,
        scope: &Scope,
        time_ordered_id: Uuid,
        categories: &BTreeSet<String>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let item = inner.get_mut(scope, time_ordered_id)?;
        item.categories.extend(categories.iter().cloned());
        Ok(())
    }

    async fn record_engagement(
        &self,
        scope: &Scope,
        time_ordered_id: Uuid,
        engagement: Engagement,
    ) -> Result<NewsItem> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let partition = scope.partition_key();

        let item = inner.get_mut(scope, time_ordered_id)?;
        let old_pop_key = item.popularity_key.clone();
        item.metrics.apply(engagement);
        item.popularity_key = keys::popularity_key(&item.metrics, &item.time_ordered_id);
        let new_pop_key = item.popularity_key.clone();
        let updated = item.clone();

        inner.by_popularity.remove(&(partition.clone(), old_pop_key));
        inner
            .by_popularity
            .insert((partition, new_pop_key), time_ordered_id);
        Ok(updated)
    }

    async fn query_by_time(
        &self,
        scope: &Scope,
        limit: u32,
        after: Option<Uuid>,
    ) -> Result<Vec<NewsItem>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let partition = scope.partition_key();
        let now = Utc::now();
        let after = after.map(|id| id.to_string());

        let items = scan_descending(
            &inner.by_time,
            &inner.items,
            &partition,
            limit,
            after.as_deref(),
            now,
        );
        Ok(items)
    }

    async fn query_by_popularity(
        &self,
        scope: &Scope,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Vec<NewsItem>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let partition = scope.partition_key();
        let now = Utc::now();

        let items = scan_descending(
            &inner.by_popularity,
            &inner.items,
            &partition,
            limit,
            after,
            now,
        );
        Ok(items)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let expired: Vec<(String, Uuid)> = inner
            .items
            .iter()
            .filter(|(_, item)| item.is_expired(now))
            .map(|((partition, id), _)| (partition.clone(), *id))
            .collect();

        let count = expired.len() as u64;
        for (partition, id) in expired {
            inner.remove_indexed(&partition, id);
        }
        Ok(count)
    }
}

/// Walk an ordering index for one partition, descending, resuming strictly
/// after `after` when set, skipping expired items.
fn scan_descending(
    index: &BTreeMap<(String, String), Uuid>,
    items: &HashMap<(String, Uuid), NewsItem>,
    partition: &str,
    limit: u32,
    after: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<NewsItem> {
    let lower = (partition.to_string(), String::new());
    let upper = match after {
        // Descending scan resumes at keys strictly below the cursor key.
        Some(after) => (partition.to_string(), after.to_string()),
        None => (format!("{partition}\u{0}"), String::new()),
    };

    index
        .range(lower..upper)
        .rev()
        .filter_map(|((p, _), id)| items.get(&(p.clone(), *id)))
        .filter(|item| !item.is_expired(now))
        .take(limit as usize)
        .cloned()
        .collect()
}
