// Postgres persistence for stored articles.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use newsreel_common::{keys, Engagement, Media, Metrics, NewsItem, Scope};

use crate::error::{Result, StoreError};
use crate::store::{InsertOutcome, NewsStore};

pub struct PgStore {
    pool: PgPool,
}

/// A row from the news_items table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct NewsRow {
    partition_key: String,
    time_ordered_id: Uuid,
    identity_hash: String,
    popularity_key: String,
    source_name: String,
    source_id: String,
    canonical_url: String,
    headline: String,
    summary: String,
    published: DateTime<Utc>,
    categories: serde_json::Value,
    media: serde_json::Value,
    views: i64,
    likes: i64,
    shares: i64,
    bookmarks: i64,
    ttl: i64,
}

impl NewsRow {
    fn into_item(self) -> Result<NewsItem> {
        let scope = Scope::from_partition_key(&self.partition_key).ok_or_else(|| {
            StoreError::Corrupt(format!("bad partition key: {}", self.partition_key))
        })?;
        let categories: BTreeSet<String> = serde_json::from_value(self.categories)
            .map_err(|e| StoreError::Corrupt(format!("bad categories json: {e}")))?;
        let media: Media = serde_json::from_value(self.media)
            .map_err(|e| StoreError::Corrupt(format!("bad media json: {e}")))?;

        Ok(NewsItem {
            scope,
            identity_hash: self.identity_hash,
            time_ordered_id: self.time_ordered_id,
            popularity_key: self.popularity_key,
            source_name: self.source_name,
            source_id: self.source_id,
            canonical_url: self.canonical_url,
            headline: self.headline,
            summary: self.summary,
            published: self.published,
            categories,
            media,
            metrics: Metrics {
                views: self.views.max(0) as u64,
                likes: self.likes.max(0) as u64,
                shares: self.shares.max(0) as u64,
                bookmarks: self.bookmarks.max(0) as u64,
            },
            ttl: self.ttl,
        })
    }
}

const SELECT_COLUMNS: &str = "partition_key, time_ordered_id, identity_hash, popularity_key, \
     source_name, source_id, canonical_url, headline, summary, published, \
     categories, media, views, likes, shares, bookmarks, ttl";

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))?;
        Ok(())
    }

    async fn fetch_by_hash(&self, partition: &str, identity_hash: &str) -> Result<Option<NewsRow>> {
        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM news_items \
             WHERE partition_key = $1 AND identity_hash = $2"
        ))
        .bind(partition)
        .bind(identity_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl NewsStore for PgStore {
    async fn find_by_hash(&self, scope: &Scope, identity_hash: &str) -> Result<Option<NewsItem>> {
        let row = self
            .fetch_by_hash(&scope.partition_key(), identity_hash)
            .await?;
        match row {
            Some(row) if row.ttl > Utc::now().timestamp() => Ok(Some(row.into_item()?)),
            _ => Ok(None),
        }
    }

    async fn insert_new(&self, item: &NewsItem) -> Result<InsertOutcome> {
        let partition = item.scope.partition_key();
        let categories = serde_json::to_value(&item.categories)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let media =
            serde_json::to_value(&item.media).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO news_items
                (partition_key, time_ordered_id, identity_hash, popularity_key,
                 source_name, source_id, canonical_url, headline, summary, published,
                 categories, media, views, likes, shares, bookmarks, ttl)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (partition_key, identity_hash) DO NOTHING
            "#,
        )
        .bind(&partition)
        .bind(item.time_ordered_id)
        .bind(&item.identity_hash)
        .bind(&item.popularity_key)
        .bind(&item.source_name)
        .bind(&item.source_id)
        .bind(&item.canonical_url)
        .bind(&item.headline)
        .bind(&item.summary)
        .bind(item.published)
        .bind(categories)
        .bind(media)
        .bind(item.metrics.views as i64)
        .bind(item.metrics.likes as i64)
        .bind(item.metrics.shares as i64)
        .bind(item.metrics.bookmarks as i64)
        .bind(item.ttl)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(InsertOutcome::Inserted);
        }

        // Lost the conditional insert: another worker holds the row.
        let existing = self
            .fetch_by_hash(&partition, &item.identity_hash)
            .await?
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "insert conflict but no row for hash {}",
                    item.identity_hash
                ))
            })?;
        Ok(InsertOutcome::AlreadyExists(existing.into_item()?))
    }

    async fn merge_categories(
        &self,
        scope: &Scope,
        time_ordered_id: Uuid,
        categories: &BTreeSet<String>,
    ) -> Result<()> {
        let partition = scope.partition_key();
        let mut tx = self.pool.begin().await?;

        let current: serde_json::Value = sqlx::query_scalar(
            "SELECT categories FROM news_items \
             WHERE partition_key = $1 AND time_ordered_id = $2 FOR UPDATE",
        )
        .bind(&partition)
        .bind(time_ordered_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound {
            partition_key: partition.clone(),
            time_ordered_id: time_ordered_id.to_string(),
        })?;

        let mut merged: BTreeSet<String> = serde_json::from_value(current)
            .map_err(|e| StoreError::Corrupt(format!("bad categories json: {e}")))?;
        merged.extend(categories.iter().cloned());

        sqlx::query(
            "UPDATE news_items SET categories = $3 \
             WHERE partition_key = $1 AND time_ordered_id = $2",
        )
        .bind(&partition)
        .bind(time_ordered_id)
        .bind(serde_json::to_value(&merged).map_err(|e| StoreError::Corrupt(e.to_string()))?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn record_engagement(
        &self,
        scope: &Scope,
        time_ordered_id: Uuid,
        engagement: Engagement,
    ) -> Result<NewsItem> {
        let partition = scope.partition_key();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM news_items \
             WHERE partition_key = $1 AND time_ordered_id = $2 FOR UPDATE"
        ))
        .bind(&partition)
        .bind(time_ordered_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound {
            partition_key: partition.clone(),
            time_ordered_id: time_ordered_id.to_string(),
        })?;

        let mut item = row.into_item()?;
        item.metrics.apply(engagement);
        item.popularity_key = keys::popularity_key(&item.metrics, &item.time_ordered_id);

        sqlx::query(
            "UPDATE news_items \
             SET views = $3, likes = $4, shares = $5, bookmarks = $6, popularity_key = $7 \
             WHERE partition_key = $1 AND time_ordered_id = $2",
        )
        .bind(&partition)
        .bind(time_ordered_id)
        .bind(item.metrics.views as i64)
        .bind(item.metrics.likes as i64)
        .bind(item.metrics.shares as i64)
        .bind(item.metrics.bookmarks as i64)
        .bind(&item.popularity_key)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn query_by_time(
        &self,
        scope: &Scope,
        limit: u32,
        after: Option<Uuid>,
    ) -> Result<Vec<NewsItem>> {
        // Postgres compares UUIDs bytewise, which for v7 ids is
        // chronological order.
        let rows = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM news_items \
             WHERE partition_key = $1 AND ttl > $2 \
               AND ($3::uuid IS NULL OR time_ordered_id < $3) \
             ORDER BY time_ordered_id DESC LIMIT $4"
        ))
        .bind(scope.partition_key())
        .bind(Utc::now().timestamp())
        .bind(after)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NewsRow::into_item).collect()
    }

    async fn query_by_popularity(
        &self,
        scope: &Scope,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Vec<NewsItem>> {
        let rows = sqlx::query_as::<_, NewsRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM news_items \
             WHERE partition_key = $1 AND ttl > $2 \
               AND ($3::text IS NULL OR popularity_key < $3) \
             ORDER BY popularity_key DESC LIMIT $4"
        ))
        .bind(scope.partition_key())
        .bind(Utc::now().timestamp())
        .bind(after)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NewsRow::into_item).collect()
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM news_items WHERE ttl <= $1")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
