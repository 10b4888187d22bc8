use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Scope ---

/// Partition scope for a feed audience: country + language.
///
/// Category is deliberately not part of the scope: partitioning by category
/// would shard one article across several partitions and break the
/// one-item-per-(scope, identity_hash) invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub country: String,
    pub language: String,
}

impl Scope {
    pub fn new(country: &str, language: &str) -> Self {
        Self {
            country: country.to_uppercase(),
            language: language.to_uppercase(),
        }
    }

    /// The store partition key, e.g. `NEWS#IN#EN`.
    pub fn partition_key(&self) -> String {
        format!("NEWS#{}#{}", self.country, self.language)
    }

    /// Inverse of `partition_key`. Returns None for anything that is not a
    /// `NEWS#<country>#<language>` key.
    pub fn from_partition_key(key: &str) -> Option<Self> {
        let mut parts = key.split('#');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("NEWS"), Some(country), Some(language), None)
                if !country.is_empty() && !language.is_empty() =>
            {
                Some(Self::new(country, language))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.country, self.language)
    }
}

// --- Feed item shapes ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

/// A normalized article as it travels between the process and summarise
/// stages: common shape, no store-assigned keys yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub source_name: String,
    pub source_id: String,
    pub scope: Scope,
    pub canonical_url: String,
    pub headline: String,
    pub summary: String,
    pub published: DateTime<Utc>,
    pub categories: Vec<String>,
    pub media: Media,
}

/// Outcome of validating a normalized record. A variant, not an error:
/// callers must handle the invalid case explicitly.
#[derive(Debug, Clone)]
pub enum Validated {
    Valid(RawItem),
    Invalid { item: RawItem, reason: String },
}

impl RawItem {
    /// Check the fields every downstream stage depends on.
    pub fn validate(self) -> Validated {
        let reason = if self.canonical_url.trim().is_empty() {
            Some("missing canonical URL")
        } else if self.headline.trim().is_empty() {
            Some("missing headline")
        } else if self.source_id.trim().is_empty() {
            Some("missing source id")
        } else {
            None
        };

        match reason {
            None => Validated::Valid(self),
            Some(reason) => Validated::Invalid {
                item: self,
                reason: reason.to_string(),
            },
        }
    }
}

// --- Metrics ---

/// Engagement counters. All start at zero; the popularity key is recomputed
/// from these whenever they change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub views: u64,
    pub likes: u64,
    pub shares: u64,
    pub bookmarks: u64,
}

impl Metrics {
    /// Weighted engagement score: views x1, likes x10, bookmarks x10,
    /// shares x100.
    pub fn score(&self) -> u64 {
        self.views
            .saturating_mul(1)
            .saturating_add(self.likes.saturating_mul(10))
            .saturating_add(self.bookmarks.saturating_mul(10))
            .saturating_add(self.shares.saturating_mul(100))
    }
}

/// A single engagement signal against a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    View,
    Like,
    Share,
    Bookmark,
}

impl Metrics {
    pub fn apply(&mut self, engagement: Engagement) {
        let counter = match engagement {
            Engagement::View => &mut self.views,
            Engagement::Like => &mut self.likes,
            Engagement::Share => &mut self.shares,
            Engagement::Bookmark => &mut self.bookmarks,
        };
        *counter = counter.saturating_add(1);
    }
}

// --- Stored item ---

/// The stored shape of an article: a RawItem plus every store-assigned key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub scope: Scope,
    /// SHA-256 over partition key + canonical URL. Unique within the scope.
    pub identity_hash: String,
    /// UUIDv7 seeded from the published instant. Assigned once, never
    /// recomputed; its string order is chronological order.
    pub time_ordered_id: Uuid,
    /// `TOP#<10-digit score>#<time_ordered_id>`. Pure function of metrics
    /// and id.
    pub popularity_key: String,
    pub source_name: String,
    pub source_id: String,
    pub canonical_url: String,
    pub headline: String,
    pub summary: String,
    pub published: DateTime<Utc>,
    pub categories: BTreeSet<String>,
    pub media: Media,
    pub metrics: Metrics,
    /// Expiry instant, epoch seconds: published + retention window.
    pub ttl: i64,
}

impl NewsItem {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.ttl <= now.timestamp()
    }
}
