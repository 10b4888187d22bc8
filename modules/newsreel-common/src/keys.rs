use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::{NoContext, Timestamp, Uuid};

use crate::types::{Metrics, Scope};

/// Prefix of every popularity key.
pub const POPULARITY_PREFIX: &str = "TOP";

/// Zero-padded width of the score segment. Scores are clamped to this width
/// so the key always compares correctly as plain bytes.
const SCORE_WIDTH: u32 = 10;

/// Default retention window for stored articles.
pub const DEFAULT_RETENTION_DAYS: i64 = 14;

/// Deterministic fingerprint of an article's canonical location within a
/// scope. Repeated polls of the same URL hash to the same value.
pub fn identity_hash(scope: &Scope, canonical_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.partition_key().as_bytes());
    hasher.update(b"#");
    hasher.update(canonical_url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Time-ordered unique id: a UUIDv7 seeded from the *published* instant, so
/// items processed out of order still sort by publication time. Pre-epoch
/// timestamps clamp to the epoch.
pub fn time_ordered_id(published: DateTime<Utc>) -> Uuid {
    let secs = published.timestamp().max(0) as u64;
    let nanos = published.timestamp_subsec_nanos();
    Uuid::new_v7(Timestamp::from_unix(NoContext, secs, nanos))
}

/// Sortable popularity key: `TOP#<zero-padded score>#<time_ordered_id>`.
/// String comparison gives descending-score order with the id as tiebreak.
pub fn popularity_key(metrics: &Metrics, time_ordered_id: &Uuid) -> String {
    let cap = 10u64.pow(SCORE_WIDTH) - 1;
    let score = metrics.score().min(cap);
    format!("{POPULARITY_PREFIX}#{score:010}#{time_ordered_id}")
}

/// Expiry instant as absolute epoch seconds.
pub fn expiry(published: DateTime<Utc>, retention_days: i64) -> i64 {
    published.timestamp() + retention_days * 86_400
}
