use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use newsreel_common::{NewsItem, Scope};

/// Resume state for the popularity ordering. The two-level sort
/// (score then id) needs the full key plus the partition it came from;
/// clients only ever see the encoded form.
///
/// Field order is the canonical serialization order; do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularityCursor {
    pub scope: String,
    pub time_ordered_id: Uuid,
    pub popularity_key: String,
}

impl PopularityCursor {
    pub fn from_item(item: &NewsItem) -> Self {
        Self {
            scope: item.scope.partition_key(),
            time_ordered_id: item.time_ordered_id,
            popularity_key: item.popularity_key.clone(),
        }
    }

    /// One opaque printable string: base64url of canonical JSON.
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).expect("cursor serializes");
        URL_SAFE_NO_PAD.encode(json)
    }
}

/// Encode the resume cursor for the last item of a page, in either ordering.
pub fn encode_cursor(item: &NewsItem, popularity: bool) -> String {
    if popularity {
        PopularityCursor::from_item(item).encode()
    } else {
        // The time cursor is the bare time-ordered id; it is already opaque.
        item.time_ordered_id.to_string()
    }
}

/// Decode a time-ordering cursor. Malformed input is never an error for the
/// caller: log and restart from the top of the ordering.
pub fn decode_time_cursor(raw: &str) -> Option<Uuid> {
    match raw.parse::<Uuid>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!(cursor = raw, "Malformed time cursor, restarting from first page");
            None
        }
    }
}

/// Decode a popularity-ordering cursor. A cursor minted for a different
/// scope is treated the same as a malformed one.
pub fn decode_popularity_cursor(raw: &str, scope: &Scope) -> Option<PopularityCursor> {
    let decoded = URL_SAFE_NO_PAD
        .decode(raw)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<PopularityCursor>(&bytes).ok());

    match decoded {
        Some(cursor) if cursor.scope == scope.partition_key() => Some(cursor),
        Some(cursor) => {
            warn!(
                cursor_scope = cursor.scope,
                requested = %scope,
                "Popularity cursor from a different scope, restarting from first page"
            );
            None
        }
        None => {
            warn!(cursor = raw, "Malformed popularity cursor, restarting from first page");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use newsreel_common::{keys, Media, Metrics};

    fn item() -> NewsItem {
        let scope = Scope::new("IN", "EN");
        let published = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let id = keys::time_ordered_id(published);
        let metrics = Metrics {
            views: 42,
            ..Default::default()
        };
        NewsItem {
            identity_hash: keys::identity_hash(&scope, "https://example.com/a"),
            time_ordered_id: id,
            popularity_key: keys::popularity_key(&metrics, &id),
            scope,
            source_name: "NDTV".into(),
            source_id: "ndtv".into(),
            canonical_url: "https://example.com/a".into(),
            headline: "Headline".into(),
            summary: "Summary".into(),
            published,
            categories: Default::default(),
            media: Media::default(),
            metrics,
            ttl: keys::expiry(published, 14),
        }
    }

    #[test]
    fn time_cursor_round_trips() {
        let item = item();
        let encoded = encode_cursor(&item, false);
        assert_eq!(decode_time_cursor(&encoded), Some(item.time_ordered_id));
    }

    #[test]
    fn popularity_cursor_round_trips() {
        let item = item();
        let encoded = encode_cursor(&item, true);
        let decoded = decode_popularity_cursor(&encoded, &item.scope).expect("valid cursor");
        assert_eq!(decoded, PopularityCursor::from_item(&item));
    }

    #[test]
    fn corrupted_cursors_restart_from_first_page() {
        let scope = Scope::new("IN", "EN");
        assert_eq!(decode_time_cursor("not-a-uuid"), None);
        assert_eq!(decode_popularity_cursor("%%%not-base64%%%", &scope), None);
        // Valid base64, junk payload.
        let junk = URL_SAFE_NO_PAD.encode("{\"surprise\":true}");
        assert_eq!(decode_popularity_cursor(&junk, &scope), None);
    }

    #[test]
    fn popularity_cursor_scope_mismatch_restarts() {
        let item = item();
        let encoded = encode_cursor(&item, true);
        let other = Scope::new("US", "EN");
        assert_eq!(decode_popularity_cursor(&encoded, &other), None);
    }

    #[test]
    fn popularity_cursor_is_printable() {
        let encoded = encode_cursor(&item(), true);
        assert!(encoded.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
