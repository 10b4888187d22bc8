// Turns a validated feed item into its storable form: identity hash for
// dedup, time-ordered id, seeded popularity key, and expiry stamp.

use newsreel_common::{keys, Metrics, NewsItem, RawItem};

/// Assemble the stored shape of an incoming item. Pure; the dedup decision
/// against the store happens at the enrichment stage.
pub fn assemble(raw: RawItem, retention_days: i64) -> NewsItem {
    let identity_hash = keys::identity_hash(&raw.scope, &raw.canonical_url);
    let time_ordered_id = keys::time_ordered_id(raw.published);
    let metrics = Metrics::default();
    let popularity_key = keys::popularity_key(&metrics, &time_ordered_id);
    let ttl = keys::expiry(raw.published, retention_days);

    NewsItem {
        identity_hash,
        time_ordered_id,
        popularity_key,
        scope: raw.scope,
        source_name: raw.source_name,
        source_id: raw.source_id,
        canonical_url: raw.canonical_url,
        headline: raw.headline,
        summary: raw.summary,
        published: raw.published,
        categories: raw.categories.into_iter().collect(),
        media: raw.media,
        metrics,
        ttl,
    }
}
