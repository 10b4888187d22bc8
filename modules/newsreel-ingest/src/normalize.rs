// Per-publisher feed parsing. Every publisher formats its RSS a little
// differently, so each gets its own FeedParser impl; the registry maps a
// source id to its parser explicitly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use feed_rs::model::Entry;
use tracing::warn;

use newsreel_common::{sanitise_content, Media, RawItem, Scope};

use crate::error::{PipelineError, Result};

/// Which feed the batch came from, threaded into every parsed item.
#[derive(Debug, Clone)]
pub struct FeedContext {
    pub source_name: String,
    pub source_id: String,
    pub scope: Scope,
    pub category: String,
}

pub trait FeedParser: Send + Sync {
    /// Parse one raw feed body into normalized items. Entries missing a
    /// link or headline are skipped, never fatal for the batch.
    fn parse(&self, body: &[u8], ctx: &FeedContext) -> Result<Vec<RawItem>>;

    fn name(&self) -> &str;
}

fn primary_link(entry: &Entry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() != Some("enclosure"))
        .map(|l| l.href.clone())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))
}

fn base_item(entry: &Entry, ctx: &FeedContext) -> Option<RawItem> {
    let canonical_url = match primary_link(entry) {
        Some(url) => url,
        None => {
            warn!(source = %ctx.source_id, entry = %entry.id, "Feed entry has no link, skipping");
            return None;
        }
    };
    let headline = match entry.title.as_ref() {
        Some(title) if !title.content.trim().is_empty() => sanitise_content(&title.content),
        _ => {
            warn!(source = %ctx.source_id, url = %canonical_url, "Feed entry has no headline, skipping");
            return None;
        }
    };

    let summary = entry
        .summary
        .as_ref()
        .map(|text| sanitise_content(&text.content))
        .unwrap_or_default();
    let published = entry
        .published
        .or(entry.updated)
        .unwrap_or_else(|| {
            warn!(source = %ctx.source_id, url = %canonical_url, "Feed entry has no timestamp, using now");
            Utc::now()
        });

    Some(RawItem {
        source_name: ctx.source_name.clone(),
        source_id: ctx.source_id.clone(),
        scope: ctx.scope.clone(),
        canonical_url,
        headline,
        summary,
        published,
        categories: vec![ctx.category.clone()],
        media: Media::default(),
    })
}

fn parse_feed(body: &[u8], ctx: &FeedContext) -> Result<Vec<Entry>> {
    let feed = feed_rs::parser::parse(body)
        .map_err(|e| PipelineError::Parse(format!("{}: {e}", ctx.source_id)))?;
    Ok(feed.entries)
}

/// NDTV: image in media:content, extra topic tags in entry categories.
pub struct NdtvParser;

impl FeedParser for NdtvParser {
    fn parse(&self, body: &[u8], ctx: &FeedContext) -> Result<Vec<RawItem>> {
        let entries = parse_feed(body, ctx)?;
        let items = entries
            .iter()
            .filter_map(|entry| {
                let mut item = base_item(entry, ctx)?;
                item.media.image_url = entry
                    .media
                    .iter()
                    .flat_map(|m| m.content.iter())
                    .find_map(|c| c.url.as_ref().map(|u| u.to_string()));
                for category in &entry.categories {
                    let term = category.term.trim().to_lowercase();
                    if !term.is_empty() && !item.categories.contains(&term) {
                        item.categories.push(term);
                    }
                }
                Some(item)
            })
            .collect();
        Ok(items)
    }

    fn name(&self) -> &str {
        "ndtv"
    }
}

/// Times of India: image rides in the enclosure link or media thumbnail.
pub struct ToiParser;

impl FeedParser for ToiParser {
    fn parse(&self, body: &[u8], ctx: &FeedContext) -> Result<Vec<RawItem>> {
        let entries = parse_feed(body, ctx)?;
        let items = entries
            .iter()
            .filter_map(|entry| {
                let mut item = base_item(entry, ctx)?;
                item.media.image_url = entry
                    .links
                    .iter()
                    .find(|l| l.rel.as_deref() == Some("enclosure"))
                    .map(|l| l.href.clone())
                    .or_else(|| {
                        entry
                            .media
                            .iter()
                            .flat_map(|m| m.thumbnails.iter())
                            .next()
                            .map(|t| t.image.uri.clone())
                    });
                Some(item)
            })
            .collect();
        Ok(items)
    }

    fn name(&self) -> &str {
        "toi"
    }
}

/// Explicit source-id to parser mapping.
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn FeedParser>>,
}

impl ParserRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            parsers: HashMap::new(),
        };
        registry.register("ndtv", Arc::new(NdtvParser));
        registry.register("toi", Arc::new(ToiParser));
        registry
    }

    pub fn register(&mut self, source_id: &str, parser: Arc<dyn FeedParser>) {
        self.parsers.insert(source_id.to_string(), parser);
    }

    pub fn lookup(&self, source_id: &str) -> Result<Arc<dyn FeedParser>> {
        self.parsers
            .get(source_id)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownSource(source_id.to_string()))
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FeedContext {
        FeedContext {
            source_name: "NDTV".into(),
            source_id: "ndtv".into(),
            scope: Scope::new("IN", "EN"),
            category: "sports".into(),
        }
    }

    const NDTV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>NDTV Sports</title>
    <item>
      <title>India Clinch &lt;b&gt;Thriller&lt;/b&gt; In Final Over</title>
      <link>https://sports.ndtv.com/cricket/india-clinch-thriller</link>
      <description>&lt;p&gt;A last-ball finish&amp;nbsp;sealed the series.&lt;/p&gt;</description>
      <pubDate>Sat, 01 Mar 2025 08:00:00 GMT</pubDate>
      <category>Cricket</category>
      <media:content url="https://c.ndtvimg.com/thriller.jpg" medium="image"/>
    </item>
    <item>
      <title>Entry without a link gets skipped</title>
      <pubDate>Sat, 01 Mar 2025 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn ndtv_feed_normalizes_entries() {
        let items = NdtvParser.parse(NDTV_FEED.as_bytes(), &ctx()).unwrap();
        assert_eq!(items.len(), 1);

        let item = &items[0];
        assert_eq!(
            item.canonical_url,
            "https://sports.ndtv.com/cricket/india-clinch-thriller"
        );
        assert_eq!(item.headline, "India Clinch Thriller In Final Over");
        assert_eq!(item.summary, "A last-ball finish sealed the series.");
        assert_eq!(item.categories, vec!["sports", "cricket"]);
        assert_eq!(
            item.media.image_url.as_deref(),
            Some("https://c.ndtvimg.com/thriller.jpg")
        );
        assert_eq!(item.scope.partition_key(), "NEWS#IN#EN");
    }

    #[test]
    fn garbage_body_is_a_parse_error() {
        let result = NdtvParser.parse(b"this is not xml", &ctx());
        assert!(matches!(result, Err(PipelineError::Parse(_))));
    }

    #[test]
    fn registry_misses_are_typed() {
        let registry = ParserRegistry::builtin();
        assert!(registry.lookup("ndtv").is_ok());
        assert!(matches!(
            registry.lookup("nope"),
            Err(PipelineError::UnknownSource(_))
        ));
    }
}
