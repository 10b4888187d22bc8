// Static catalogue of the publishers the pipeline polls.

use std::collections::HashMap;

use newsreel_common::Scope;

use crate::error::PipelineError;

/// One publisher: a stable id, the scope its articles land in, and the
/// per-category RSS endpoints to poll.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub name: &'static str,
    pub source_id: &'static str,
    pub country: &'static str,
    pub language: &'static str,
    pub feeds: &'static [(&'static str, &'static str)],
}

impl SourceConfig {
    pub fn scope(&self) -> Scope {
        Scope::new(self.country, self.language)
    }
}

const NDTV_FEEDS: &[(&str, &str)] = &[
    ("top stories", "https://feeds.feedburner.com/ndtvnews-top-stories"),
    ("india", "https://feeds.feedburner.com/ndtvnews-india-news"),
    ("sports", "https://feeds.feedburner.com/ndtvsports-latest"),
    ("business", "https://feeds.feedburner.com/ndtvprofit-latest"),
];

const TOI_FEEDS: &[(&str, &str)] = &[
    ("top stories", "https://timesofindia.indiatimes.com/rssfeedstopstories.cms"),
    ("india", "https://timesofindia.indiatimes.com/rssfeeds/-2128936835.cms"),
    ("sports", "https://timesofindia.indiatimes.com/rssfeeds/4719148.cms"),
    ("world", "https://timesofindia.indiatimes.com/rssfeeds/296589292.cms"),
];

const SOURCES: &[SourceConfig] = &[
    SourceConfig {
        name: "NDTV",
        source_id: "ndtv",
        country: "IN",
        language: "EN",
        feeds: NDTV_FEEDS,
    },
    SourceConfig {
        name: "Times of India",
        source_id: "toi",
        country: "IN",
        language: "EN",
        feeds: TOI_FEEDS,
    },
];

/// Lookup by source id. Unknown names come back as a typed error rather
/// than a panic so a bad trigger payload only fails that one run.
pub struct SourceRegistry {
    by_id: HashMap<&'static str, &'static SourceConfig>,
}

impl SourceRegistry {
    pub fn builtin() -> Self {
        Self {
            by_id: SOURCES.iter().map(|s| (s.source_id, s)).collect(),
        }
    }

    pub fn lookup(&self, source_id: &str) -> Result<&'static SourceConfig, PipelineError> {
        self.by_id
            .get(source_id)
            .copied()
            .ok_or_else(|| PipelineError::UnknownSource(source_id.to_string()))
    }

    pub fn all(&self) -> impl Iterator<Item = &'static SourceConfig> + '_ {
        SOURCES.iter()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_source() {
        let registry = SourceRegistry::builtin();
        let ndtv = registry.lookup("ndtv").unwrap();
        assert_eq!(ndtv.name, "NDTV");
        assert_eq!(ndtv.scope().partition_key(), "NEWS#IN#EN");
        assert!(!ndtv.feeds.is_empty());
    }

    #[test]
    fn unknown_source_is_a_typed_error() {
        let registry = SourceRegistry::builtin();
        match registry.lookup("daily-bugle") {
            Err(PipelineError::UnknownSource(name)) => assert_eq!(name, "daily-bugle"),
            other => panic!("expected UnknownSource, got {other:?}"),
        }
    }
}
