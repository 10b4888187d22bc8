// AI summarization stage. Rate limits are the only retryable failure;
// everything else falls back to the publisher's own summary so one bad
// article never wedges the queue.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use genai_client::{GenError, GenerateText};
use newsreel_common::NewsItem;

use crate::error::{PipelineError, Result};
use crate::scraper::ScraperRegistry;

const SUMMARY_PROMPT: &str =
    "Summarize the following article in 99 words. Only provide the summary, no other text.\n";

/// Keep prompts bounded; article bodies past this add nothing to a
/// 99-word summary.
const MAX_ARTICLE_CHARS: usize = 30_000;

pub struct Summarizer {
    generator: Arc<dyn GenerateText>,
    scrapers: ScraperRegistry,
    max_retries: u32,
    default_delay: Duration,
}

impl Summarizer {
    pub fn new(
        generator: Arc<dyn GenerateText>,
        scrapers: ScraperRegistry,
        max_retries: u32,
        default_delay: Duration,
    ) -> Self {
        Self {
            generator,
            scrapers,
            max_retries,
            default_delay,
        }
    }

    /// Produce the stored summary for a fresh item. Returns the feed's own
    /// summary when scraping or generation fails for a non-rate-limit
    /// reason; rate-limit exhaustion is the one fatal outcome.
    pub async fn summarise(&self, item: &NewsItem) -> Result<String> {
        let article = match self.fetch_article(item).await {
            Some(text) => text,
            None => return Ok(item.summary.clone()),
        };

        let truncated: String = article.chars().take(MAX_ARTICLE_CHARS).collect();
        let prompt = format!("{SUMMARY_PROMPT}{truncated}");

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.generator.generate(&prompt).await {
                Ok(summary) => {
                    debug!(url = %item.canonical_url, attempt, "Generated summary");
                    return Ok(summary.trim().to_string());
                }
                Err(GenError::RateLimited { retry_after }) => {
                    if attempt > self.max_retries {
                        return Err(PipelineError::RateLimitExhausted { attempts: attempt });
                    }
                    let delay = retry_after.unwrap_or(self.default_delay);
                    warn!(
                        url = %item.canonical_url,
                        attempt,
                        delay_secs = delay.as_secs(),
                        "Summary generation rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(url = %item.canonical_url, error = %e, "Summary generation failed, keeping feed summary");
                    return Ok(item.summary.clone());
                }
            }
        }
    }

    async fn fetch_article(&self, item: &NewsItem) -> Option<String> {
        let scraper = match self.scrapers.lookup(&item.source_id) {
            Some(scraper) => scraper,
            None => {
                warn!(source = %item.source_id, "No scraper registered, keeping feed summary");
                return None;
            }
        };
        match scraper.article_text(&item.canonical_url).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!(url = %item.canonical_url, "Scrape returned no text, keeping feed summary");
                None
            }
            Err(e) => {
                warn!(url = %item.canonical_url, error = %e, "Scrape failed, keeping feed summary");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGenerator, FakeScraper, GenScript};
    use chrono::Utc;
    use newsreel_common::{keys, Media, Metrics, NewsItem, Scope};

    fn item() -> NewsItem {
        let scope = Scope::new("IN", "EN");
        let published = Utc::now();
        let id = keys::time_ordered_id(published);
        let metrics = Metrics::default();
        NewsItem {
            identity_hash: keys::identity_hash(&scope, "https://example.com/a"),
            time_ordered_id: id,
            popularity_key: keys::popularity_key(&metrics, &id),
            scope,
            source_name: "NDTV".into(),
            source_id: "ndtv".into(),
            canonical_url: "https://example.com/a".into(),
            headline: "Headline".into(),
            summary: "Feed summary".into(),
            published,
            categories: Default::default(),
            media: Media::default(),
            metrics,
            ttl: keys::expiry(published, 14),
        }
    }

    fn scrapers() -> ScraperRegistry {
        let mut registry = ScraperRegistry::empty();
        registry.register(
            "ndtv",
            Arc::new(FakeScraper::returning("Full article text.")),
        );
        registry
    }

    fn summarizer(script: GenScript) -> (Summarizer, Arc<FakeGenerator>) {
        let generator = Arc::new(FakeGenerator::new(script));
        let summarizer = Summarizer::new(generator.clone(), scrapers(), 3, Duration::ZERO);
        (summarizer, generator)
    }

    #[tokio::test]
    async fn happy_path_uses_generated_summary() {
        let (summarizer, generator) = summarizer(GenScript::ok("A crisp summary."));
        let summary = summarizer.summarise(&item()).await.unwrap();
        assert_eq!(summary, "A crisp summary.");
        assert_eq!(generator.calls(), 1);
        assert!(generator.last_prompt().contains("99 words"));
        assert!(generator.last_prompt().contains("Full article text."));
    }

    #[tokio::test]
    async fn rate_limits_retry_then_succeed() {
        // Two 429s then success: three calls, never a fourth.
        let (summarizer, generator) =
            summarizer(GenScript::rate_limited_then_ok(2, "Recovered summary."));
        let summary = summarizer.summarise(&item()).await.unwrap();
        assert_eq!(summary, "Recovered summary.");
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn rate_limit_exhaustion_is_fatal_for_the_item() {
        let (summarizer, generator) = summarizer(GenScript::always_rate_limited());
        let err = summarizer.summarise(&item()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RateLimitExhausted { attempts: 4 }
        ));
        // Initial attempt plus max_retries.
        assert_eq!(generator.calls(), 4);
    }

    #[tokio::test]
    async fn non_rate_limit_failure_falls_back_to_feed_summary() {
        let (summarizer, generator) = summarizer(GenScript::always_failing());
        let summary = summarizer.summarise(&item()).await.unwrap();
        assert_eq!(summary, "Feed summary");
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn scrape_failure_skips_generation_entirely() {
        let mut registry = ScraperRegistry::empty();
        registry.register("ndtv", Arc::new(FakeScraper::failing()));
        let generator = Arc::new(FakeGenerator::new(GenScript::ok("unused")));
        let summarizer = Summarizer::new(generator.clone(), registry, 3, Duration::ZERO);

        let summary = summarizer.summarise(&item()).await.unwrap();
        assert_eq!(summary, "Feed summary");
        assert_eq!(generator.calls(), 0);
    }
}
