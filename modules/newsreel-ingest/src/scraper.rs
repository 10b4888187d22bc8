use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tokio::sync::Semaphore;
use tracing::warn;

use crate::error::{PipelineError, Result};

/// Max in-flight article fetches against a single publisher.
const MAX_CONCURRENT_FETCHES: usize = 4;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Pulls the readable body text of one article page.
#[async_trait]
pub trait ArticleScraper: Send + Sync {
    async fn article_text(&self, url: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// Plain HTTP fetch plus Readability extraction. News article pages render
/// their body server-side, so no browser is needed.
pub struct ReadabilityScraper {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    name: String,
}

impl ReadabilityScraper {
    pub fn new(name: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent("newsreel-ingest/0.1")
            .build()
            .unwrap_or_default();
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES)),
            name: name.to_string(),
        }
    }

    fn extract(&self, url: &str, html: &str) -> String {
        let parsed_url = url::Url::parse(url).ok();
        let config = TransformConfig {
            readability: true,
            main_content: true,
            return_format: ReturnFormat::Markdown,
            filter_images: true,
            filter_svg: true,
            clean_html: true,
        };
        let input = TransformInput {
            url: parsed_url.as_ref(),
            content: html.as_bytes(),
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        };
        transform_content_input(input, &config)
    }
}

#[async_trait]
impl ArticleScraper for ReadabilityScraper {
    async fn article_text(&self, url: &str) -> Result<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| PipelineError::Scrape {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PipelineError::Scrape {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let html = response.text().await.map_err(|e| PipelineError::Scrape {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let text = self.extract(url, &html);
        if text.trim().is_empty() {
            warn!(url, scraper = %self.name, "Empty content after Readability extraction");
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Source-id to scraper mapping, mirroring the parser registry.
pub struct ScraperRegistry {
    scrapers: HashMap<String, Arc<dyn ArticleScraper>>,
}

impl ScraperRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            scrapers: HashMap::new(),
        };
        registry.register("ndtv", Arc::new(ReadabilityScraper::new("ndtv")));
        registry.register("toi", Arc::new(ReadabilityScraper::new("toi")));
        registry
    }

    pub fn empty() -> Self {
        Self {
            scrapers: HashMap::new(),
        }
    }

    pub fn register(&mut self, source_id: &str, scraper: Arc<dyn ArticleScraper>) {
        self.scrapers.insert(source_id.to_string(), scraper);
    }

    pub fn lookup(&self, source_id: &str) -> Option<Arc<dyn ArticleScraper>> {
        self.scrapers.get(source_id).cloned()
    }
}

impl Default for ScraperRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
