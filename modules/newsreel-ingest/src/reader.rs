// Reader stage: poll every feed of one publisher, normalize the entries,
// and snapshot the batch for the process stage. One broken feed never
// takes down the rest of the source.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use newsreel_common::RawItem;

use crate::error::{PipelineError, Result};
use crate::normalize::{FeedContext, ParserRegistry};
use crate::snapshot::ObjectStore;
use crate::sources::SourceRegistry;

const FEED_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Reader {
    sources: SourceRegistry,
    parsers: ParserRegistry,
    snapshots: Arc<dyn ObjectStore>,
    client: reqwest::Client,
}

impl Reader {
    pub fn new(
        sources: SourceRegistry,
        parsers: ParserRegistry,
        snapshots: Arc<dyn ObjectStore>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .user_agent("newsreel-ingest/0.1")
            .build()
            .unwrap_or_default();
        Self {
            sources,
            parsers,
            snapshots,
            client,
        }
    }

    /// Poll all feeds of one source and write the combined snapshot.
    /// Returns the snapshot key for the process stage.
    pub async fn read_source(&self, source_id: &str) -> Result<String> {
        let source = self.sources.lookup(source_id)?;
        let parser = self.parsers.lookup(source.source_id)?;

        let mut items: Vec<RawItem> = Vec::new();
        for (category, url) in source.feeds {
            let ctx = FeedContext {
                source_name: source.name.to_string(),
                source_id: source.source_id.to_string(),
                scope: source.scope(),
                category: category.to_string(),
            };
            match self.fetch_feed(url).await {
                Ok(body) => match parser.parse(&body, &ctx) {
                    Ok(batch) => {
                        info!(source = source_id, category, count = batch.len(), "Parsed feed");
                        items.extend(batch);
                    }
                    Err(e) => {
                        warn!(source = source_id, category, url, error = %e, "Feed parse failed, skipping feed");
                    }
                },
                Err(e) => {
                    warn!(source = source_id, category, url, error = %e, "Feed fetch failed, skipping feed");
                }
            }
        }

        let key = snapshot_key(source.source_id);
        let body = serde_json::to_vec(&items)
            .map_err(|e| PipelineError::Snapshot(format!("encode snapshot: {e}")))?;
        self.snapshots.put(&key, body).await?;
        info!(source = source_id, key, count = items.len(), "Wrote feed snapshot");
        Ok(key)
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PipelineError::Fetch(format!("{url}: {e}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Fetch(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

pub fn snapshot_key(source_id: &str) -> String {
    format!("{source_id}-latest.json")
}
