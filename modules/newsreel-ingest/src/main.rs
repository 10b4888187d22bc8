use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use genai_client::GeminiClient;
use newsreel_common::{Config, NewsItem};
use newsreel_ingest::enrich::Summarizer;
use newsreel_ingest::normalize::ParserRegistry;
use newsreel_ingest::pipeline::{EnrichmentWorker, Pipeline};
use newsreel_ingest::process::ProcessStage;
use newsreel_ingest::queue::MemoryQueue;
use newsreel_ingest::reader::Reader;
use newsreel_ingest::scraper::ScraperRegistry;
use newsreel_ingest::snapshot::FsObjectStore;
use newsreel_ingest::sources::SourceRegistry;
use newsreel_store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("newsreel_ingest=info".parse()?))
        .init();

    info!("Newsreel ingest starting...");

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(pool));
    store.migrate().await?;

    let sources = SourceRegistry::builtin();
    let source_ids: Vec<String> = sources.all().map(|s| s.source_id.to_string()).collect();

    let snapshots = Arc::new(FsObjectStore::new(&config.snapshot_dir));
    let queue: Arc<MemoryQueue<NewsItem>> = Arc::new(MemoryQueue::new());

    let generator = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));
    let summarizer = Arc::new(Summarizer::new(
        generator,
        ScraperRegistry::builtin(),
        config.max_retries,
        Duration::from_secs(config.rate_limit_delay_secs),
    ));

    let reader = Reader::new(sources, ParserRegistry::builtin(), snapshots.clone());
    let process = ProcessStage::new(snapshots, queue.clone(), config.retention_days);
    let worker = EnrichmentWorker::new(
        store.clone(),
        summarizer,
        queue,
        config.worker_concurrency,
    );

    let pipeline = Pipeline::new(reader, process, worker, store, source_ids);
    let stats = pipeline.run_cycle().await?;
    info!(%stats, "Run finished");

    Ok(())
}
