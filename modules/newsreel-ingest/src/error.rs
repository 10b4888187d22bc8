use newsreel_store::StoreError;
use thiserror::Error;

/// Failure taxonomy for the ingestion pipeline. Retryable variants carry
/// enough context to decide redelivery; the rest are logged and skipped.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("feed fetch failed: {0}")]
    Fetch(String),

    #[error("feed parse failed: {0}")]
    Parse(String),

    #[error("no source registered under '{0}'")]
    UnknownSource(String),

    #[error("article scrape failed for {url}: {reason}")]
    Scrape { url: String, reason: String },

    #[error("summary generation rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    #[error("snapshot storage error: {0}")]
    Snapshot(String),

    #[error("queue error: {0}")]
    Queue(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
