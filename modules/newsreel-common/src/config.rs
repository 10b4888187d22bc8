use std::env;

use crate::keys::DEFAULT_RETENTION_DAYS;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Generation service
    pub gemini_api_key: String,
    pub gemini_model: String,

    // Feed snapshots
    pub snapshot_dir: String,

    // Pipeline knobs
    pub retention_days: i64,
    pub page_size: u32,
    pub max_retries: u32,
    pub rate_limit_delay_secs: u64,
    pub worker_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            gemini_api_key: required_env("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL_NAME")
                .unwrap_or_else(|_| "gemma-3-27b-it".to_string()),
            snapshot_dir: env::var("SNAPSHOT_DIR").unwrap_or_else(|_| "/tmp/newsreel".to_string()),
            retention_days: parsed_env("NEWS_TTL_DAYS", DEFAULT_RETENTION_DAYS),
            page_size: parsed_env("FEED_PAGE_SIZE", 50),
            max_retries: parsed_env("SUMMARY_MAX_RETRIES", 3),
            rate_limit_delay_secs: parsed_env("SUMMARY_RATE_LIMIT_DELAY_SECS", 60),
            worker_concurrency: parsed_env("WORKER_CONCURRENCY", 4),
        }
    }

    /// Load a minimal config for read-only feed queries (no AI key needed).
    pub fn query_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            gemini_api_key: String::new(),
            gemini_model: String::new(),
            snapshot_dir: String::new(),
            retention_days: parsed_env("NEWS_TTL_DAYS", DEFAULT_RETENTION_DAYS),
            page_size: parsed_env("FEED_PAGE_SIZE", 50),
            max_retries: 0,
            rate_limit_delay_secs: 0,
            worker_concurrency: 1,
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
