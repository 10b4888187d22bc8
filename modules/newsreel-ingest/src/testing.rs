// Test doubles for the enrichment seams.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use genai_client::{GenError, GenerateText};

use crate::error::{PipelineError, Result};
use crate::scraper::ArticleScraper;

pub struct FakeScraper {
    text: Option<String>,
}

impl FakeScraper {
    pub fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl ArticleScraper for FakeScraper {
    async fn article_text(&self, url: &str) -> Result<String> {
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => Err(PipelineError::Scrape {
                url: url.to_string(),
                reason: "scripted failure".into(),
            }),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// What the fake generator does on each call.
pub enum GenScript {
    Ok(String),
    RateLimitedThenOk { failures: u32, summary: String },
    AlwaysRateLimited,
    AlwaysFailing,
}

impl GenScript {
    pub fn ok(summary: &str) -> Self {
        GenScript::Ok(summary.to_string())
    }

    pub fn rate_limited_then_ok(failures: u32, summary: &str) -> Self {
        GenScript::RateLimitedThenOk {
            failures,
            summary: summary.to_string(),
        }
    }

    pub fn always_rate_limited() -> Self {
        GenScript::AlwaysRateLimited
    }

    pub fn always_failing() -> Self {
        GenScript::AlwaysFailing
    }
}

pub struct FakeGenerator {
    script: GenScript,
    calls: AtomicU32,
    last_prompt: Mutex<String>,
}

impl FakeGenerator {
    pub fn new(script: GenScript) -> Self {
        Self {
            script,
            calls: AtomicU32::new(0),
            last_prompt: Mutex::new(String::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> String {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerateText for FakeGenerator {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_prompt.lock().unwrap() = prompt.to_string();

        match &self.script {
            GenScript::Ok(summary) => Ok(summary.clone()),
            GenScript::RateLimitedThenOk { failures, summary } => {
                if call <= *failures {
                    Err(GenError::RateLimited {
                        retry_after: Some(Duration::ZERO),
                    })
                } else {
                    Ok(summary.clone())
                }
            }
            GenScript::AlwaysRateLimited => Err(GenError::RateLimited {
                retry_after: Some(Duration::ZERO),
            }),
            GenScript::AlwaysFailing => Err(GenError::Api {
                status: 500,
                message: "scripted failure".into(),
            }),
        }
    }
}
