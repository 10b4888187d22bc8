use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenError;
use crate::traits::GenerateText;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini generateContent endpoint.
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerateText for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        debug!(model = %self.model, "Gemini generate request");

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::RateLimited {
                retry_after: retry_delay_hint(&body),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenError::Malformed(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(GenError::Malformed("no candidate text in response".into()));
        }

        Ok(text)
    }
}

/// Extract the provider's RetryInfo delay hint (e.g. `"retryDelay": "20s"`)
/// from a rate-limit error body. Absent or unparseable hints yield None.
fn retry_delay_hint(body: &str) -> Option<Duration> {
    let envelope: ApiErrorEnvelope = serde_json::from_str(body).ok()?;
    for detail in envelope.error?.details {
        if detail.get("@type").and_then(|t| t.as_str())
            == Some("type.googleapis.com/google.rpc.RetryInfo")
        {
            let delay = detail.get("retryDelay")?.as_str()?;
            let secs: u64 = delay.strip_suffix('s')?.parse().ok()?;
            return Some(Duration::from_secs(secs));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_new() {
        let client = GeminiClient::new("test-key", "gemma-3-27b-it");
        assert_eq!(client.model(), "gemma-3-27b-it");
    }

    #[test]
    fn retry_hint_parses_retry_info_detail() {
        let body = r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED",
            "details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"20s"}]}}"#;
        assert_eq!(retry_delay_hint(body), Some(Duration::from_secs(20)));
    }

    #[test]
    fn retry_hint_absent_yields_none() {
        let body = r#"{"error":{"code":429,"message":"quota","details":[]}}"#;
        assert_eq!(retry_delay_hint(body), None);
        assert_eq!(retry_delay_hint("not json"), None);
    }
}
