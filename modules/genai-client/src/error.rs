use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// The provider rejected the request for quota reasons. Carries the
    /// provider's retry-delay hint when one was present in the payload.
    #[error("generation service rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed generation response: {0}")]
    Malformed(String),
}

impl GenError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GenError::RateLimited { .. })
    }
}
