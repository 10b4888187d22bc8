use async_trait::async_trait;

use crate::error::GenError;

/// The generation-service contract: one prompt in, generated text out, or a
/// classified failure. Implemented by provider clients and by test fakes.
#[async_trait]
pub trait GenerateText: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenError>;
}
