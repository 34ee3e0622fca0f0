//! Generation client trait

use async_trait::async_trait;

use crate::error::Result;

/// Trait for answer generation against an LLM backend
///
/// Implemented by `ChatClient` for OpenAI-compatible chat APIs. Failures
/// surface to the caller as `Error::Generation`; the engine does not retry
/// them.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a completion for the assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Client name for logging
    fn name(&self) -> &str;
}
