//! Chat completion trait.
//!
//! The hosted chat API is an opaque text-in/text-out service. Concrete
//! implementations live in the `ragdex` app crate.

use async_trait::async_trait;

use crate::error::Result;

/// Trait for chat completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o"`).
    fn model_name(&self) -> &str;

    /// Send a single user prompt and return the trimmed reply.
    ///
    /// Failures surface as [`RagError::ChatBackend`](crate::RagError::ChatBackend).
    async fn complete(&self, prompt: &str) -> Result<String>;
}
