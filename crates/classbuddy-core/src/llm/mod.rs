//! The chat-model seam and its OpenAI-compatible gateway client.

pub mod error;
pub mod gateway;

use async_trait::async_trait;

pub use error::ChatError;
pub use gateway::{ChatConfig, GatewayClient};

/// A single-turn request: one system prompt, one user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// Adapter interface for text-completion backends.
///
/// Implementations return the model's raw reply text. An empty string means
/// the backend answered without content; callers decide how to treat it.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Human-readable backend name for logs (e.g. "gateway").
    fn name(&self) -> &str;

    /// Run one completion.
    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn ChatModel) {}
};
