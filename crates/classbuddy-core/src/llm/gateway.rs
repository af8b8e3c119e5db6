//! OpenAI-compatible chat completions client.
//!
//! Speaks `POST {base_url}/chat/completions` with bearer auth and reads the
//! reply text from `choices[0].message.content`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ChatError, ChatModel, ChatRequest};

/// Configuration for [`GatewayClient`].
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    /// Bearer credential. `None` makes every call fail with
    /// [`ChatError::MissingApiKey`].
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl ChatConfig {
    pub const DEFAULT_BASE_URL: &str = "https://ai.gateway.lovable.dev/v1";
    pub const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";
    pub const DEFAULT_MAX_TOKENS: u32 = 32_000;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Longest upstream error body kept in [`ChatError::Api`].
const MAX_ERROR_BODY: usize = 512;

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// HTTP chat client for OpenAI-compatible gateways.
pub struct GatewayClient {
    config: ChatConfig,
    http: Client,
}

impl GatewayClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatModel for GatewayClient {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ChatError::MissingApiKey)?;

        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens.min(self.config.max_tokens),
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
        });

        debug!(
            model = %self.config.model,
            prompt_chars = request.user.len(),
            "sending chat completion"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat backend returned an error");
            return Err(ChatError::from_status(status.as_u16(), truncate_body(&text)));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        debug!(reply_chars = content.len(), "chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_trailing_slash() {
        let client = GatewayClient::new(ChatConfig {
            base_url: "http://localhost:9999/v1/".to_string(),
            ..ChatConfig::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn truncate_body_is_char_safe() {
        let long = "é".repeat(MAX_ERROR_BODY + 10);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), MAX_ERROR_BODY + 3);
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = GatewayClient::new(ChatConfig {
            // Unroutable: a request attempt would surface as a network error.
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: Some("   ".to_string()),
            ..ChatConfig::default()
        })
        .unwrap();
        let req = ChatRequest {
            system: "s".to_string(),
            user: "u".to_string(),
            max_tokens: 10,
        };
        assert!(matches!(
            client.complete(&req).await,
            Err(ChatError::MissingApiKey)
        ));
    }
}
