//! HTTP client for the Gamma public API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::api::SlidesApi;
use super::error::SlidesError;
use super::types::{
    CreatedGeneration, ExportFormat, ExportSnapshot, ExportTicket, GenerationRequest,
    GenerationSnapshot,
};

/// Configuration for [`GammaClient`].
#[derive(Debug, Clone)]
pub struct GammaConfig {
    pub base_url: String,
    /// Sent as `X-API-KEY`. `None` fails every call with
    /// [`SlidesError::Configuration`].
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GammaConfig {
    pub const DEFAULT_BASE_URL: &str = "https://public-api.gamma.app/v1.0";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

const API_KEY_HEADER: &str = "X-API-KEY";
const MAX_ERROR_BODY: usize = 512;

pub struct GammaClient {
    config: GammaConfig,
    http: Client,
}

impl GammaClient {
    pub fn new(config: GammaConfig) -> Result<Self, SlidesError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GammaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str, SlidesError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SlidesError::Configuration("GAMMA_API_KEY is not configured".to_string()))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SlidesError> {
        let response = request
            .header(API_KEY_HEADER, self.api_key()?)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SlidesError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        warn!(status = status.as_u16(), %body, "gamma API error");
        return Err(SlidesError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| SlidesError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl SlidesApi for GammaClient {
    async fn create_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<CreatedGeneration, SlidesError> {
        debug!(
            num_cards = request.num_cards,
            input_chars = request.input_text.len(),
            "creating gamma generation"
        );
        self.send(self.http.post(self.url("/generations")).json(request))
            .await
    }

    async fn generation_status(
        &self,
        generation_id: &str,
    ) -> Result<GenerationSnapshot, SlidesError> {
        self.send(
            self.http
                .get(self.url(&format!("/generations/{generation_id}"))),
        )
        .await
    }

    async fn request_export(
        &self,
        generation_id: &str,
        format: ExportFormat,
    ) -> Result<ExportTicket, SlidesError> {
        let body = serde_json::json!({ "format": format.as_str() });
        self.send(
            self.http
                .post(self.url(&format!("/generations/{generation_id}/export")))
                .json(&body),
        )
        .await
    }

    async fn export_status(
        &self,
        generation_id: &str,
        export_id: &str,
    ) -> Result<ExportSnapshot, SlidesError> {
        self.send(self.http.get(self.url(&format!(
            "/generations/{generation_id}/exports/{export_id}"
        ))))
        .await
    }
}
