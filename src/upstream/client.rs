//! HTTP client for the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

use super::types::{ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use crate::config::{ApiKey, UpstreamConfig};
use crate::error::{Error, Result};

/// Header carrying the API key on every upstream request.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Anything that can turn a prompt into a `generateContent` response.
///
/// The relay handler only talks to this trait, so tests can stand in a
/// deterministic generator for the network client.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate content for a single-turn text prompt.
    async fn generate_content(&self, prompt: &str) -> Result<GenerateContentResponse>;

    /// Model identifier, for logging and `/health`.
    fn model_name(&self) -> &str;
}

/// Gemini REST client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: ApiKey,
}

impl GeminiClient {
    /// Build a client from upstream config.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()?;

        Ok(Self::with_client(http_client, config))
    }

    /// Build a client around an existing reqwest client.
    pub fn with_client(http_client: Client, config: &UpstreamConfig) -> Self {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Self {
            http_client,
            endpoint,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_content(&self, prompt: &str) -> Result<GenerateContentResponse> {
        let request = GenerateContentRequest::from_prompt(prompt);

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, model = %self.model, "Failed to reach Gemini");
                e.without_url()
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
                Ok(envelope) => envelope.error.message,
                Err(_) if body.trim().is_empty() => status
                    .canonical_reason()
                    .unwrap_or("Upstream error")
                    .to_string(),
                Err(_) => body,
            };
            tracing::error!(
                status = %status,
                model = %self.model,
                message = %message,
                "Gemini returned error"
            );
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<GenerateContentResponse>().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse Gemini response");
            e.without_url()
        })?;

        Ok(body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
