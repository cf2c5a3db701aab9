//! Google Gemini `generateContent` transport

use super::types::{GenerateRequest, HttpReply};
use super::{GenerationService, LlmError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Direct Gemini API root
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiService {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let model = model.into();
        let endpoint = endpoint_url(base_url, &model);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model,
        })
    }

    /// POST to the endpoint with the credential as the `key` query parameter
    fn request(&self, request: &GenerateRequest) -> RequestBuilder {
        self.client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .header("Content-Type", "application/json")
            .json(request)
    }
}

fn endpoint_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

#[async_trait]
impl GenerationService for GeminiService {
    async fn generate(&self, request: &GenerateRequest) -> Result<HttpReply, LlmError> {
        let response = self.request(request).send().await?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        Ok(HttpReply { status, body })
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
