//! Text-generation endpoint access
//!
//! The session core never talks HTTP itself; it hands a [`GenerateRequest`]
//! to a [`GenerationService`] and gets back either the raw reply or a
//! transport error.

mod error;
mod gemini;
mod types;

pub use error::LlmError;
pub use gemini::{GeminiService, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for generation endpoints
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// POST one request. Non-success HTTP statuses are returned as replies,
    /// only failures to obtain a response at all are errors.
    async fn generate(&self, request: &GenerateRequest) -> Result<HttpReply, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: GenerationService + ?Sized> GenerationService for Arc<T> {
    async fn generate(&self, request: &GenerateRequest) -> Result<HttpReply, LlmError> {
        (**self).generate(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for generation services
pub struct LoggingService {
    inner: Arc<dyn GenerationService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn GenerationService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl GenerationService for LoggingService {
    async fn generate(&self, request: &GenerateRequest) -> Result<HttpReply, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    status = reply.status,
                    parts = request.parts().len(),
                    "Generation request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Generation request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
