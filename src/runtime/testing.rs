//! Mock implementations for testing
//!
//! These mocks enable runtime testing without real I/O.

use crate::llm::{GenerateRequest, GenerationService, HttpReply, LlmError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Generation Service
// ============================================================================

/// Mock service that returns queued replies
pub struct MockService {
    replies: Mutex<VecDeque<Result<HttpReply, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<GenerateRequest>>,
}

#[allow(dead_code)]
impl MockService {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue an HTTP reply (any status)
    pub fn queue_reply(&self, reply: HttpReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    /// Queue a transport failure
    pub fn queue_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<HttpReply, LlmError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock reply queued")))
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockService {
    async fn generate(&self, request: &GenerateRequest) -> Result<HttpReply, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_reply()
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Delayed Mock Generation Service (for busy and timeout testing)
// ============================================================================

/// Mock service with configurable delay
pub struct DelayedMockService {
    inner: MockService,
    delay: Duration,
}

#[allow(dead_code)]
impl DelayedMockService {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockService::new(),
            delay,
        }
    }

    pub fn queue_reply(&self, reply: HttpReply) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_requests(&self) -> Vec<GenerateRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl GenerationService for DelayedMockService {
    async fn generate(&self, request: &GenerateRequest) -> Result<HttpReply, LlmError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
