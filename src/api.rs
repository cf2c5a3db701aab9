//! HTTP API: the UI boundary of the chat session

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::SessionHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub max_attachment_bytes: usize,
}

impl AppState {
    pub fn new(session: SessionHandle, max_attachment_bytes: usize) -> Self {
        Self {
            session,
            max_attachment_bytes,
        }
    }
}
