//! Turns a finished request attempt into a terminal turn update
//!
//! [`decode`] is the only place that inspects the response shape; everything
//! downstream works on [`Outcome`].

use super::attachment::AttachmentStore;
use super::log::TurnUpdate;
use crate::llm::{GenerateResponse, HttpReply, LlmError};
use regex::Regex;

/// Shown when a success reply does not carry candidate text
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Received a malformed response from the model";

const BOLD_MARKERS: &str = r"\*\*(.*?)\*\*";

/// How a request attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No response was obtained
    TransportFailure(String),
    /// The endpoint answered and reported a failure
    ApiError { status: u16, message: String },
    /// Candidate text, untransformed
    ApiSuccess(String),
    /// Success status without the expected candidate text. Should not happen
    /// with a well-behaved endpoint.
    MalformedSuccess { status: u16 },
}

impl From<LlmError> for Outcome {
    fn from(e: LlmError) -> Self {
        Outcome::TransportFailure(e.message)
    }
}

/// Classify a raw HTTP reply
pub fn decode(reply: &HttpReply) -> Outcome {
    let parsed = serde_json::from_str::<GenerateResponse>(&reply.body);

    if !reply.is_success() {
        let message = parsed
            .ok()
            .and_then(|body| body.error_message().map(str::to_string))
            .unwrap_or_else(|| format!("Request failed with HTTP status {}", reply.status));
        return Outcome::ApiError {
            status: reply.status,
            message,
        };
    }

    let Ok(body) = parsed else {
        return Outcome::MalformedSuccess {
            status: reply.status,
        };
    };

    if let Some(message) = body.error_message() {
        return Outcome::ApiError {
            status: reply.status,
            message: message.to_string(),
        };
    }

    match body.first_text() {
        Some(text) => Outcome::ApiSuccess(text),
        None => Outcome::MalformedSuccess {
            status: reply.status,
        },
    }
}

/// Remove `**` pairs, keeping what they enclose, then trim
pub fn strip_bold(text: &str) -> String {
    let re = match Regex::new(BOLD_MARKERS) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "Bold marker regex failed to compile");
            return text.trim().to_string();
        }
    };
    re.replace_all(text, "$1").trim().to_string()
}

/// Produce the terminal update for the in-flight turn.
///
/// Always clears the staged attachment as part of finalization.
pub fn reconcile(outcome: Outcome, attachments: &mut AttachmentStore) -> TurnUpdate {
    attachments.clear();

    match outcome {
        Outcome::TransportFailure(message) => {
            tracing::warn!(error = %message, "Generation request failed before a response");
            TurnUpdate::failed(message)
        }
        Outcome::ApiError { status, message } => {
            tracing::warn!(status, error = %message, "Endpoint reported an error");
            TurnUpdate::failed(message)
        }
        Outcome::MalformedSuccess { status } => {
            tracing::error!(status, "Success response without candidate text");
            TurnUpdate::failed(MALFORMED_RESPONSE_MESSAGE)
        }
        Outcome::ApiSuccess(text) => TurnUpdate::complete(strip_bold(&text)),
    }
}
