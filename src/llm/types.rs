//! Wire types for the `generateContent` endpoint

use serde::{Deserialize, Serialize};

/// Outbound request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    /// A request carrying a single user turn
    pub fn single_turn(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
        }
    }

    /// Parts of the (only) outgoing turn
    pub fn parts(&self) -> &[Part] {
        self.contents
            .first()
            .map(|content| content.parts.as_slice())
            .unwrap_or(&[])
    }
}

/// One turn of request content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// Content part in a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Part::Text { text: s.into() }
    }

    pub fn inline_data(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                data: data.into(),
                mime_type: mime_type.into(),
            },
        }
    }
}

/// Base64 file payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineData {
    pub data: String,
    pub mime_type: String,
}

/// Raw HTTP reply, before any interpretation of its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// Response shapes. Every field is optional so that an unexpected body still
// deserializes and the shape check happens in one place.

#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub code: Option<i32>,
    #[serde(default)]
    #[allow(dead_code)]
    pub status: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`, if the body has that shape
    pub fn first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
    }

    /// `error.message`, if present
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref()?.message.as_deref()
    }
}
