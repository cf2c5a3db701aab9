//! API request and response types

use crate::runtime::SessionSnapshot;
use crate::session::{Attachment, Role, SessionState, Turn, TurnId, TurnStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub text: String,
}

/// Response for submit action
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// False when the input was empty and nothing was sent
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_turn_id: Option<TurnId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_turn_id: Option<TurnId>,
}

/// Request to stage a file: either raw base64 with its type, or a data URL
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StageAttachmentRequest {
    Inline { data: String, mime_type: String },
    DataUrl { data_url: String },
}

/// Staged file as shown in the preview
#[derive(Debug, Serialize)]
pub struct AttachmentView {
    pub media_type: String,
    pub size: usize,
    pub data_url: String,
}

impl From<&Attachment> for AttachmentView {
    fn from(attachment: &Attachment) -> Self {
        Self {
            media_type: attachment.media_type.clone(),
            size: attachment.size(),
            data_url: attachment.to_data_url(),
        }
    }
}

/// Response for cancel action
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cleared: bool,
}

/// A turn as rendered
#[derive(Debug, Serialize)]
pub struct TurnView {
    pub id: TurnId,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TurnStatus>,
    /// Render in the error style
    pub is_error: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        Self {
            id: turn.id,
            role: turn.role,
            text: turn.text.clone(),
            attachment: turn.attachment.as_ref().map(AttachmentView::from),
            status: turn.status,
            is_error: turn.is_failed(),
            created_at: turn.created_at,
        }
    }
}

/// Response with the whole session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub state: SessionState,
    pub turns: Vec<TurnView>,
    pub staged_attachment: Option<AttachmentView>,
}

impl From<&SessionSnapshot> for SessionResponse {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            state: snapshot.state,
            turns: snapshot.turns.iter().map(TurnView::from).collect(),
            staged_attachment: snapshot.staged.as_ref().map(AttachmentView::from),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
