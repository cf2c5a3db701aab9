//! Append-only conversation log

use super::attachment::Attachment;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable identity of a turn within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TurnId(u64);

impl TurnId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Lifecycle of an assistant turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Pending,
    Complete,
    Failed,
}

/// Terminal status; an assistant turn can only be finalized into one of these
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalStatus {
    Complete,
    Failed,
}

impl From<FinalStatus> for TurnStatus {
    fn from(status: FinalStatus) -> Self {
        match status {
            FinalStatus::Complete => TurnStatus::Complete,
            FinalStatus::Failed => TurnStatus::Failed,
        }
    }
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub text: String,
    /// Only user turns carry attachments
    pub attachment: Option<Attachment>,
    /// `None` for user turns
    pub status: Option<TurnStatus>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn is_pending(&self) -> bool {
        self.status == Some(TurnStatus::Pending)
    }

    pub fn is_failed(&self) -> bool {
        self.status == Some(TurnStatus::Failed)
    }
}

/// The text and attachment of a user turn before it is logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTurn {
    pub text: String,
    pub attachment: Option<Attachment>,
}

/// Terminal state written onto a pending assistant turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnUpdate {
    pub status: FinalStatus,
    pub text: String,
}

impl TurnUpdate {
    pub fn complete(text: impl Into<String>) -> Self {
        Self {
            status: FinalStatus::Complete,
            text: text.into(),
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            status: FinalStatus::Failed,
            text: text.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogError {
    #[error("No turn with id {0}")]
    UnknownTurn(TurnId),
    #[error("Turn {0} is a user turn and cannot be finalized")]
    NotAssistant(TurnId),
    #[error("Turn {0} is already finalized")]
    AlreadyFinalized(TurnId),
}

/// Ordered turns; insertion order is display order
#[derive(Debug, Default)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn append_user(&mut self, turn: UserTurn) -> &Turn {
        let id = self.allocate_id();
        self.push(Turn {
            id,
            role: Role::User,
            text: turn.text,
            attachment: turn.attachment,
            status: None,
            created_at: Utc::now(),
        })
    }

    /// Append an empty assistant turn awaiting its reply
    pub fn append_placeholder(&mut self) -> &Turn {
        let id = self.allocate_id();
        self.push(Turn {
            id,
            role: Role::Assistant,
            text: String::new(),
            attachment: None,
            status: Some(TurnStatus::Pending),
            created_at: Utc::now(),
        })
    }

    fn push(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// Write the terminal status and text onto a pending assistant turn
    pub fn finalize(&mut self, id: TurnId, update: TurnUpdate) -> Result<&Turn, LogError> {
        let turn = self
            .turns
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(LogError::UnknownTurn(id))?;

        match turn.status {
            None => return Err(LogError::NotAssistant(id)),
            Some(TurnStatus::Complete | TurnStatus::Failed) => {
                return Err(LogError::AlreadyFinalized(id))
            }
            Some(TurnStatus::Pending) => {}
        }

        turn.status = Some(update.status.into());
        turn.text = update.text;
        Ok(turn)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.turns.iter().filter(|t| t.is_pending()).count()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
