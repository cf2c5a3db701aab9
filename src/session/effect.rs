//! Effects produced by session transitions

use super::log::{Turn, TurnId};
use crate::llm::GenerateRequest;

/// Effects to be executed after a transition, in order
#[derive(Debug, Clone)]
pub enum Effect {
    /// Send the request for the given pending assistant turn
    Dispatch {
        turn_id: TurnId,
        request: GenerateRequest,
    },

    /// Tell renderers something changed
    Notify(Notification),
}

/// Re-render signals
#[derive(Debug, Clone)]
pub enum Notification {
    TurnAppended(Turn),
    TurnFinalized(Turn),
    AttachmentStaged { media_type: String, size: usize },
    AttachmentCleared,
}

impl Notification {
    pub fn event_type(&self) -> &'static str {
        match self {
            Notification::TurnAppended(_) => "turn_appended",
            Notification::TurnFinalized(_) => "turn_finalized",
            Notification::AttachmentStaged { .. } => "attachment_staged",
            Notification::AttachmentCleared => "attachment_cleared",
        }
    }
}
