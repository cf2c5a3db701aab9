//! Session state machine
//!
//! Owns the attachment store and the conversation log. Every intent returns
//! the effects the runtime must carry out; nothing here performs I/O.
//!
//! A submit while a reply is pending is rejected with
//! [`TransitionError::Busy`], so at most one assistant turn is ever pending.

use super::attachment::{Attachment, AttachmentStore};
use super::builder;
use super::effect::{Effect, Notification};
use super::log::{ConversationLog, LogError, TurnId};
use super::reconciler::{self, Outcome};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// Ready for the next submit
    #[default]
    Idle,
    /// Request for `turn_id` in flight
    AwaitingResponse { turn_id: TurnId },
}

/// Result of a transition
#[derive(Debug, Default)]
pub struct TransitionResult {
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The assistant turn this transition dispatched a request for, if any
    pub fn dispatched(&self) -> Option<TurnId> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Dispatch { turn_id, .. } => Some(*turn_id),
            Effect::Notify(_) => None,
        })
    }

    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A reply is still pending, wait for it before sending another message")]
    Busy,
    #[error("Response for turn {turn_id} does not match the in-flight request")]
    StaleResponse { turn_id: TurnId },
    #[error(transparent)]
    Log(#[from] LogError),
}

#[derive(Debug, Default)]
pub struct SessionController {
    state: SessionState,
    log: ConversationLog,
    attachments: AttachmentStore,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn staged_attachment(&self) -> Option<&Attachment> {
        self.attachments.peek()
    }

    /// Submit intent.
    ///
    /// Blank text with nothing staged is a silent no-op. Otherwise appends the
    /// user turn and a pending assistant turn, then dispatches.
    pub fn submit(&mut self, raw_text: &str) -> Result<TransitionResult, TransitionError> {
        if !builder::accepts(raw_text, &self.attachments) {
            tracing::debug!("Ignoring empty submit");
            return Ok(TransitionResult::new());
        }

        if let SessionState::AwaitingResponse { turn_id } = self.state {
            tracing::debug!(%turn_id, "Rejecting submit while a reply is pending");
            return Err(TransitionError::Busy);
        }

        let consumed_attachment = !self.attachments.is_empty();
        let (user_turn, request) = builder::build(raw_text, &mut self.attachments);
        let user = self.log.append_user(user_turn).clone();
        let placeholder = self.log.append_placeholder().clone();
        let turn_id = placeholder.id;

        self.state = SessionState::AwaitingResponse { turn_id };

        let mut result = TransitionResult::new();
        if consumed_attachment {
            result = result.with_effect(Effect::Notify(Notification::AttachmentCleared));
        }
        Ok(result
            .with_effect(Effect::Notify(Notification::TurnAppended(user)))
            .with_effect(Effect::Notify(Notification::TurnAppended(placeholder)))
            .with_effect(Effect::Dispatch { turn_id, request }))
    }

    /// Stage-attachment intent; replaces any staged file
    pub fn stage_attachment(&mut self, attachment: Attachment) -> TransitionResult {
        let notification = Notification::AttachmentStaged {
            media_type: attachment.media_type.clone(),
            size: attachment.size(),
        };
        self.attachments.stage(attachment);
        TransitionResult::new().with_effect(Effect::Notify(notification))
    }

    /// Cancel-attachment intent
    pub fn cancel_attachment(&mut self) -> TransitionResult {
        if self.attachments.clear() {
            TransitionResult::new().with_effect(Effect::Notify(Notification::AttachmentCleared))
        } else {
            TransitionResult::new()
        }
    }

    /// Finalize the in-flight turn with the outcome of its request.
    ///
    /// Returns to `Idle` whatever the outcome.
    pub fn resolve(
        &mut self,
        turn_id: TurnId,
        outcome: Outcome,
    ) -> Result<TransitionResult, TransitionError> {
        match self.state {
            SessionState::AwaitingResponse { turn_id: in_flight } if in_flight == turn_id => {}
            _ => return Err(TransitionError::StaleResponse { turn_id }),
        }

        let had_attachment = !self.attachments.is_empty();
        let update = reconciler::reconcile(outcome, &mut self.attachments);
        self.state = SessionState::Idle;

        let turn = self.log.finalize(turn_id, update)?.clone();

        let mut result = TransitionResult::new();
        if had_attachment {
            result = result.with_effect(Effect::Notify(Notification::AttachmentCleared));
        }
        Ok(result.with_effect(Effect::Notify(Notification::TurnFinalized(turn))))
    }
}
