//! Runtime for a chat session
//!
//! All session state lives in one task. UI intents and request completions
//! reach it through the same command channel, so they are applied one at a
//! time.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::llm::GenerationService;
use crate::session::{
    Attachment, Notification, Outcome, SessionState, TransitionError, Turn, TurnId,
};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands accepted by the session task
#[derive(Debug)]
pub enum SessionCommand {
    Submit {
        text: String,
        reply: oneshot::Sender<Result<Option<SubmitReceipt>, TransitionError>>,
    },
    StageAttachment {
        attachment: Attachment,
    },
    CancelAttachment {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Completion of a dispatched request
    ResponseArrived {
        turn_id: TurnId,
        outcome: Outcome,
    },
}

/// Ids of the two turns a successful submit appended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub user_turn_id: TurnId,
    pub reply_turn_id: TurnId,
}

/// Read-only copy of the session for rendering
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub turns: Vec<Turn>,
    pub staged: Option<Attachment>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Session runtime has stopped")]
    Stopped,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    broadcast_tx: broadcast::Sender<Notification>,
}

impl SessionHandle {
    /// Start a session task driving `client`
    pub fn spawn<C>(client: C, request_timeout: Duration) -> Self
    where
        C: GenerationService + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let runtime = SessionRuntime::new(
            client,
            request_timeout,
            command_rx,
            command_tx.clone(),
            broadcast_tx.clone(),
        );
        tokio::spawn(runtime.run());

        Self {
            command_tx,
            broadcast_tx,
        }
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::Stopped)
    }

    /// Submit intent. `Ok(None)` means the input was empty and ignored.
    pub async fn submit(&self, text: impl Into<String>) -> Result<Option<SubmitReceipt>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Submit {
            text: text.into(),
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| SessionError::Stopped)??)
    }

    pub async fn stage_attachment(&self, attachment: Attachment) -> Result<(), SessionError> {
        self.send(SessionCommand::StageAttachment { attachment }).await
    }

    /// Cancel intent. Returns whether an attachment was staged.
    pub async fn cancel_attachment(&self) -> Result<bool, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::CancelAttachment { reply }).await?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    /// Receive every notification published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.broadcast_tx.subscribe()
    }
}
