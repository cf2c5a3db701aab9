//! Session runtime executor

use super::{SessionCommand, SessionSnapshot, SubmitReceipt};
use crate::llm::{GenerateRequest, GenerationService};
use crate::session::reconciler::decode;
use crate::session::{
    Effect, Notification, Outcome, SessionController, TransitionError, TransitionResult, TurnId,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Session runtime that can work with any generation service
pub struct SessionRuntime<C>
where
    C: GenerationService + 'static,
{
    controller: SessionController,
    client: Arc<C>,
    request_timeout: Duration,
    command_rx: mpsc::Receiver<SessionCommand>,
    /// Cloned into dispatch tasks so completions come back through the loop
    command_tx: mpsc::Sender<SessionCommand>,
    broadcast_tx: broadcast::Sender<Notification>,
}

impl<C> SessionRuntime<C>
where
    C: GenerationService + 'static,
{
    pub fn new(
        client: C,
        request_timeout: Duration,
        command_rx: mpsc::Receiver<SessionCommand>,
        command_tx: mpsc::Sender<SessionCommand>,
        broadcast_tx: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            controller: SessionController::new(),
            client: Arc::new(client),
            request_timeout,
            command_rx,
            command_tx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(model = %self.client.model_id(), "Starting session runtime");

        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command);
        }

        tracing::info!("Session runtime stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Submit { text, reply } => {
                let outcome = self.controller.submit(&text).map(|result| {
                    let receipt = result.dispatched().map(|reply_turn_id| SubmitReceipt {
                        user_turn_id: self.user_turn_before(reply_turn_id),
                        reply_turn_id,
                    });
                    self.execute_effects(result);
                    receipt
                });
                if let Err(e) = &outcome {
                    tracing::info!(error = %e, "Submit rejected");
                }
                let _ = reply.send(outcome);
            }
            SessionCommand::StageAttachment { attachment } => {
                tracing::debug!(
                    media_type = %attachment.media_type,
                    size = attachment.size(),
                    "Staging attachment"
                );
                let result = self.controller.stage_attachment(attachment);
                self.execute_effects(result);
            }
            SessionCommand::CancelAttachment { reply } => {
                let result = self.controller.cancel_attachment();
                let cleared = !result.is_noop();
                self.execute_effects(result);
                let _ = reply.send(cleared);
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::ResponseArrived { turn_id, outcome } => {
                match self.controller.resolve(turn_id, outcome) {
                    Ok(result) => self.execute_effects(result),
                    Err(e @ TransitionError::StaleResponse { .. }) => {
                        tracing::warn!(%turn_id, error = %e, "Dropping stale response");
                    }
                    Err(e) => {
                        tracing::error!(%turn_id, error = %e, "Failed to finalize turn");
                    }
                }
            }
        }
    }

    /// The user turn is always appended directly before its reply placeholder
    fn user_turn_before(&self, reply_turn_id: TurnId) -> TurnId {
        let turns = self.controller.log().turns();
        turns
            .iter()
            .position(|t| t.id == reply_turn_id)
            .and_then(|i| i.checked_sub(1))
            .map_or(reply_turn_id, |i| turns[i].id)
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.controller.state(),
            turns: self.controller.log().turns().to_vec(),
            staged: self.controller.staged_attachment().cloned(),
        }
    }

    fn execute_effects(&self, result: TransitionResult) {
        for effect in result.effects {
            match effect {
                Effect::Notify(notification) => {
                    // No subscribers is fine
                    let _ = self.broadcast_tx.send(notification);
                }
                Effect::Dispatch { turn_id, request } => self.dispatch(turn_id, request),
            }
        }
    }

    /// Run the request off the session task; its outcome re-enters as a command
    fn dispatch(&self, turn_id: TurnId, request: GenerateRequest) {
        let client = Arc::clone(&self.client);
        let command_tx = self.command_tx.clone();
        let timeout = self.request_timeout;

        tracing::debug!(%turn_id, parts = request.parts().len(), "Dispatching request");

        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, client.generate(&request)).await {
                Ok(Ok(reply)) => decode(&reply),
                Ok(Err(e)) => Outcome::from(e),
                Err(_) => {
                    Outcome::TransportFailure(format!("Request timed out after {timeout:?}"))
                }
            };

            if command_tx
                .send(SessionCommand::ResponseArrived { turn_id, outcome })
                .await
                .is_err()
            {
                tracing::warn!(%turn_id, "Session stopped before response could be applied");
            }
        });
    }
}
