//! Message-session core
//!
//! Staged attachment, conversation log, turn assembly, response
//! reconciliation and the controller tying them together.

pub mod attachment;
pub mod builder;
pub mod controller;
mod effect;
pub mod log;
pub mod reconciler;

#[cfg(test)]
mod proptests;

pub use attachment::{Attachment, AttachmentError};
pub use controller::{SessionController, SessionState, TransitionError, TransitionResult};
pub use effect::{Effect, Notification};
pub use log::{Role, Turn, TurnId, TurnStatus};
pub use reconciler::Outcome;
