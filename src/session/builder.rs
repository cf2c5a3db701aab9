//! Assembles the outgoing user turn and its request payload

use super::attachment::AttachmentStore;
use super::log::UserTurn;
use crate::llm::{GenerateRequest, Part};

/// Whether `raw_text` plus the staged attachment make a sendable turn
pub fn accepts(raw_text: &str, attachments: &AttachmentStore) -> bool {
    !raw_text.trim().is_empty() || !attachments.is_empty()
}

/// Build the user turn and request from `raw_text`, consuming the staged
/// attachment. Callers check [`accepts`] first.
pub fn build(raw_text: &str, attachments: &mut AttachmentStore) -> (UserTurn, GenerateRequest) {
    let text = raw_text.trim().to_string();
    let attachment = attachments.take();

    let mut parts = vec![Part::text(text.clone())];
    if let Some(file) = &attachment {
        parts.push(Part::inline_data(file.to_base64(), file.media_type.clone()));
    }

    (
        UserTurn { text, attachment },
        GenerateRequest::single_turn(parts),
    )
}
