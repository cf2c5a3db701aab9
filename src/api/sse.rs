//! Server-Sent Events support

use super::types::{SessionResponse, TurnView};
use crate::session::Notification;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting with a full snapshot
pub fn sse_stream(
    init: SessionResponse,
    broadcast_rx: tokio::sync::broadcast::Receiver<Notification>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init_data = json!({ "type": "init", "session": init });
    let init = futures::stream::once(async move {
        Ok(Event::default().event("init").data(init_data.to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(notification) => Some(Ok(notification_to_event(&notification))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn notification_to_event(notification: &Notification) -> Event {
    let event_type = notification.event_type();
    let data = match notification {
        Notification::TurnAppended(turn) | Notification::TurnFinalized(turn) => json!({
            "type": event_type,
            "turn": TurnView::from(turn)
        }),
        Notification::AttachmentStaged { media_type, size } => json!({
            "type": event_type,
            "media_type": media_type,
            "size": size
        }),
        Notification::AttachmentCleared => json!({ "type": event_type }),
    };

    Event::default().event(event_type).data(data.to_string())
}

