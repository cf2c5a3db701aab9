//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    AttachmentView, CancelResponse, ErrorResponse, SessionResponse, StageAttachmentRequest,
    SubmitRequest, SubmitResponse,
};
use super::AppState;
use crate::runtime::SessionError;
use crate::session::{Attachment, AttachmentError, TransitionError};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Room for JSON framing around an attachment payload
const BODY_OVERHEAD_BYTES: usize = 1024;

/// Largest request body that can still carry a `max_attachment_bytes` file,
/// which travels base64 encoded.
fn body_limit(max_attachment_bytes: usize) -> usize {
    max_attachment_bytes
        .saturating_mul(4)
        .div_ceil(3)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let body_limit = body_limit(state.max_attachment_bytes);

    Router::new()
        // Read view for rendering
        .route("/api/session", get(get_session))
        .route("/api/stream", get(stream_session))
        // Submit intent
        .route("/api/messages", post(submit_message))
        // Attachment intents
        .route(
            "/api/attachment",
            get(get_attachment)
                .put(stage_attachment)
                .delete(cancel_attachment),
        )
        .route("/version", get(get_version))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

// ============================================================
// Read View
// ============================================================

async fn get_session(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    let snapshot = state.session.snapshot().await?;
    Ok(Json(SessionResponse::from(&snapshot)))
}

async fn stream_session(State(state): State<AppState>) -> Result<Response, AppError> {
    // Subscribe before the snapshot so nothing falls between the two
    let broadcast_rx = state.session.subscribe();
    let snapshot = state.session.snapshot().await?;
    Ok(sse_stream(SessionResponse::from(&snapshot), broadcast_rx).into_response())
}

// ============================================================
// Submit
// ============================================================

async fn submit_message(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let receipt = state.session.submit(req.text).await?;

    let response = match receipt {
        Some(receipt) => (
            StatusCode::ACCEPTED,
            Json(SubmitResponse {
                accepted: true,
                user_turn_id: Some(receipt.user_turn_id),
                reply_turn_id: Some(receipt.reply_turn_id),
            }),
        ),
        None => (
            StatusCode::OK,
            Json(SubmitResponse {
                accepted: false,
                user_turn_id: None,
                reply_turn_id: None,
            }),
        ),
    };
    Ok(response)
}

// ============================================================
// Attachment
// ============================================================

async fn get_attachment(
    State(state): State<AppState>,
) -> Result<Json<Option<AttachmentView>>, AppError> {
    let snapshot = state.session.snapshot().await?;
    Ok(Json(snapshot.staged.as_ref().map(AttachmentView::from)))
}

async fn stage_attachment(
    State(state): State<AppState>,
    Json(req): Json<StageAttachmentRequest>,
) -> Result<Json<AttachmentView>, AppError> {
    let attachment = match req {
        StageAttachmentRequest::Inline { data, mime_type } => {
            Attachment::from_base64(&data, mime_type)?
        }
        StageAttachmentRequest::DataUrl { data_url } => Attachment::from_data_url(&data_url)?,
    };
    attachment.check_size(state.max_attachment_bytes)?;

    let view = AttachmentView::from(&attachment);
    state.session.stage_attachment(attachment).await?;
    Ok(Json(view))
}

async fn cancel_attachment(
    State(state): State<AppState>,
) -> Result<Json<CancelResponse>, AppError> {
    let cleared = state.session.cancel_attachment().await?;
    Ok(Json(CancelResponse { cleared }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Conflict(String),
    Unavailable(String),
}

impl From<AttachmentError> for AppError {
    fn from(e: AttachmentError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Transition(TransitionError::Busy) => AppError::Conflict(e.to_string()),
            SessionError::Transition(_) | SessionError::Stopped => {
                AppError::Unavailable(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::{DelayedMockService, MockService};
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use futures::StreamExt;
    use crate::runtime::SessionHandle;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn reply() -> crate::llm::HttpReply {
        crate::llm::HttpReply::new(
            200,
            json!({ "candidates": [{ "content": { "parts": [{ "text": "hi there" }] } }] })
                .to_string(),
        )
    }

    fn app_with_limit(max_attachment_bytes: usize) -> Router {
        let service = Arc::new(MockService::new());
        service.queue_reply(reply());
        let session = SessionHandle::spawn(service, Duration::from_secs(5));
        create_router(AppState::new(session, max_attachment_bytes))
    }

    fn app() -> Router {
        app_with_limit(16)
    }

    /// Accumulate SSE body frames until `needle` shows up
    async fn read_until<S>(stream: &mut S, seen: &mut String, needle: &str)
    where
        S: futures::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
    {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !seen.contains(needle) {
                let frame = stream.next().await.expect("stream ended").unwrap();
                seen.push_str(&String::from_utf8_lossy(&frame));
            }
        })
        .await
        .unwrap_or_else(|_| panic!("no {needle:?} in stream, got: {seen}"));
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn empty_message_is_not_accepted() {
        let app = app();
        let (status, body) = call(&app, "POST", "/api/messages", Some(json!({ "text": "  " }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], false);
    }

    #[tokio::test]
    async fn message_is_accepted_and_logged() {
        let app = app();
        let (status, body) = call(&app, "POST", "/api/messages", Some(json!({ "text": "Hi" }))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["accepted"], true);

        let (_, session) = call(&app, "GET", "/api/session", None).await;
        assert_eq!(session["turns"][0]["text"], "Hi");
        assert_eq!(session["turns"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn stage_preview_and_cancel() {
        let app = app();
        let (status, body) = call(
            &app,
            "PUT",
            "/api/attachment",
            Some(json!({ "data_url": "data:image/png;base64,aGVsbG8=" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["size"], 5);

        let (_, preview) = call(&app, "GET", "/api/attachment", None).await;
        assert_eq!(preview["media_type"], "image/png");

        let (_, cancelled) = call(&app, "DELETE", "/api/attachment", None).await;
        assert_eq!(cancelled["cleared"], true);

        let (_, preview) = call(&app, "GET", "/api/attachment", None).await;
        assert_eq!(preview, Value::Null);
    }

    #[tokio::test]
    async fn oversize_and_invalid_attachments_are_rejected() {
        let app = app();
        let (status, _) = call(
            &app,
            "PUT",
            "/api/attachment",
            Some(json!({ "data": "AAAAAAAAAAAAAAAAAAAAAAAAAAAA", "mime_type": "image/png" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            "PUT",
            "/api/attachment",
            Some(json!({ "data": "%%%", "mime_type": "image/png" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("base64"));
    }

    #[tokio::test]
    async fn attachment_above_default_body_limit_is_accepted() {
        let app = app_with_limit(20 * 1024 * 1024);
        let data = BASE64.encode(vec![7u8; 3 * 1024 * 1024]);
        let (status, body) = call(
            &app,
            "PUT",
            "/api/attachment",
            Some(json!({ "data": data, "mime_type": "image/jpeg" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["size"], 3 * 1024 * 1024);
    }

    #[test]
    fn body_limit_covers_base64_expansion() {
        assert_eq!(body_limit(3), 4 + BODY_OVERHEAD_BYTES);
        assert!(body_limit(20 * 1024 * 1024) > 20 * 1024 * 1024 * 4 / 3);
    }

    #[tokio::test]
    async fn submit_while_pending_is_conflict() {
        let service = Arc::new(DelayedMockService::new(Duration::from_millis(200)));
        service.queue_reply(reply());
        let session = SessionHandle::spawn(service, Duration::from_secs(5));
        let app = create_router(AppState::new(session, 16));

        let (status, _) = call(&app, "POST", "/api/messages", Some(json!({ "text": "one" }))).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) =
            call(&app, "POST", "/api/messages", Some(json!({ "text": "two" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("pending"));

        let (_, session) = call(&app, "GET", "/api/session", None).await;
        assert_eq!(session["turns"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stream_starts_with_snapshot_then_notifications() {
        let app = app();
        let request = Request::builder()
            .uri("/api/stream")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let mut stream = response.into_body().into_data_stream();
        let mut seen = String::new();

        read_until(&mut stream, &mut seen, r#""type":"init""#).await;
        assert!(seen.contains(r#""turns":[]"#), "{seen}");

        let (status, _) = call(&app, "POST", "/api/messages", Some(json!({ "text": "Hi" }))).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        read_until(&mut stream, &mut seen, r#""type":"turn_appended""#).await;
        read_until(&mut stream, &mut seen, r#""type":"turn_finalized""#).await;
        assert!(seen.contains("hi there"), "{seen}");
    }

    #[tokio::test]
    async fn cancel_reports_whether_anything_was_staged() {
        let app = app();
        let (_, cancelled) = call(&app, "DELETE", "/api/attachment", None).await;
        assert_eq!(cancelled["cleared"], false);
    }
}
