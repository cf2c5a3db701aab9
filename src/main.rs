//! Gemini chat - single-session conversational client
//!
//! Serves one chat session over HTTP: user text plus an optional staged file
//! go to a Gemini `generateContent` endpoint and the reply is reconciled back
//! into the conversation log.

mod api;
mod config;
mod llm;
mod runtime;
mod session;

use api::{create_router, AppState};
use config::ChatConfig;
use llm::{GeminiService, GenerationService, LoggingService};
use runtime::SessionHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_chat=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChatConfig::from_env();
    if !config.has_api_key() {
        tracing::warn!("GEMINI_API_KEY is not set; requests will be rejected by the endpoint");
    }

    let gemini = GeminiService::new(
        config.api_key.clone(),
        config.model.clone(),
        &config.base_url,
        config.request_timeout,
    )?;
    let service: Arc<dyn GenerationService> = Arc::new(LoggingService::new(Arc::new(gemini)));

    tracing::info!(
        model = %config.model,
        timeout_secs = config.request_timeout.as_secs(),
        "Generation service initialized"
    );

    let session = SessionHandle::spawn(service, config.request_timeout);
    let state = AppState::new(session, config.max_attachment_bytes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
