//! Courier server library logic.

pub mod api;
pub mod api_chat;
pub mod api_spells;
pub mod api_voice;
pub mod config;
pub mod relay;
pub mod sse;
pub mod workflow;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use courier_agent::{email_agent, rewrite_agent, Agent, InMemoryStore, MemoryStore, OpenAiClient};
use courier_voice::{SpeechSynthesizer, SpeechTranscriber, SttService, TtsService};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The email composition agent (three canned tools, order-enforced).
    pub email_agent: Agent,
    /// The tool-less rewrite agent.
    pub rewrite_agent: Agent,
    /// Conversation memory keyed by (resource, thread).
    pub memory: Arc<dyn MemoryStore>,
    /// Speech-to-text service.
    pub transcriber: Arc<dyn SpeechTranscriber>,
    /// Text-to-speech service.
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    /// Artificial delay of the canned spell streams.
    pub spell_delay: Duration,
}

impl AppState {
    /// Builds production state from configuration.
    pub fn from_config(config: &config::Config) -> Self {
        let mut client = OpenAiClient::new(config.model.api_key.clone())
            .with_model(config.model.name.clone());
        if let Some(api_url) = &config.model.api_url {
            client = client.with_api_url(api_url.clone());
        }
        let model = Arc::new(client);

        let transcriber = SttService::new(&config.voice.stt_model, &config.voice.stt_binary);
        let synthesizer = TtsService::new(&config.voice.tts_model, &config.voice.tts_binary)
            .with_speed(config.voice.tts_speed);

        Self {
            email_agent: email_agent(
                model.clone(),
                Duration::from_millis(config.model.tool_latency_ms),
            ),
            rewrite_agent: rewrite_agent(model),
            memory: Arc::new(InMemoryStore::new()),
            transcriber: Arc::new(transcriber),
            synthesizer: Arc::new(synthesizer),
            spell_delay: Duration::from_millis(100),
        }
    }
}

/// Maximum JSON request body size (2 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Voice uploads need room for recorded audio (25 MiB).
const MAX_VOICE_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let voice_routes = Router::new()
        .route("/voice", post(api_voice::voice_handler))
        .route("/voice/stream", post(api_voice::voice_stream_handler))
        .layer(DefaultBodyLimit::max(MAX_VOICE_BODY_BYTES));

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(api_chat::chat_handler))
        .route("/chat/stream", post(api_chat::chat_stream_handler))
        .route(
            "/chat/schedule-meeting/stream",
            post(api_spells::schedule_meeting_handler),
        )
        .route(
            "/chat/polite-rejection/stream",
            post(api_spells::polite_rejection_handler),
        )
        .route("/chat/follow-up/stream", post(api_spells::follow_up_handler))
        .route("/chat/thank-you/stream", post(api_spells::thank_you_handler))
        .route(
            "/chat/rewrite-draft/stream",
            post(api_spells::rewrite_draft_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .merge(voice_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
