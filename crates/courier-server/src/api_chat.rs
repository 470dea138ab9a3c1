//! Chat route handlers.

use crate::api::{parse_body, ApiError};
use crate::relay::StreamRelay;
use crate::sse::stream_response;
use crate::workflow;
use crate::AppState;
use axum::extract::{Extension, Json};
use axum::response::IntoResponse;
use courier_types::{ChatRequest, ChatResponse};
use serde_json::Value;
use std::sync::Arc;

/// Handler for `POST /chat`.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request: ChatRequest = parse_body(body)?;
    let response = workflow::run_chat(&state, request)
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
    Ok(Json(response))
}

/// Handler for `POST /chat/stream`.
pub async fn chat_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let request: ChatRequest = parse_body(body)?;
    Ok(stream_response(move |sender| async move {
        workflow::stream_chat(&state, request, StreamRelay::text(), &sender).await
    }))
}
