//! Voice route handlers: multipart audio in, answer out.

use crate::api::ApiError;
use crate::relay::StreamRelay;
use crate::sse::stream_response;
use crate::workflow;
use crate::AppState;
use axum::extract::{Extension, Multipart};
use axum::response::IntoResponse;
use axum::Json;
use base64::Engine;
use courier_types::{ChatRequest, StreamEvent, VoiceResponse};
use serde_json::Value;
use std::sync::Arc;

/// One parsed voice upload.
struct VoiceUpload {
    audio: Vec<u8>,
    /// Container label from the uploaded filename, for provider hints.
    format: String,
    context: Option<Value>,
}

/// Pulls the `audio` file and optional `context` JSON string out of
/// the multipart form. Invalid context JSON is ignored, matching the
/// lenient frontend contract; a missing audio part is a 400.
async fn read_upload(mut multipart: Multipart) -> Result<VoiceUpload, ApiError> {
    let mut audio = None;
    let mut format = "webm".to_string();
    let mut context = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("audio") => {
                if let Some(ext) = field
                    .file_name()
                    .and_then(|name| name.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_string())
                {
                    format = ext;
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {e}")))?;
                audio = Some(bytes.to_vec());
            }
            Some("context") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read context: {e}")))?;
                match serde_json::from_str(&text) {
                    Ok(value) => context = Some(value),
                    Err(e) => tracing::debug!(error = %e, "ignoring non-JSON context field"),
                }
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| ApiError::BadRequest("audio required".to_string()))?;
    Ok(VoiceUpload {
        audio,
        format,
        context,
    })
}

fn chat_request(transcription: &str, context: Option<Value>) -> ChatRequest {
    ChatRequest {
        prompt: transcription.to_string(),
        additional_context: context,
        ..Default::default()
    }
}

/// Handler for `POST /voice`.
///
/// Transcribes, runs the full chat turn, then speaks the whole answer
/// back as one base64 audio blob.
pub async fn voice_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<VoiceResponse>, ApiError> {
    let upload = read_upload(multipart).await?;

    let transcription = state
        .transcriber
        .transcribe(&upload.audio, &upload.format)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("transcription failed: {e}")))?;

    let response = workflow::run_chat(&state, chat_request(&transcription, upload.context))
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    let audio = state
        .synthesizer
        .synthesize(&response.content)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("speech synthesis failed: {e}")))?;

    Ok(Json(VoiceResponse {
        transcription,
        text: response.content,
        usage: response.usage,
        audio_data: base64::engine::general_purpose::STANDARD.encode(audio),
        audio_format: state.synthesizer.audio_format().to_string(),
    }))
}

/// Handler for `POST /voice/stream`.
///
/// Transcription happens before the stream opens, so its failure is a
/// plain request error. The stream then starts with the one
/// `transcription` event and continues as a voice-mode chat turn.
pub async fn voice_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart).await?;

    let transcription = state
        .transcriber
        .transcribe(&upload.audio, &upload.format)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("transcription failed: {e}")))?;

    Ok(stream_response(move |sender| async move {
        sender
            .send(StreamEvent::Transcription {
                transcription: transcription.clone(),
            })
            .await?;
        let relay = StreamRelay::voice(Arc::clone(&state.synthesizer));
        workflow::stream_chat(
            &state,
            chat_request(&transcription, upload.context),
            relay,
            &sender,
        )
        .await
    }))
}
