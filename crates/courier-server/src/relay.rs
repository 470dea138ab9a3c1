//! The stream relay: agent chunks in, protocol events out.
//!
//! One relay instance lives for the duration of one streaming request
//! and owns the voice-mode text buffer. In text mode it is a thin
//! translation; in voice mode text deltas are withheld from the wire
//! and accumulate until a tool boundary or stream end, where the
//! buffered text is spoken and emitted as one `audio` event.

use crate::sse::{ClientGone, SseSender};
use base64::Engine;
use courier_agent::{AgentChunk, WRITE_EMAIL_TOOL};
use courier_types::{ProgressState, StreamEvent};
use courier_voice::SpeechSynthesizer;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct StreamRelay {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    pending_text: String,
}

impl StreamRelay {
    /// Text-mode relay: deltas pass straight through.
    pub fn text() -> Self {
        Self {
            synthesizer: None,
            pending_text: String::new(),
        }
    }

    /// Voice-mode relay: deltas buffer and surface as audio events.
    pub fn voice(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer: Some(synthesizer),
            pending_text: String::new(),
        }
    }

    /// Translates one agent chunk into zero or more wire events.
    pub async fn on_chunk(&mut self, chunk: AgentChunk) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        match chunk {
            AgentChunk::TextDelta(text) => {
                if self.synthesizer.is_some() {
                    self.pending_text.push_str(&text);
                } else {
                    events.push(StreamEvent::TextDelta { text });
                }
            }
            AgentChunk::ToolCall(payload) => {
                self.flush_pending(&mut events).await;
                events.push(StreamEvent::ToolCall { payload });
            }
            AgentChunk::ToolResult(payload) => {
                self.flush_pending(&mut events).await;
                let action = (payload.tool_name == WRITE_EMAIL_TOOL)
                    .then(|| draft_action(&payload.result));
                events.push(StreamEvent::ToolResult { payload });
                events.extend(action);
            }
        }
        events
    }

    /// End-of-stream: speaks whatever text is still buffered.
    pub async fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.flush_pending(&mut events).await;
        events
    }

    /// Sends all events produced for one chunk.
    pub async fn forward(
        &mut self,
        chunk: AgentChunk,
        sender: &SseSender,
    ) -> Result<(), ClientGone> {
        for event in self.on_chunk(chunk).await {
            sender.send(event).await?;
        }
        Ok(())
    }

    async fn flush_pending(&mut self, events: &mut Vec<StreamEvent>) {
        let Some(synthesizer) = &self.synthesizer else {
            return;
        };
        if self.pending_text.is_empty() {
            return;
        }
        let content = std::mem::take(&mut self.pending_text);
        match synthesizer.synthesize(&content).await {
            Ok(audio) => {
                events.push(StreamEvent::Audio {
                    audio_data: base64::engine::general_purpose::STANDARD.encode(audio),
                    audio_format: synthesizer.audio_format().to_string(),
                    content,
                });
            }
            // Synthesis failure loses the spoken form only; the turn
            // continues, and the client learns via a progress event.
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis failed, skipping audio block");
                events.push(StreamEvent::progress(
                    ProgressState::Error,
                    format!("speech synthesis failed: {e}"),
                ));
            }
        }
    }
}

/// The action a completed write-email tool triggers: replace the
/// active compose draft with the drafted text.
fn draft_action(result: &Value) -> StreamEvent {
    let email = result.get("email").and_then(Value::as_str).unwrap_or("");
    StreamEvent::draft_reply(None, vec![json!(email)])
}
