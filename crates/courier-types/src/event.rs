//! The SSE wire protocol.
//!
//! Every frame on a Courier stream is one of these events, serialized
//! to a single line of JSON and framed as a `data:` record. The enum is
//! internally tagged on `type`; an unknown tag is a deserialization
//! error, never silently ignored.
//!
//! Text deltas are the one exception on the wire: the server sends them
//! as bare escaped text (`data:<text>\n\n`) for minimal latency, and the
//! client-side frame parser falls back to [`StreamEvent::TextDelta`]
//! when a frame is not a JSON envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a `tool-call` event: the agent has decided to invoke a
/// named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPayload {
    pub tool_call_id: String,
    pub tool_name: String,
    pub args: Value,
}

/// Payload of a `tool-result` event, correlated with the announcing
/// `tool-call` by `tool_call_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultPayload {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: Value,
}

/// Coarse-grained status of a streaming turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    InProgress,
    Complete,
    Error,
}

/// One event on the stream. See the module docs for framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Incremental plain-text token chunk. Concatenated by the receiver
    /// into the running assistant message.
    #[serde(rename = "text-delta")]
    TextDelta { text: String },

    /// The agent announced a tool invocation.
    #[serde(rename = "tool-call")]
    ToolCall { payload: ToolCallPayload },

    /// Completion of a previously announced tool call.
    #[serde(rename = "tool-result")]
    ToolResult { payload: ToolResultPayload },

    /// Instructs the client to invoke a named mutator on a named piece
    /// of client state. Fire-and-forget: there is no acknowledgment.
    #[serde(rename = "action")]
    #[serde(rename_all = "camelCase")]
    Action {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        state_key: String,
        setter_key: String,
        args: Vec<Value>,
    },

    /// Status narration, independent of text/tool events. A
    /// `complete` or `error` update is the last event of every agent
    /// stream; truncation without one means the turn failed.
    #[serde(rename = "progress_update")]
    ProgressUpdate { state: ProgressState, text: String },

    /// What the server heard. Emitted exactly once, first, on
    /// voice-originated streams; never on text-originated ones.
    #[serde(rename = "transcription")]
    Transcription { transcription: String },

    /// Synthesized speech for a block of accumulated text. `content`
    /// carries the source text in original concatenation order.
    #[serde(rename = "audio")]
    #[serde(rename_all = "camelCase")]
    Audio {
        /// Base64-encoded audio bytes.
        audio_data: String,
        audio_format: String,
        content: String,
    },

    /// Terminal failure.
    #[serde(rename = "error")]
    Error { message: String },
}

impl StreamEvent {
    pub fn progress(state: ProgressState, text: impl Into<String>) -> Self {
        Self::ProgressUpdate {
            state,
            text: text.into(),
        }
    }

    /// The `action` event that replaces the active compose draft.
    pub fn draft_reply(content: Option<String>, args: Vec<Value>) -> Self {
        Self::Action {
            content,
            state_key: "emailDraft".to_string(),
            setter_key: "draftReply".to_string(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(event: &StreamEvent) {
        let line = serde_json::to_string(event).unwrap();
        assert!(!line.contains('\n'), "events must be single-line");
        let parsed: StreamEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(&parsed, event);
    }

    #[test]
    fn all_variants_round_trip() {
        let events = vec![
            StreamEvent::TextDelta {
                text: "Let me check your calendar...".to_string(),
            },
            StreamEvent::ToolCall {
                payload: ToolCallPayload {
                    tool_call_id: "call_1".to_string(),
                    tool_name: "check-calendar".to_string(),
                    args: json!({}),
                },
            },
            StreamEvent::ToolResult {
                payload: ToolResultPayload {
                    tool_call_id: "call_1".to_string(),
                    tool_name: "check-calendar".to_string(),
                    result: json!({"availableTimes": ["2025-08-18T09:00:00Z"]}),
                },
            },
            StreamEvent::draft_reply(Some("Email rewritten".to_string()), vec![json!("body")]),
            StreamEvent::progress(ProgressState::InProgress, "Thinking..."),
            StreamEvent::Transcription {
                transcription: "schedule a call with Avery".to_string(),
            },
            StreamEvent::Audio {
                audio_data: "AAAA".to_string(),
                audio_format: "audio/pcm;rate=22050".to_string(),
                content: "Done.".to_string(),
            },
            StreamEvent::Error {
                message: "model unavailable".to_string(),
            },
        ];

        for event in &events {
            round_trip(event);
        }
    }

    #[test]
    fn wire_field_names_match_protocol() {
        let event = StreamEvent::ToolCall {
            payload: ToolCallPayload {
                tool_call_id: "call_9".to_string(),
                tool_name: "search-person".to_string(),
                args: json!({"query": "Avery"}),
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tool-call");
        assert_eq!(value["payload"]["toolCallId"], "call_9");
        assert_eq!(value["payload"]["toolName"], "search-person");

        let action = StreamEvent::draft_reply(None, vec![json!("hi")]);
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "action");
        assert_eq!(value["stateKey"], "emailDraft");
        assert_eq!(value["setterKey"], "draftReply");
        assert!(value.get("content").is_none());

        let progress = StreamEvent::progress(ProgressState::InProgress, "Thinking...");
        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["type"], "progress_update");
        assert_eq!(value["state"], "in_progress");
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let result: Result<StreamEvent, _> =
            serde_json::from_str(r#"{"type":"step-finish","payload":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_type_tag_is_rejected() {
        let result: Result<StreamEvent, _> = serde_json::from_str(r#"{"text":"hello"}"#);
        assert!(result.is_err());
    }
}
