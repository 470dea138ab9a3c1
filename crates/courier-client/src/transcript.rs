//! The ordered conversation log and the event reducer over it.

use crate::state::StateStore;
use courier_types::{ProgressState, StreamEvent, ToolCallPayload, ToolResultPayload};
use std::collections::HashMap;

/// One rendered row of the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    /// Running assistant text, grown in place by successive deltas.
    Text { content: String },
    /// An announced tool invocation. `completed` flips when its result
    /// arrives.
    ToolCall {
        payload: ToolCallPayload,
        completed: bool,
    },
    ToolResult { payload: ToolResultPayload },
    Progress { state: ProgressState, text: String },
    Transcription { transcription: String },
    /// Synthesized speech; `content` is the text it voices.
    Audio {
        audio_data: String,
        audio_format: String,
        content: String,
    },
}

/// Append-only log of transcript entries, mutable by tool-call id.
///
/// Tool results are correlated by `toolCallId` through an explicit
/// index. When a result carries an id the transcript has never seen,
/// it falls back to the latest incomplete tool-call entry; the agent's
/// single-outstanding-call discipline makes that fallback safe.
#[derive(Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    calls: HashMap<String, usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Applies one received event. `action` events never touch the
    /// transcript; they dispatch into the store.
    pub fn apply(&mut self, event: StreamEvent, store: &mut StateStore) {
        match event {
            StreamEvent::TextDelta { text } => self.append_text(&text),
            StreamEvent::ToolCall { payload } => {
                self.calls
                    .insert(payload.tool_call_id.clone(), self.entries.len());
                self.entries.push(TranscriptEntry::ToolCall {
                    payload,
                    completed: false,
                });
            }
            StreamEvent::ToolResult { payload } => {
                self.complete_call(&payload.tool_call_id);
                self.entries.push(TranscriptEntry::ToolResult { payload });
            }
            StreamEvent::Action {
                state_key,
                setter_key,
                args,
                ..
            } => store.apply_action(&state_key, &setter_key, &args),
            StreamEvent::ProgressUpdate { state, text } => {
                self.entries.push(TranscriptEntry::Progress { state, text });
            }
            StreamEvent::Transcription { transcription } => {
                self.entries
                    .push(TranscriptEntry::Transcription { transcription });
            }
            StreamEvent::Audio {
                audio_data,
                audio_format,
                content,
            } => {
                self.entries.push(TranscriptEntry::Audio {
                    audio_data,
                    audio_format,
                    content,
                });
            }
            StreamEvent::Error { message } => {
                self.entries.push(TranscriptEntry::Progress {
                    state: ProgressState::Error,
                    text: message,
                });
            }
        }
    }

    fn append_text(&mut self, text: &str) {
        if let Some(TranscriptEntry::Text { content }) = self.entries.last_mut() {
            content.push_str(text);
            return;
        }
        self.entries.push(TranscriptEntry::Text {
            content: text.to_string(),
        });
    }

    fn complete_call(&mut self, tool_call_id: &str) {
        let index = self.calls.get(tool_call_id).copied().or_else(|| {
            self.entries
                .iter()
                .rposition(|e| matches!(e, TranscriptEntry::ToolCall { completed: false, .. }))
        });
        match index {
            Some(index) => {
                if let Some(TranscriptEntry::ToolCall { completed, .. }) =
                    self.entries.get_mut(index)
                {
                    *completed = true;
                }
            }
            None => tracing::warn!(tool_call_id, "tool result without a matching call"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(id: &str, name: &str) -> StreamEvent {
        StreamEvent::ToolCall {
            payload: ToolCallPayload {
                tool_call_id: id.to_string(),
                tool_name: name.to_string(),
                args: json!({}),
            },
        }
    }

    fn result(id: &str, name: &str) -> StreamEvent {
        StreamEvent::ToolResult {
            payload: ToolResultPayload {
                tool_call_id: id.to_string(),
                tool_name: name.to_string(),
                result: json!({"ok": true}),
            },
        }
    }

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::TextDelta {
            text: text.to_string(),
        }
    }

    #[test]
    fn text_deltas_coalesce_into_one_entry() {
        let mut transcript = Transcript::new();
        let mut store = StateStore::new();
        transcript.apply(delta("Let me "), &mut store);
        transcript.apply(delta("check..."), &mut store);

        assert_eq!(
            transcript.entries(),
            &[TranscriptEntry::Text {
                content: "Let me check...".to_string(),
            }]
        );
    }

    #[test]
    fn tool_boundary_starts_a_fresh_text_entry() {
        let mut transcript = Transcript::new();
        let mut store = StateStore::new();
        transcript.apply(delta("before"), &mut store);
        transcript.apply(call("c1", "check-calendar"), &mut store);
        transcript.apply(result("c1", "check-calendar"), &mut store);
        transcript.apply(delta("after"), &mut store);

        assert_eq!(transcript.entries().len(), 4);
        assert_eq!(
            transcript.entries()[3],
            TranscriptEntry::Text {
                content: "after".to_string(),
            }
        );
    }

    #[test]
    fn results_complete_their_call_by_id() {
        let mut transcript = Transcript::new();
        let mut store = StateStore::new();
        transcript.apply(call("c1", "check-calendar"), &mut store);
        transcript.apply(call("c2", "search-person"), &mut store);
        // Out-of-order arrival still resolves the right entry.
        transcript.apply(result("c1", "check-calendar"), &mut store);

        let TranscriptEntry::ToolCall { completed, .. } = &transcript.entries()[0] else {
            panic!("expected tool call");
        };
        assert!(completed);
        let TranscriptEntry::ToolCall { completed, .. } = &transcript.entries()[1] else {
            panic!("expected tool call");
        };
        assert!(!completed);
    }

    #[test]
    fn unknown_result_id_falls_back_to_latest_incomplete_call() {
        let mut transcript = Transcript::new();
        let mut store = StateStore::new();
        transcript.apply(call("c1", "check-calendar"), &mut store);
        transcript.apply(result("", "check-calendar"), &mut store);

        let TranscriptEntry::ToolCall { completed, .. } = &transcript.entries()[0] else {
            panic!("expected tool call");
        };
        assert!(completed);
    }

    #[test]
    fn action_dispatches_into_the_store_without_a_transcript_entry() {
        let mut transcript = Transcript::new();
        let mut store = StateStore::new();
        store.set("emailDraft", json!({"body": "old"}));
        store.register_setter("emailDraft", "draftReply", |draft, args| {
            *draft = json!({"body": args.first().cloned().unwrap_or(serde_json::Value::Null)});
        });

        transcript.apply(
            StreamEvent::Action {
                content: None,
                state_key: "emailDraft".to_string(),
                setter_key: "draftReply".to_string(),
                args: vec![json!("new")],
            },
            &mut store,
        );

        assert!(transcript.entries().is_empty());
        assert_eq!(store.get("emailDraft").unwrap()["body"], "new");
    }

    #[test]
    fn narration_events_are_recorded_for_display() {
        let mut transcript = Transcript::new();
        let mut store = StateStore::new();
        transcript.apply(
            StreamEvent::Transcription {
                transcription: "schedule a call".to_string(),
            },
            &mut store,
        );
        transcript.apply(
            StreamEvent::Audio {
                audio_data: "AAAA".to_string(),
                audio_format: "audio/pcm;rate=22050".to_string(),
                content: "Done.".to_string(),
            },
            &mut store,
        );
        transcript.apply(
            StreamEvent::Error {
                message: "stream failed".to_string(),
            },
            &mut store,
        );

        assert_eq!(transcript.entries().len(), 3);
        assert!(matches!(
            transcript.entries()[2],
            TranscriptEntry::Progress {
                state: ProgressState::Error,
                ..
            }
        ));
    }
}
