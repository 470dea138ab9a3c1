//! Decoding of received SSE `data` payloads.

use courier_types::StreamEvent;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    /// The payload is a JSON envelope, but not one of the known event
    /// types. Unknown tags are rejected rather than silently dropped.
    #[error("unrecognized event envelope: {0}")]
    UnknownEnvelope(String),
}

/// Decodes one SSE `data` payload into an event.
///
/// A payload that parses as a tagged JSON envelope is that event. A
/// payload that is JSON but not a known envelope is an error. Anything
/// else is the text-delta fast path: bare text with newlines escaped
/// as literal `\n`.
pub fn parse_frame(data: &str) -> Result<StreamEvent, FrameError> {
    if let Ok(event) = serde_json::from_str::<StreamEvent>(data) {
        return Ok(event);
    }
    if serde_json::from_str::<Value>(data).is_ok_and(|v| v.is_object()) {
        return Err(FrameError::UnknownEnvelope(data.to_string()));
    }
    Ok(StreamEvent::TextDelta {
        text: data.replace("\\n", "\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_types::ProgressState;

    #[test]
    fn json_envelope_decodes_to_its_event() {
        let event =
            parse_frame(r#"{"type":"progress_update","state":"in_progress","text":"Thinking..."}"#)
                .unwrap();
        assert_eq!(
            event,
            StreamEvent::ProgressUpdate {
                state: ProgressState::InProgress,
                text: "Thinking...".to_string(),
            }
        );
    }

    #[test]
    fn bare_text_is_a_text_delta_with_newlines_restored() {
        let event = parse_frame("Hello,\\nworld").unwrap();
        assert_eq!(
            event,
            StreamEvent::TextDelta {
                text: "Hello,\nworld".to_string(),
            }
        );
    }

    #[test]
    fn unknown_envelope_is_rejected() {
        let err = parse_frame(r#"{"type":"telemetry","ms":12}"#).unwrap_err();
        assert!(matches!(err, FrameError::UnknownEnvelope(_)));
    }

    #[test]
    fn json_that_is_not_an_object_is_treated_as_text() {
        // A delta that happens to look like a JSON scalar stays text.
        let event = parse_frame("42").unwrap();
        assert_eq!(
            event,
            StreamEvent::TextDelta {
                text: "42".to_string(),
            }
        );
    }
}
