//! Scripted provider for tests and offline development.
//!
//! Produces the exact same `ModelEvent` sequences as the real adapter,
//! so every layer above the [`Model`] seam can run without HTTP. A
//! script holds one event list per model *turn*; each `stream` call
//! consumes the next turn, which is how the agent's tool loop is
//! exercised (turn 1 ends in a tool use, turn 2 continues after the
//! result, ...).

use crate::model::{Model, ModelEvent, ModelRequest};
use async_stream::stream;
use futures::stream::BoxStream;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Default)]
pub struct ScriptedModel {
    turns: Mutex<VecDeque<Vec<ModelEvent>>>,
    chunk_delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<Vec<ModelEvent>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            chunk_delay: None,
        }
    }

    /// Inter-event delay, for timing-sensitive tests.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Single text-only turn streamed in the given chunks.
    pub fn text_turn(chunks: &[&str]) -> Self {
        let mut events: Vec<ModelEvent> = chunks
            .iter()
            .map(|chunk| ModelEvent::TextDelta((*chunk).to_string()))
            .collect();
        events.push(ModelEvent::Done);
        Self::new(vec![events])
    }
}

impl Model for ScriptedModel {
    fn stream(&self, _request: ModelRequest) -> BoxStream<'static, ModelEvent> {
        let turn = self
            .turns
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                vec![
                    ModelEvent::Error("scripted model exhausted".to_string()),
                ]
            });
        let delay = self.chunk_delay;

        Box::pin(stream! {
            for event in turn {
                if let Some(delay) = delay {
                    sleep(delay).await;
                }
                yield event;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn turns_are_consumed_in_order() {
        let model = ScriptedModel::new(vec![
            vec![
                ModelEvent::TextDelta("first".to_string()),
                ModelEvent::ToolUse {
                    id: "call_1".to_string(),
                    name: "check-calendar".to_string(),
                    args: json!({}),
                },
            ],
            vec![ModelEvent::TextDelta("second".to_string()), ModelEvent::Done],
        ]);

        let turn1: Vec<_> = model.stream(ModelRequest::default()).collect().await;
        assert_eq!(turn1.len(), 2);
        assert!(matches!(turn1[1], ModelEvent::ToolUse { .. }));

        let turn2: Vec<_> = model.stream(ModelRequest::default()).collect().await;
        assert_eq!(turn2[0], ModelEvent::TextDelta("second".to_string()));
        assert_eq!(turn2[1], ModelEvent::Done);
    }

    #[tokio::test]
    async fn exhausted_script_errors() {
        let model = ScriptedModel::text_turn(&["only turn"]);
        let _: Vec<_> = model.stream(ModelRequest::default()).collect().await;

        let events: Vec<_> = model.stream(ModelRequest::default()).collect().await;
        assert!(matches!(events[0], ModelEvent::Error(_)));
    }
}
