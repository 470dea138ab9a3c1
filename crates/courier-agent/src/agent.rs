//! The agent: a model, fixed instructions, and an ordered tool palette.

use crate::error::AgentError;
use crate::guard::ToolOrderGuard;
use crate::message::{Message, ToolCallRecord, ToolResultRecord};
use crate::model::{Model, ModelEvent, ModelRequest};
use crate::tool::ToolPalette;
use async_stream::stream;
use courier_types::{ToolCallPayload, ToolResultPayload, Usage};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

/// Per-invocation knobs. `system_prompt` overrides the agent's
/// instructions for this call only.
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

/// Typed chunks produced by a streaming invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentChunk {
    TextDelta(String),
    ToolCall(ToolCallPayload),
    ToolResult(ToolResultPayload),
}

/// Totals readable once the chunk stream is exhausted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentTotals {
    /// Full concatenated response text across all turns.
    pub content: String,
    pub usage: Usage,
}

/// Complete answer from a single-shot invocation.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub content: String,
    pub usage: Usage,
}

/// The chunk stream plus its running totals. The totals are only
/// meaningful after the stream has been driven to completion.
pub struct AgentStream {
    inner: BoxStream<'static, Result<AgentChunk, AgentError>>,
    totals: Arc<Mutex<AgentTotals>>,
}

impl AgentStream {
    pub fn totals(&self) -> AgentTotals {
        self.totals.lock().expect("totals lock poisoned").clone()
    }
}

impl futures::Stream for AgentStream {
    type Item = Result<AgentChunk, AgentError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

#[derive(Clone)]
pub struct Agent {
    name: String,
    instructions: String,
    model: Arc<dyn Model>,
    tools: ToolPalette,
    enforce_order: bool,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: Arc<dyn Model>,
        tools: ToolPalette,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model,
            tools,
            enforce_order: false,
        }
    }

    /// Enables the runtime tool-order guard over the palette order.
    pub fn with_order_enforcement(mut self) -> Self {
        self.enforce_order = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn build_request(&self, messages: &[Message], options: &AgentOptions) -> ModelRequest {
        ModelRequest {
            system: options
                .system_prompt
                .clone()
                .unwrap_or_else(|| self.instructions.clone()),
            messages: messages.to_vec(),
            tools: self.tools.specs(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }

    /// Streaming invocation with the tool loop.
    ///
    /// Text deltas pass through as they arrive. A tool request is
    /// guarded (when enabled), announced as a `ToolCall` chunk,
    /// executed, announced as a `ToolResult` chunk, appended to the
    /// conversation, and the model is re-invoked. A turn that requests
    /// no tool ends the stream. Every emitted `ToolCall` therefore
    /// strictly precedes its `ToolResult`, and neither is ever dropped.
    pub fn stream(&self, messages: Vec<Message>, options: AgentOptions) -> AgentStream {
        let agent = self.clone();
        let totals = Arc::new(Mutex::new(AgentTotals::default()));
        let shared_totals = Arc::clone(&totals);

        let inner = stream! {
            let mut conversation = messages;
            let mut guard = agent
                .enforce_order
                .then(|| ToolOrderGuard::new(agent.tools.names()));

            'turn: loop {
                let request = agent.build_request(&conversation, &options);
                let mut model_stream = agent.model.stream(request);
                let mut turn_text = String::new();
                let mut requested_tool: Option<ToolCallRecord> = None;

                while let Some(event) = model_stream.next().await {
                    match event {
                        ModelEvent::TextDelta(text) => {
                            turn_text.push_str(&text);
                            shared_totals
                                .lock()
                                .expect("totals lock poisoned")
                                .content
                                .push_str(&text);
                            yield Ok(AgentChunk::TextDelta(text));
                        }
                        ModelEvent::Usage(usage) => {
                            shared_totals
                                .lock()
                                .expect("totals lock poisoned")
                                .usage
                                .add(usage);
                        }
                        ModelEvent::ToolUse { id, name, args } => {
                            requested_tool = Some(ToolCallRecord { id, name, args });
                            // The turn ends at the tool request; any
                            // trailing provider events belong to the
                            // next turn's invocation.
                            break;
                        }
                        ModelEvent::Done => {}
                        ModelEvent::Error(message) => {
                            tracing::warn!(agent = %agent.name, %message, "model stream failed");
                            yield Err(AgentError::Model(message));
                            return;
                        }
                    }
                }

                let Some(call) = requested_tool else {
                    break 'turn;
                };

                if let Some(guard) = guard.as_mut() {
                    if let Err(err) = guard.check(&call.name) {
                        yield Err(err);
                        return;
                    }
                }

                yield Ok(AgentChunk::ToolCall(ToolCallPayload {
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    args: call.args.clone(),
                }));

                let Some(tool) = agent.tools.get(&call.name).cloned() else {
                    yield Err(AgentError::UnknownTool(call.name));
                    return;
                };

                let result = match tool.execute(call.args.clone()).await {
                    Ok(result) => result,
                    Err(source) => {
                        yield Err(AgentError::Tool { name: call.name, source });
                        return;
                    }
                };

                yield Ok(AgentChunk::ToolResult(ToolResultPayload {
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    result: result.clone(),
                }));

                conversation.push(Message::assistant_with_tool_calls(
                    std::mem::take(&mut turn_text),
                    vec![call.clone()],
                ));
                conversation.push(Message::tool_results(vec![ToolResultRecord {
                    tool_call_id: call.id,
                    result,
                }]));
            }
        };

        AgentStream {
            inner: Box::pin(inner),
            totals,
        }
    }

    /// Single-shot invocation: drives the same tool loop to completion
    /// and returns the collected answer.
    pub async fn generate(
        &self,
        messages: Vec<Message>,
        options: AgentOptions,
    ) -> Result<AgentResponse, AgentError> {
        let mut stream = self.stream(messages, options);
        while let Some(chunk) = stream.next().await {
            chunk?;
        }
        let totals = stream.totals();
        Ok(AgentResponse {
            content: totals.content,
            usage: totals.usage,
        })
    }

    /// Single-shot invocation whose answer is a JSON object, parsed
    /// into `T`. Tolerates markdown fencing and prose around the
    /// object.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        messages: Vec<Message>,
        options: AgentOptions,
    ) -> Result<T, AgentError> {
        let response = self.generate(messages, options).await?;
        let json = extract_json_object(&response.content).ok_or_else(|| {
            AgentError::StructuredOutput(format!(
                "no JSON object in model output: {}",
                truncate(&response.content, 120)
            ))
        })?;
        serde_json::from_str(json).map_err(|e| AgentError::StructuredOutput(e.to_string()))
    }
}

/// Returns the outermost `{...}` slice of `text`, if any.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
