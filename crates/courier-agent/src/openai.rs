//! OpenAI chat-completions client with SSE streaming support.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Role;
use crate::model::{Model, ModelEvent, ModelRequest, ToolSpec};
use crate::sse::SseParser;
use courier_types::Usage;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";

/// Streaming chat-completions client. Implements [`Model`], so the
/// agent engine never sees the wire dialect.
pub struct OpenAiClient {
    api_key: Arc<str>,
    model: String,
    api_url: String,
    http: Client,
}

fn build_http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into().into(),
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            http: build_http_client(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the client at a compatible endpoint (proxy, test server).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

impl Model for OpenAiClient {
    fn stream(&self, request: ModelRequest) -> BoxStream<'static, ModelEvent> {
        let api_key = Arc::clone(&self.api_key);
        let http = self.http.clone();
        let api_url = self.api_url.clone();
        let body = build_body(&self.model, &request);

        Box::pin(stream! {
            let response = http
                .post(&api_url)
                .bearer_auth(api_key.as_ref())
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    yield ModelEvent::Error(format!("request failed: {e}"));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                yield ModelEvent::Error(format!("{status}: {body}"));
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut parser = SseParser::new();
            let mut processor = ChunkProcessor::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield ModelEvent::Error(format!("stream error: {e}"));
                        return;
                    }
                };
                for frame in parser.push(&chunk) {
                    for event in processor.process(&frame.data) {
                        yield event;
                    }
                }
            }
            if let Some(frame) = parser.finish() {
                for event in processor.process(&frame.data) {
                    yield event;
                }
            }
            for event in processor.finish() {
                yield event;
            }
        })
    }
}

fn build_body(model: &str, request: &ModelRequest) -> ApiRequest {
    ApiRequest {
        model: model.to_string(),
        stream: true,
        stream_options: StreamOptions { include_usage: true },
        messages: build_messages(request),
        tools: request.tools.iter().map(build_tool).collect(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

fn build_tool(spec: &ToolSpec) -> ApiTool {
    ApiTool {
        tool_type: "function".to_string(),
        function: ApiFunction {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.parameters.clone(),
        },
    }
}

fn build_messages(request: &ModelRequest) -> Vec<ApiMessage> {
    let mut messages = Vec::new();
    if !request.system.is_empty() {
        messages.push(ApiMessage::plain("system", request.system.clone()));
    }

    for msg in &request.messages {
        if !msg.tool_results.is_empty() {
            // One `tool` message per result, correlated by call id.
            for result in &msg.tool_results {
                messages.push(ApiMessage {
                    role: "tool".to_string(),
                    content: Some(result.result.to_string()),
                    tool_calls: Vec::new(),
                    tool_call_id: Some(result.tool_call_id.clone()),
                });
            }
            continue;
        }

        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };

        if msg.tool_calls.is_empty() {
            messages.push(ApiMessage::plain(role, msg.content.clone()));
        } else {
            messages.push(ApiMessage {
                role: role.to_string(),
                content: (!msg.content.is_empty()).then(|| msg.content.clone()),
                tool_calls: msg
                    .tool_calls
                    .iter()
                    .map(|call| ApiToolCall {
                        id: call.id.clone(),
                        call_type: "function".to_string(),
                        function: ApiCallFunction {
                            name: call.name.clone(),
                            arguments: call.args.to_string(),
                        },
                    })
                    .collect(),
                tool_call_id: None,
            });
        }
    }

    messages
}

/// Reassembles tool-call argument deltas across streamed chunks.
///
/// Chat-completions streams tool calls as indexed fragments: the first
/// fragment carries `id` and `function.name`, later ones append to
/// `function.arguments`. Completed calls are flushed when a choice
/// finishes with `tool_calls`, or at end of stream as a fallback.
struct ChunkProcessor {
    pending: Vec<ToolCallAccumulator>,
    done: bool,
}

#[derive(Default)]
struct ToolCallAccumulator {
    id: String,
    name: String,
    arguments: String,
}

impl ChunkProcessor {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            done: false,
        }
    }

    fn process(&mut self, data: &str) -> Vec<ModelEvent> {
        let mut events = Vec::new();
        if data.trim() == "[DONE]" {
            events.extend(self.flush_tool_calls());
            if !self.done {
                self.done = true;
                events.push(ModelEvent::Done);
            }
            return events;
        }

        let chunk: ApiChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(_) => return events,
        };

        if let Some(usage) = chunk.usage {
            events.push(ModelEvent::Usage(Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            }));
        }

        for choice in chunk.choices {
            if let Some(text) = choice.delta.content {
                if !text.is_empty() {
                    events.push(ModelEvent::TextDelta(text));
                }
            }
            for fragment in choice.delta.tool_calls {
                let index = fragment.index as usize;
                if self.pending.len() <= index {
                    self.pending.resize_with(index + 1, Default::default);
                }
                let acc = &mut self.pending[index];
                if let Some(id) = fragment.id {
                    acc.id = id;
                }
                if let Some(function) = fragment.function {
                    if let Some(name) = function.name {
                        acc.name = name;
                    }
                    if let Some(arguments) = function.arguments {
                        acc.arguments.push_str(&arguments);
                    }
                }
            }
            if choice.finish_reason.as_deref() == Some("tool_calls") {
                events.extend(self.flush_tool_calls());
            }
        }

        events
    }

    /// End-of-stream fallback for providers that close the body
    /// without a `[DONE]` sentinel.
    fn finish(&mut self) -> Vec<ModelEvent> {
        let mut events = self.flush_tool_calls();
        if !self.done {
            self.done = true;
            events.push(ModelEvent::Done);
        }
        events
    }

    fn flush_tool_calls(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|acc| !acc.name.is_empty())
            .map(|acc| ModelEvent::ToolUse {
                id: acc.id,
                name: acc.name,
                args: serde_json::from_str(&acc.arguments)
                    .unwrap_or(Value::Object(Default::default())),
            })
            .collect()
    }
}

// Wire types.

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    stream: bool,
    stream_options: StreamOptions,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ApiMessage {
    fn plain(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: ApiCallFunction,
}

#[derive(Debug, Serialize)]
struct ApiCallFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiChunk {
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    delta: ApiDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ApiToolCallDelta>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCallDelta {
    index: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<ApiCallFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct ApiCallFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::message::ToolCallRecord;
    use crate::message::ToolResultRecord;
    use serde_json::json;

    #[test]
    fn build_messages_puts_system_first() {
        let request = ModelRequest {
            system: "be helpful".to_string(),
            messages: vec![Message::user("hi")],
            ..Default::default()
        };
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn build_messages_renders_tool_exchange() {
        let request = ModelRequest {
            messages: vec![
                Message::user("schedule a meeting"),
                Message::assistant_with_tool_calls(
                    "Checking the calendar.",
                    vec![ToolCallRecord {
                        id: "call_1".to_string(),
                        name: "check-calendar".to_string(),
                        args: json!({}),
                    }],
                ),
                Message::tool_results(vec![ToolResultRecord {
                    tool_call_id: "call_1".to_string(),
                    result: json!({"availableTimes": []}),
                }]),
            ],
            ..Default::default()
        };

        let json = serde_json::to_value(build_messages(&request)).unwrap();
        let messages = json.as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(messages[1]["tool_calls"][0]["type"], "function");
        assert_eq!(
            messages[1]["tool_calls"][0]["function"]["name"],
            "check-calendar"
        );
        assert_eq!(messages[2]["role"], "tool");
        assert_eq!(messages[2]["tool_call_id"], "call_1");
        assert!(messages[2]["content"]
            .as_str()
            .unwrap()
            .contains("availableTimes"));
    }

    #[test]
    fn assistant_tool_call_without_text_omits_content() {
        let request = ModelRequest {
            messages: vec![Message::assistant_with_tool_calls(
                "",
                vec![ToolCallRecord {
                    id: "call_1".to_string(),
                    name: "search-person".to_string(),
                    args: json!({"name": "Avery"}),
                }],
            )],
            ..Default::default()
        };
        let json = serde_json::to_value(build_messages(&request)).unwrap();
        assert!(json[0].get("content").is_none());
    }

    #[test]
    fn request_body_advertises_tools_and_usage() {
        let request = ModelRequest {
            tools: vec![ToolSpec {
                name: "write-email".to_string(),
                description: "drafts an email".to_string(),
                parameters: json!({"type": "object"}),
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(build_body("gpt-4o", &request)).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["stream_options"]["include_usage"], true);
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "write-email");
    }

    #[test]
    fn process_text_delta() {
        let mut processor = ChunkProcessor::new();
        let events =
            processor.process(r#"{"choices":[{"delta":{"content":"Hello"}}]}"#);
        assert_eq!(events, vec![ModelEvent::TextDelta("Hello".to_string())]);
    }

    #[test]
    fn process_accumulates_tool_call_fragments() {
        let mut processor = ChunkProcessor::new();
        assert!(processor
            .process(
                r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_9","function":{"name":"check-calendar","arguments":""}}]}}]}"#
            )
            .is_empty());
        assert!(processor
            .process(
                r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"day\":"}}]}}]}"#
            )
            .is_empty());
        assert!(processor
            .process(
                r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"monday\"}"}}]}}]}"#
            )
            .is_empty());

        let events = processor
            .process(r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#);
        assert_eq!(
            events,
            vec![ModelEvent::ToolUse {
                id: "call_9".to_string(),
                name: "check-calendar".to_string(),
                args: json!({"day": "monday"}),
            }]
        );
    }

    #[test]
    fn malformed_arguments_fall_back_to_empty_object() {
        let mut processor = ChunkProcessor::new();
        processor.process(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"c","function":{"name":"t","arguments":"{oops"}}]}}]}"#,
        );
        let events =
            processor.process(r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#);
        assert_eq!(
            events,
            vec![ModelEvent::ToolUse {
                id: "c".to_string(),
                name: "t".to_string(),
                args: json!({}),
            }]
        );
    }

    #[test]
    fn done_sentinel_ends_the_turn_once() {
        let mut processor = ChunkProcessor::new();
        assert_eq!(processor.process("[DONE]"), vec![ModelEvent::Done]);
        assert!(processor.process("[DONE]").is_empty());
        assert!(processor.finish().is_empty());
    }

    #[test]
    fn usage_chunk_maps_token_counts() {
        let mut processor = ChunkProcessor::new();
        let events = processor
            .process(r#"{"choices":[],"usage":{"prompt_tokens":12,"completion_tokens":34}}"#);
        assert_eq!(
            events,
            vec![ModelEvent::Usage(Usage {
                input_tokens: 12,
                output_tokens: 34,
            })]
        );
    }

    #[test]
    fn finish_emits_done_when_body_closes_without_sentinel() {
        let mut processor = ChunkProcessor::new();
        processor.process(r#"{"choices":[{"delta":{"content":"hi"}}]}"#);
        assert_eq!(processor.finish(), vec![ModelEvent::Done]);
    }
}
