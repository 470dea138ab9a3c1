//! The provider seam: anything that can stream a model turn.

use crate::message::Message;
use courier_types::Usage;
use futures::stream::BoxStream;
use serde_json::Value;

/// Tool advertisement passed to the provider.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// One model invocation.
#[derive(Debug, Clone, Default)]
pub struct ModelRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Events emitted while a model turn streams.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// A chunk of response text.
    TextDelta(String),
    /// The model requested a tool invocation. Arguments arrive fully
    /// accumulated; adapters are responsible for delta reassembly.
    ToolUse { id: String, name: String, args: Value },
    /// Token usage information.
    Usage(Usage),
    /// The turn completed.
    Done,
    /// The turn failed.
    Error(String),
}

/// A streaming LLM provider.
///
/// `stream` returns immediately; all I/O happens as the stream is
/// polled. The stream is finite and single-pass: it ends with `Done`
/// or `Error`.
pub trait Model: Send + Sync {
    fn stream(&self, request: ModelRequest) -> BoxStream<'static, ModelEvent>;
}
