use crate::tool::ToolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    /// The underlying model call failed or reported an error mid-stream.
    #[error("model error: {0}")]
    Model(String),

    /// A tool execution failed. Ends the whole agent turn; there is no
    /// per-tool recovery.
    #[error("tool '{name}' failed: {source}")]
    Tool {
        name: String,
        #[source]
        source: ToolError,
    },

    /// The model asked for a tool that is not in the palette.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The model violated the prescribed tool invocation order.
    #[error("tool order violation: {0}")]
    ToolOrder(String),

    /// The model's structured output could not be parsed.
    #[error("malformed structured output: {0}")]
    StructuredOutput(String),
}
