//! Agent invocation engine for Courier.
//!
//! An [`Agent`] is a model plus fixed instructions and an ordered tool
//! palette. Invoking it either collects a complete answer
//! ([`Agent::generate`]) or yields a typed chunk stream
//! ([`Agent::stream`]) interleaving text deltas with tool-call /
//! tool-result pairs. The engine owns the tool loop: when the model
//! requests a tool, the engine executes it, feeds the result back into
//! the conversation, and re-invokes the model until a text-only turn.
//!
//! Providers sit behind the [`Model`] trait; [`OpenAiClient`] speaks
//! the chat-completions SSE dialect and [`ScriptedModel`] replays
//! pre-programmed turns so every layer above can be tested without HTTP.

pub mod agent;
pub mod email;
pub mod error;
pub mod guard;
pub mod memory;
pub mod message;
pub mod model;
pub mod openai;
pub mod scripted;
pub mod sse;
pub mod tool;

pub use agent::{Agent, AgentChunk, AgentOptions, AgentResponse, AgentStream, AgentTotals};
pub use email::{
    email_agent, rewrite_agent, RewriteOutput, CHECK_CALENDAR_TOOL, SEARCH_PERSON_TOOL,
    WRITE_EMAIL_TOOL,
};
pub use error::AgentError;
pub use guard::ToolOrderGuard;
pub use memory::{InMemoryStore, MemoryStore};
pub use message::{Message, Role, ToolCallRecord, ToolResultRecord};
pub use model::{Model, ModelEvent, ModelRequest, ToolSpec};
pub use openai::OpenAiClient;
pub use scripted::ScriptedModel;
pub use tool::{Tool, ToolError, ToolPalette};
