//! Shared types for the Courier email copilot.
//!
//! This crate defines the wire protocol spoken over the SSE channel
//! ([`StreamEvent`]), the HTTP request/response bodies, and the
//! word-count range table used by the rewrite-draft flow.
//!
//! No crate in the workspace depends on anything *except*
//! `courier-types` for cross-cutting type definitions. This keeps the
//! dependency graph clean and prevents circular dependencies.

pub mod chat;
pub mod event;
pub mod wordcount;

pub use chat::{
    ChatRequest, ChatResponse, ComposeDraft, RangeContext, RewriteRequest, Usage, VoiceResponse,
};
pub use event::{ProgressState, StreamEvent, ToolCallPayload, ToolResultPayload};
pub use wordcount::{select_range, WordRange, WORD_RANGES};
