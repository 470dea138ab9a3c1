//! The chat workflow: context preparation, agent invocation, memory.

use crate::relay::StreamRelay;
use crate::sse::{ClientGone, SseSender};
use crate::AppState;
use courier_agent::{AgentError, AgentOptions, Message};
use courier_types::{ChatRequest, ChatResponse, ProgressState, StreamEvent};
use futures_util::StreamExt;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    ClientGone(#[from] ClientGone),
}

/// Builds the message array for the agent from the request.
///
/// The opaque frontend context is not forwarded wholesale: only the
/// email currently on screen (`currentEmailBeingViewed[0].data.value`)
/// is extracted and appended as a second user message.
pub fn prepare_messages(request: &ChatRequest) -> Vec<Message> {
    let mut messages = vec![Message::user(request.prompt.clone())];
    if let Some(email) = viewed_email(request.additional_context.as_ref()) {
        messages.push(Message::user(format!(
            "Current email user is looking at: {email}"
        )));
    }
    messages
}

fn viewed_email(context: Option<&Value>) -> Option<String> {
    let value = context?
        .get("currentEmailBeingViewed")?
        .get(0)?
        .get("data")?
        .get("value")?;
    Some(value.to_string())
}

fn agent_options(request: &ChatRequest) -> AgentOptions {
    AgentOptions {
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        system_prompt: request.system_prompt.clone(),
    }
}

/// Memory linkage requires both identifiers; one alone is ignored.
fn memory_key(request: &ChatRequest) -> Option<(&str, &str)> {
    match (&request.resource_id, &request.thread_id) {
        (Some(resource), Some(thread)) => Some((resource.as_str(), thread.as_str())),
        _ => None,
    }
}

/// Non-streaming chat: runs the full tool loop and returns the answer.
pub async fn run_chat(
    state: &AppState,
    request: ChatRequest,
) -> Result<ChatResponse, WorkflowError> {
    let new_messages = prepare_messages(&request);
    let mut conversation = match memory_key(&request) {
        Some((resource, thread)) => state.memory.load(resource, thread).await,
        None => Vec::new(),
    };
    conversation.extend(new_messages.clone());

    let response = state
        .email_agent
        .generate(conversation, agent_options(&request))
        .await?;

    if let Some((resource, thread)) = memory_key(&request) {
        let mut turn = new_messages;
        turn.push(Message::assistant(response.content.clone()));
        state.memory.append(resource, thread, turn).await;
    }

    Ok(ChatResponse {
        content: response.content,
        usage: Some(response.usage),
    })
}

/// Streaming chat: drives the agent and pushes translated events
/// through the relay to the transport.
///
/// Emits the progress bracket around the turn: `in_progress` before
/// the first agent event, `complete` after the relay has flushed. Any
/// failure propagates to the transport layer, which appends the
/// terminal error event.
pub async fn stream_chat(
    state: &AppState,
    request: ChatRequest,
    mut relay: StreamRelay,
    sender: &SseSender,
) -> Result<(), WorkflowError> {
    sender
        .send(StreamEvent::progress(
            ProgressState::InProgress,
            "Thinking...",
        ))
        .await?;

    let new_messages = prepare_messages(&request);
    let mut conversation = match memory_key(&request) {
        Some((resource, thread)) => state.memory.load(resource, thread).await,
        None => Vec::new(),
    };
    conversation.extend(new_messages.clone());

    let mut stream = state
        .email_agent
        .stream(conversation, agent_options(&request));
    while let Some(chunk) = stream.next().await {
        relay.forward(chunk?, sender).await?;
    }
    for event in relay.finish().await {
        sender.send(event).await?;
    }

    if let Some((resource, thread)) = memory_key(&request) {
        let mut turn = new_messages;
        turn.push(Message::assistant(stream.totals().content));
        state.memory.append(resource, thread, turn).await;
    }

    sender
        .send(StreamEvent::progress(
            ProgressState::Complete,
            "Generated email",
        ))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_alone_is_a_single_user_message() {
        let request = ChatRequest {
            prompt: "Schedule a call with Avery".to_string(),
            ..Default::default()
        };
        let messages = prepare_messages(&request);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Schedule a call with Avery");
    }

    #[test]
    fn viewed_email_is_appended_as_context() {
        let request = ChatRequest {
            prompt: "reply to this".to_string(),
            additional_context: Some(json!({
                "currentEmailBeingViewed": [
                    {"data": {"value": {"from": "avery@example.com", "subject": "Sync"}}}
                ]
            })),
            ..Default::default()
        };
        let messages = prepare_messages(&request);
        assert_eq!(messages.len(), 2);
        assert!(messages[1]
            .content
            .starts_with("Current email user is looking at: "));
        assert!(messages[1].content.contains("avery@example.com"));
    }

    #[test]
    fn irrelevant_context_is_dropped() {
        let request = ChatRequest {
            prompt: "hi".to_string(),
            additional_context: Some(json!({"somethingElse": true})),
            ..Default::default()
        };
        assert_eq!(prepare_messages(&request).len(), 1);
    }

    #[test]
    fn memory_needs_both_identifiers() {
        let mut request = ChatRequest {
            prompt: "hi".to_string(),
            resource_id: Some("user-1".to_string()),
            ..Default::default()
        };
        assert!(memory_key(&request).is_none());
        request.thread_id = Some("thread-1".to_string());
        assert_eq!(memory_key(&request), Some(("user-1", "thread-1")));
    }
}
