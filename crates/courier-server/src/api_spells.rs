//! Spell route handlers: fixed UI-triggered actions.
//!
//! Four of the five spells emit a canned draft-replacement action
//! after a small artificial delay; rewrite-draft is the one
//! semi-generated spell, backed by the rewrite agent.

use crate::api::{parse_body, ApiError};
use crate::sse::stream_response;
use crate::AppState;
use axum::extract::{Extension, Json};
use axum::response::IntoResponse;
use courier_agent::{AgentOptions, Message, RewriteOutput};
use courier_types::{select_range, ProgressState, RewriteRequest, StreamEvent};
use serde_json::{json, Value};
use std::sync::Arc;

const SCHEDULE_MEETING_BODY: &str = "Hi Avery,\n\nThank you for reaching out. I'm glad to hear about the progress on the frontend components and I'm eager to discuss the user authentication flow and data persistence.\n\nHere are a few time slots I have available this week:\n- Tuesday, August 18th at 9:00 AM\n- Tuesday, August 18th at 11:00 AM\n- Wednesday, August 19th at 10:00 AM\n\nPlease let me know if any of these times work for you, or feel free to suggest another time that suits your schedule better. I'm open to either a video call or an in-person meeting, as you prefer.\n\nLooking forward to our discussion.\n\nBest regards,\n\nJesse Li";

const POLITE_REJECTION_BODY: &str = "Dear Avery Chen,\n\nThank you for reaching out and for your interest. After careful consideration, I regret to inform you that I won't be able to proceed with this opportunity at this time.\n\nI appreciate your understanding and wish you the best with your endeavors.\n\nBest regards,\nJesse";

const THANK_YOU_BODY: &str = "Dear Avery Chen,\n\nI wanted to take a moment to express my sincere gratitude for your assistance and support. Your assistance and support have been invaluable.\n\nThank you once again for your time and consideration.\n\nWith appreciation,\nJesse";

const FOLLOW_UP_BODY: &str = "Dear [Recipient Name],\n\nI hope you're doing well. I wanted to follow up on our previous conversation regarding [topic].\n\nI understand you may be busy, but I wanted to check if you had a chance to consider my previous message. Please let me know if you need any additional information.\n\nLooking forward to hearing from you.\n\nBest regards,\n[Your Name]";

/// Emits one canned draft-replacement action, then holds the stream
/// open briefly so the UI sees a stream rather than an instant close.
fn canned_spell(
    state: Arc<AppState>,
    content: &'static str,
    args: Vec<Value>,
) -> impl IntoResponse {
    stream_response(move |sender| async move {
        sender
            .send(StreamEvent::Action {
                content: Some(content.to_string()),
                state_key: "emailDraft".to_string(),
                setter_key: "draftReply".to_string(),
                args,
            })
            .await?;
        tokio::time::sleep(state.spell_delay).await;
        Ok::<(), crate::sse::ClientGone>(())
    })
}

/// Handler for `POST /chat/schedule-meeting/stream`.
pub async fn schedule_meeting_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(_body): Json<Value>,
) -> impl IntoResponse {
    canned_spell(
        state,
        "I'll help you schedule a meeting. Let me draft a professional email...",
        vec![json!(SCHEDULE_MEETING_BODY)],
    )
}

/// Handler for `POST /chat/polite-rejection/stream`.
pub async fn polite_rejection_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(_body): Json<Value>,
) -> impl IntoResponse {
    canned_spell(
        state,
        "I'll help you craft a polite rejection email...",
        vec![json!(POLITE_REJECTION_BODY), json!("Re: Your Request")],
    )
}

/// Handler for `POST /chat/thank-you/stream`.
pub async fn thank_you_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(_body): Json<Value>,
) -> impl IntoResponse {
    canned_spell(
        state,
        "I'll help you create a thank you email...",
        vec![json!(THANK_YOU_BODY), json!("Thank You")],
    )
}

/// Handler for `POST /chat/follow-up/stream`.
pub async fn follow_up_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(_body): Json<Value>,
) -> impl IntoResponse {
    canned_spell(
        state,
        "I'll help you create a follow-up email...",
        vec![
            json!(FOLLOW_UP_BODY),
            json!("Following Up - [Original Subject]"),
        ],
    )
}

/// The rewrite prompt sent to the rewrite agent.
fn rewrite_prompt(request: &RewriteRequest) -> String {
    let (min, max, range_name) = match &request.range_context {
        Some(range) => (range.min, range.max, range.range_name.as_str()),
        None => match select_range(request.word_count) {
            Some(range) => (range.min, range.max, range.name),
            None => (
                request.word_count.saturating_sub(10),
                request.word_count + 10,
                "specified",
            ),
        },
    };
    format!(
        "Please rewrite the following email to match a target of {} words (within the {} range of {}-{} words).\n\n\
         Current Email:\n\
         Subject: {}\n\
         Body: {}\n\n\
         User's Request: {}\n\n\
         Please rewrite this email maintaining its core message while fitting the target word count.",
        request.word_count,
        range_name,
        min,
        max,
        request.current_draft.subject.as_deref().unwrap_or("No subject"),
        request.current_draft.body.as_deref().unwrap_or("No content"),
        request.prompt,
    )
}

/// Handler for `POST /chat/rewrite-draft/stream`.
pub async fn rewrite_draft_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let request: RewriteRequest = parse_body(body)?;
    Ok(stream_response(move |sender| async move {
        sender
            .send(StreamEvent::progress(
                ProgressState::InProgress,
                "Rewriting email draft...",
            ))
            .await
            .map_err(|e| e.to_string())?;

        let options = AgentOptions {
            temperature: request.temperature.or(Some(0.7)),
            max_tokens: request.max_tokens.or(Some(1000)),
            system_prompt: None,
        };
        let output: RewriteOutput = state
            .rewrite_agent
            .generate_json(vec![Message::user(rewrite_prompt(&request))], options)
            .await
            .map_err(|e| e.to_string())?;

        let subject = request
            .current_draft
            .subject
            .clone()
            .unwrap_or_else(|| "Rewritten Email".to_string());
        sender
            .send(StreamEvent::draft_reply(
                Some("Email rewritten".to_string()),
                vec![json!(output.rewritten_draft), json!(subject)],
            ))
            .await
            .map_err(|e| e.to_string())?;
        Ok::<(), String>(())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_types::{ComposeDraft, RangeContext};

    fn request(word_count: u32, range_context: Option<RangeContext>) -> RewriteRequest {
        RewriteRequest {
            prompt: "make it shorter".to_string(),
            word_count,
            current_draft: ComposeDraft {
                subject: Some("Q3 planning".to_string()),
                body: Some("a long body".to_string()),
            },
            range_context,
            temperature: None,
            max_tokens: None,
        }
    }

    #[test]
    fn prompt_uses_supplied_range_context() {
        let prompt = rewrite_prompt(&request(
            30,
            Some(RangeContext {
                min: 25,
                max: 50,
                range_name: "Short".to_string(),
            }),
        ));
        assert!(prompt.contains("a target of 30 words"));
        assert!(prompt.contains("the Short range of 25-50 words"));
        assert!(prompt.contains("Subject: Q3 planning"));
    }

    #[test]
    fn prompt_falls_back_to_bucket_table() {
        let prompt = rewrite_prompt(&request(10, None));
        assert!(prompt.contains("the Brief range of 5-25 words"));
    }

    #[test]
    fn prompt_falls_back_to_plus_minus_ten_outside_the_table() {
        let prompt = rewrite_prompt(&request(2000, None));
        assert!(prompt.contains("the specified range of 1990-2010 words"));
    }

    #[test]
    fn missing_draft_fields_render_placeholders() {
        let mut request = request(50, None);
        request.current_draft = ComposeDraft::default();
        let prompt = rewrite_prompt(&request);
        assert!(prompt.contains("Subject: No subject"));
        assert!(prompt.contains("Body: No content"));
    }
}
