//! The two built-in agents: the email composer and the rewriter.
//!
//! The composer's tools are canned: the calendar and directory lookups
//! return fixture data after a configurable delay, and write-email
//! echoes the drafted text back. The delay exists so streamed
//! tool-call / tool-result pairs are visibly spaced out in a UI; tests
//! pass [`Duration::ZERO`].

use crate::agent::Agent;
use crate::model::Model;
use crate::tool::{Tool, ToolError, ToolPalette};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub const CHECK_CALENDAR_TOOL: &str = "check-calendar";
pub const SEARCH_PERSON_TOOL: &str = "search-person";
pub const WRITE_EMAIL_TOOL: &str = "write-email";

const EMAIL_INSTRUCTIONS: &str = r#"<role>
You are an email assistant. Your job is to write emails that are contextually aware of calendar timings and appropriately styled for the recipient.
</role>

<tools>
You have three tools available and MUST use them in order:
1) check-calendar - fetch available times (id: "check-calendar").
2) search-person - fetch a brief recipient profile (id: "search-person").
3) write-email - after drafting the email text locally, call this tool with the drafted email to finalize it for the UI (id: "write-email").
</tools>

<streaming_protocol>
Before EACH tool call, state one short planning sentence (one line) explaining the next step, then call the tool. This ensures the stream contains:
1) a short planning line (as plain text),
2) a tool-call event,
3) a tool-result event.
Sequence to follow:
  a) "Let me check your available times first..." -> call check-calendar -> receive result.
  b) "Let me check who we are talking to..." -> call search-person -> receive result.
  c) "Now let me draft the email..." -> draft the full email (subject + body). Do not output the email text to the user.
  d) Call write-email with the drafted email so the UI can insert it into the compose box.
</streaming_protocol>

<email_composition>
When drafting the final email:
- Keep it concise and professional.
- Reflect the recipient's style from the profile (e.g., concise bullets, clear action items).
- Propose 2-3 concrete time options derived from the available times.
- Ask for confirmation or propose an alternative if none of the times work.
- Include a clear subject line and a short, well-structured body.
</email_composition>

<final_output>
Do NOT output or reveal the actual email body to the user. After calling write-email, provide a brief summary of what you did and how you used the information from the tools. Then include a follow-up question offering to help with anything else.
</final_output>

<notes>
You must ALWAYS call all three tools (in order) every single time you execute. Always write a response even if you think you don't need to.
</notes>"#;

const REWRITE_INSTRUCTIONS: &str = r#"<role>
You are an expert email rewriting assistant. Your job is to rewrite emails to match specific word count ranges while preserving the original meaning, tone, and key information.
</role>

<task>
When given an email draft and a target word count range, you must:
1. Analyze the current email's content, tone, and purpose
2. Rewrite the email to fit within the specified word count range
3. Maintain the professional tone and key message
4. Preserve important details like recipient information, dates, and action items
5. Adjust the level of detail appropriately for the target length
</task>

<word_count_guidelines>
- Brief (5-25 words): Ultra-concise, bullet points, essential info only
- Short (25-50 words): Concise but complete, minimal pleasantries
- Medium (50-100 words): Balanced length, appropriate context and politeness
- Long (100-200 words): Detailed, full context, proper business formatting
- Article (200-500 words): Comprehensive, detailed explanations
- Essay (500-1000 words): Very detailed, extensive context and reasoning
</word_count_guidelines>

<output_format>
You must respond with a JSON object containing:
{
  "rewrittenDraft": "Rewritten email draft"
}
</output_format>

<important_notes>
- Always count words accurately
- Maintain the core message and intent
- Adjust formality level based on length (shorter = more direct, longer = more formal)
- Preserve any specific names, dates, or critical details
- If the original email is already within the target range, make minimal changes
</important_notes>"#;

/// Structured answer the rewrite agent is instructed to produce.
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteOutput {
    #[serde(rename = "rewrittenDraft")]
    pub rewritten_draft: String,
}

/// Calendar lookup. Fixture slots stand in for a calendar provider.
struct CheckCalendar {
    latency: Duration,
}

#[async_trait]
impl Tool for CheckCalendar {
    fn name(&self) -> &str {
        CHECK_CALENDAR_TOOL
    }

    fn description(&self) -> &str {
        "Check the user's calendar and return available time slots for scheduling meetings"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        sleep(self.latency).await;
        Ok(json!({
            "availableTimes": [
                "2025-08-18T09:00:00Z",
                "2025-08-18T11:00:00Z",
                "2025-08-18T14:30:00Z",
                "2025-08-19T10:00:00Z",
                "2025-08-19T16:00:00Z",
            ]
        }))
    }
}

/// Directory lookup. Returns a fixture communication profile.
struct SearchPerson {
    latency: Duration,
}

#[async_trait]
impl Tool for SearchPerson {
    fn name(&self) -> &str {
        SEARCH_PERSON_TOOL
    }

    fn description(&self) -> &str {
        "Search internal directory/CRM for a person and return a brief communication profile useful for email replies"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Name or email of the person to look up"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        sleep(self.latency).await;
        Ok(json!({
            "name": "Avery Chen",
            "role": "VP of Product (boss)",
            "emailStyleSummary":
                "Prefers concise bullets, clear action items, and calendar links. Appreciates context but dislikes fluff.",
            "notes": [
                "Responds quickly before 10am local time",
                "Prefers weekday mornings for meetings",
            ]
        }))
    }
}

/// Echoes the drafted email back. Its result is what the relay turns
/// into the draft-insertion action for the UI.
struct WriteEmail {
    latency: Duration,
}

#[async_trait]
impl Tool for WriteEmail {
    fn name(&self) -> &str {
        WRITE_EMAIL_TOOL
    }

    fn description(&self) -> &str {
        "Finalize a drafted email and return it for frontend handling"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "email": {
                    "type": "string",
                    "description": "The fully drafted email content (subject + body)"
                }
            },
            "required": ["email"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        sleep(self.latency).await;
        let email = args
            .get("email")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgs("missing 'email' string".to_string()))?;
        Ok(json!({"email": email}))
    }
}

/// The email composer: three tools in mandated order, order-enforced.
pub fn email_agent(model: Arc<dyn Model>, tool_latency: Duration) -> Agent {
    let palette = ToolPalette::new(vec![
        Arc::new(CheckCalendar { latency: tool_latency }),
        Arc::new(SearchPerson { latency: tool_latency }),
        Arc::new(WriteEmail { latency: tool_latency }),
    ]);
    Agent::new("email-agent", EMAIL_INSTRUCTIONS, model, palette).with_order_enforcement()
}

/// The rewriter: no tools, answers with a JSON object.
pub fn rewrite_agent(model: Arc<dyn Model>) -> Agent {
    Agent::new("rewrite-agent", REWRITE_INSTRUCTIONS, model, ToolPalette::default())
}
