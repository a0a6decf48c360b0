//! The fixed contract binding the reasoning backend.
//!
//! One planning session hands the backend three things: the system
//! contract below, a user prompt carrying the current timestamp, and the
//! two query tools. The session must terminate with a final answer
//! conforming to the [`RecommendationSet`] schema; everything here exists
//! to state that contract, declare its schema, and parse (or reject) what
//! comes back.
//!
//! The four scheduling rules are advisory to the backend: it is asked to
//! honor them, but nothing here assumes it did. Mechanical enforcement is
//! the validator's job.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use crate::error::PlanError;
use crate::model::ScheduledActivity;

/// The fixed system instruction for every planning session.
///
/// Not negotiable per call; the only per-session variation is the user
/// prompt carrying "now".
pub const SYSTEM_CONTRACT: &str = "You are an agent tasked with scheduling a user's tasks based on \
their due dates, priorities, and the user's available time slots. Use the list_tasks and \
list_availability tools to inspect the user's tasks and weekly availability, then assign each \
pending task a concrete start and end time. IMPORTANT: 1. ALL TASKS MUST BE COMPLETED BEFORE \
THEIR RESPECTIVE DUE DATES. 2. USE ONLY THE TIME SLOTS PROVIDED IN THE USER'S AVAILABILITIES. \
3. ENSURE THAT THE SCHEDULED START TIME OF AN ACTIVITY IS BEFORE ITS END TIME. 4. PRIORITIZE \
TASKS THAT ARE OVERDUE BEFORE OTHERS. When you have decided, reply with only a JSON object of \
the form {\"recs\": [{\"start_time\": \"2025-03-04T09:00:00\", \"end_time\": \
\"2025-03-04T09:30:00\", \"title\": \"Complete the email task\"}]} and no other text. Examples \
of good titles: \"Complete the email task\", \"Study for the history exam\", \"Work on the HW \
assignment\".";

/// The per-session user prompt grounding the backend in the current time.
pub fn user_prompt(now: NaiveDateTime) -> String {
    format!("The time is {}.", now.format("%Y-%m-%d %H:%M:%S"))
}

/// One raw recommendation as the backend emits it: times still strings.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecommendation {
    /// Start timestamp, RFC 3339 or `YYYY-MM-DD[ T]HH:MM[:SS]`.
    pub start_time: String,
    /// End timestamp, same formats.
    pub end_time: String,
    /// Short description naming the task.
    pub title: String,
}

/// The backend's structured final answer.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationSet {
    /// The recommended activities, in the backend's chosen order.
    pub recs: Vec<RawRecommendation>,
}

/// JSON Schema for the final answer, in the shape the chat-completions
/// `response_format` field expects under `json_schema`.
pub fn output_schema() -> serde_json::Value {
    serde_json::json!({
        "name": "recommendation_set",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "recs": {
                    "type": "array",
                    "description": "A list of recommendations for what the user should be completing at what time.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "start_time": { "type": "string" },
                            "end_time": { "type": "string" },
                            "title": { "type": "string" }
                        },
                        "required": ["start_time", "end_time", "title"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["recs"],
            "additionalProperties": false
        }
    })
}

/// Parse the backend's final text answer into scheduled activities.
///
/// Accepts the canonical `{"recs": [...]}` object, tolerates a bare JSON
/// array of recommendations, and unwraps a Markdown code fence first if
/// the backend added one.
///
/// # Errors
///
/// Returns [`PlanError::MalformedOutput`] when the text is not valid JSON
/// in either shape, or when a timestamp cannot be parsed. The session
/// re-prompts with [`amended_instruction`] on this error.
pub fn parse_final_answer(text: &str) -> Result<Vec<ScheduledActivity>, PlanError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(PlanError::MalformedOutput(
            "final answer is empty".to_string(),
        ));
    }

    let raw: Vec<RawRecommendation> = match serde_json::from_str::<RecommendationSet>(body) {
        Ok(set) => set.recs,
        Err(object_err) => serde_json::from_str::<Vec<RawRecommendation>>(body).map_err(|_| {
            PlanError::MalformedOutput(format!(
                "final answer is not a recommendation list: {object_err}"
            ))
        })?,
    };

    raw.into_iter()
        .map(|rec| {
            let start = parse_timestamp(&rec.start_time)?;
            let end = parse_timestamp(&rec.end_time)?;
            Ok(ScheduledActivity::new(start, end, rec.title))
        })
        .collect()
}

/// The re-prompt sent after a schema violation, quoting the failure.
pub fn amended_instruction(error: &PlanError) -> String {
    format!(
        "Your previous reply could not be used: {}. Reply again with ONLY a JSON object of the \
         form {{\"recs\": [{{\"start_time\": \"2025-03-04T09:00:00\", \"end_time\": \
         \"2025-03-04T09:30:00\", \"title\": \"...\"}}]}} and no other text.",
        error.message()
    )
}

/// Accepted timestamp shapes, tried in order after RFC 3339.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse one backend-produced timestamp into a naive local datetime.
fn parse_timestamp(s: &str) -> Result<NaiveDateTime, PlanError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    Err(PlanError::MalformedOutput(format!(
        "unparseable timestamp: {s:?}"
    )))
}

/// Strip a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}
