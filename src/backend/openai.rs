//! OpenAI-compatible backend adapter.
//!
//! Speaks the Chat Completions API (`/v1/chat/completions`) without
//! streaming: the engine's contract needs only whole turns, so each
//! request sets `stream: false` and parses one JSON response body into a
//! [`BackendTurn`]. Works against any endpoint implementing the same wire
//! shape (OpenAI, Ollama, vLLM, gateways).
//!
//! Request building, response parsing, and HTTP error mapping are plain
//! functions so they can be tested without a server.

use async_trait::async_trait;
use serde_json::Value;

use super::message::{Message, Role};
use super::{BackendTurn, FinishReason, ReasoningBackend, RequestOptions, ToolDefinition, ToolInvocation};
use crate::error::PlanError;

/// Configuration for the OpenAI adapter.
///
/// All of it is explicit: model, credentials, and endpoint are passed in
/// at construction, never read from globals.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for bearer authentication.
    pub api_key: String,
    /// Base URL (defaults to `https://api.openai.com`).
    pub base_url: String,
    /// The model to use.
    pub model: String,
}

impl OpenAiConfig {
    /// Create a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com".into(),
            model: model.into(),
        }
    }

    /// Set a custom base URL (local endpoint, gateway, mock server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Reasoning backend speaking the OpenAI chat-completions wire format.
pub struct OpenAiBackend {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiBackend {
    /// Create a new adapter with its own HTTP client.
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// The configured model id.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ReasoningBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn converse(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &RequestOptions,
    ) -> Result<BackendTurn, PlanError> {
        let body = build_chat_request(&self.config.model, messages, tools, options);

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            tools = tools.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlanError::Timeout(format!("chat completion request timed out: {e}"))
                } else {
                    PlanError::Transport(format!("chat completion request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &text));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PlanError::Transport(format!("response body is not JSON: {e}")))?;

        parse_chat_response(&body)
    }
}

/// Build the JSON request body for one chat-completions call.
pub fn build_chat_request(
    model: &str,
    messages: &[Message],
    tools: &[ToolDefinition],
    options: &RequestOptions,
) -> Value {
    let mut body = serde_json::json!({
        "model": model,
        "messages": messages.iter().map(message_to_wire).collect::<Vec<Value>>(),
        "stream": false,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(max_tokens) = options.max_tokens {
            obj.insert("max_tokens".into(), serde_json::json!(max_tokens));
        }
        if let Some(temperature) = options.temperature {
            obj.insert("temperature".into(), serde_json::json!(temperature));
        }
        if !tools.is_empty() {
            let tools_json: Vec<Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), serde_json::json!(tools_json));
            obj.insert("tool_choice".into(), serde_json::json!("auto"));
        }
        if let Some(schema) = &options.response_schema {
            obj.insert(
                "response_format".into(),
                serde_json::json!({ "type": "json_schema", "json_schema": schema }),
            );
        }
    }

    body
}

/// Convert one message to the chat-completions wire shape.
fn message_to_wire(msg: &Message) -> Value {
    match msg.role {
        Role::Tool => serde_json::json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id.as_deref().unwrap_or_default(),
            "content": msg.content,
        }),
        role => {
            let mut obj = serde_json::json!({
                "role": role.to_string(),
                "content": msg.content,
            });
            if !msg.tool_calls.is_empty()
                && let Some(map) = obj.as_object_mut()
            {
                let calls: Vec<Value> = msg
                    .tool_calls
                    .iter()
                    .map(|tc| {
                        serde_json::json!({
                            "id": tc.call_id,
                            "type": "function",
                            "function": { "name": tc.name, "arguments": tc.arguments },
                        })
                    })
                    .collect();
                map.insert("tool_calls".into(), serde_json::json!(calls));
            }
            obj
        }
    }
}

/// Parse one chat-completions response body into a [`BackendTurn`].
///
/// # Errors
///
/// Returns [`PlanError::Transport`] when the body does not have the
/// expected shape. Schema conformance of the *answer text* is judged
/// later by the session, not here.
pub fn parse_chat_response(body: &Value) -> Result<BackendTurn, PlanError> {
    let message = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| {
            PlanError::Transport("chat completion response has no choices[0].message".to_string())
        })?;

    let text = message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    let tool_calls: Vec<ToolInvocation> = message
        .get("tool_calls")
        .and_then(|tc| tc.as_array())
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let function = call.get("function")?;
                    Some(ToolInvocation {
                        call_id: call.get("id").and_then(|v| v.as_str())?.to_string(),
                        name: function.get("name").and_then(|v| v.as_str())?.to_string(),
                        arguments: function
                            .get("arguments")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let finish = match body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("finish_reason"))
        .and_then(|f| f.as_str())
    {
        Some("stop") => FinishReason::Stop,
        Some("tool_calls") => FinishReason::ToolCalls,
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ if !tool_calls.is_empty() => FinishReason::ToolCalls,
        _ => FinishReason::Other,
    };

    Ok(BackendTurn {
        text,
        tool_calls,
        finish,
    })
}

/// Map a non-success HTTP status to a [`PlanError`].
///
/// Authentication and request-shape rejections are configuration
/// problems that no retry can fix; rate limits and server errors are
/// transient transport failures.
pub fn map_http_error(status: reqwest::StatusCode, body: &str) -> PlanError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.chars().take(200).collect()
            }
        });

    match status.as_u16() {
        400 | 401 | 403 | 404 => PlanError::Config(format!("backend rejected request: {detail}")),
        408 => PlanError::Timeout(format!("backend request timed out: {detail}")),
        429 => PlanError::Transport(format!("backend rate limited: {detail}")),
        _ => PlanError::Transport(format!("backend error ({status}): {detail}")),
    }
}
