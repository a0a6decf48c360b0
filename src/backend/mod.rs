//! Reasoning-backend boundary.
//!
//! The engine is agnostic to which completion service does the planning;
//! anything satisfying [`ReasoningBackend`] will do, provided it can
//! receive a fixed system instruction, a contextual prompt, invoke the
//! declared query tools by name, and return output constrained to the
//! declared schema.
//!
//! The contract is non-streaming: one [`converse`](ReasoningBackend::converse)
//! call is one full backend round trip, returning either a final text
//! answer or a batch of tool invocation requests as a [`BackendTurn`].
//!
//! # Submodules
//!
//! - [`message`]: conversation message types
//! - [`openai`]: concrete adapter for OpenAI-compatible chat APIs

pub mod message;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
pub use message::{Message, Role};

/// A tool definition handed to the backend for function calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name (e.g. `"list_tasks"`).
    pub name: String,
    /// Human-readable description of the tool's purpose.
    pub description: String,
    /// JSON Schema describing the tool's parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// One tool invocation requested by the backend.
///
/// The same type is echoed back on the assistant message that carried the
/// request, keeping the conversation transcript well-formed for the next
/// round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Unique identifier correlating the invocation with its result.
    pub call_id: String,
    /// Which tool to invoke.
    pub name: String,
    /// JSON-encoded arguments string (may be empty for zero-argument tools).
    pub arguments: String,
}

/// Why the backend stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop: the turn text is the final answer.
    Stop,
    /// The backend wants one or more tools invoked first.
    ToolCalls,
    /// Hit the max token limit.
    Length,
    /// Content was filtered by safety systems.
    ContentFilter,
    /// Provider-specific or unknown reason.
    Other,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::ToolCalls => write!(f, "tool_calls"),
            Self::Length => write!(f, "length"),
            Self::ContentFilter => write!(f, "content_filter"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// The outcome of one backend round trip.
#[derive(Debug, Clone)]
pub struct BackendTurn {
    /// Text output, empty when the turn only requests tools.
    pub text: String,
    /// Tool invocations requested this turn, in request order.
    pub tool_calls: Vec<ToolInvocation>,
    /// Why the backend stopped.
    pub finish: FinishReason,
}

impl BackendTurn {
    /// A plain text turn.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
            finish: FinishReason::Stop,
        }
    }

    /// A turn requesting tool invocations.
    pub fn tool_requests(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            text: String::new(),
            tool_calls,
            finish: FinishReason::ToolCalls,
        }
    }

    /// Whether the session should dispatch tools before continuing.
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Options controlling one backend request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Maximum tokens to generate. `None` means provider default.
    pub max_tokens: Option<usize>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Schema the final answer must conform to, in the chat-completions
    /// `response_format.json_schema` shape. `None` disables constrained output.
    pub response_schema: Option<serde_json::Value>,
}

impl RequestOptions {
    /// Create request options with provider defaults everywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Constrain the final answer to a declared schema.
    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Trait for reasoning-backend adapters.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Returns the backend name (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Perform one full round trip: send the conversation and the tool
    /// declarations, return the backend's next turn.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Transport`] or [`PlanError::Timeout`] for
    /// transient failures the session may retry, and [`PlanError::Config`]
    /// for terminal rejections (bad credentials, unknown model).
    async fn converse(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &RequestOptions,
    ) -> Result<BackendTurn, PlanError>;
}
