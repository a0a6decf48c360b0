//! Core tool types.
//!
//! Defines the [`Tool`] trait the session's query tools implement and
//! [`ToolResult`] for capturing their output.

use crate::error::PlanError;

/// Result of a tool execution.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Whether the tool execution succeeded.
    pub success: bool,
    /// Output content fed back to the backend.
    pub content: String,
    /// Error message if the tool execution failed.
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(content: String) -> Self {
        Self {
            success: true,
            content,
            error: None,
        }
    }

    /// Create a failed tool result with an error message.
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            content: String::new(),
            error: Some(error),
        }
    }

    /// The text handed back to the backend as the tool's answer.
    pub fn reply_text(&self) -> String {
        if self.success {
            self.content.clone()
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("tool execution failed")
            )
        }
    }
}

/// Trait for session query tools.
///
/// All tools must be `Send + Sync`. The engine's tools are pure
/// projections over an immutable snapshot, so execution is synchronous
/// and needs no timeout machinery.
pub trait Tool: Send + Sync {
    /// Returns the tool name (e.g. `"list_tasks"`).
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's arguments.
    fn schema(&self) -> serde_json::Value;

    /// Execute the tool with the given JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] only for failures that should abort the
    /// session; recoverable problems belong in a failed [`ToolResult`]
    /// the backend can read and react to.
    fn execute(&self, args: serde_json::Value) -> Result<ToolResult, PlanError>;
}

/// Argument schema shared by the zero-argument query tools.
pub(crate) fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_success() {
        let result = ToolResult::success("Available on Mondays from 09:00 to 17:00".to_string());
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.reply_text(), result.content);
    }

    #[test]
    fn tool_result_failure() {
        let result = ToolResult::failure("snapshot unavailable".to_string());
        assert!(!result.success);
        assert!(result.content.is_empty());
        assert_eq!(result.reply_text(), "Error: snapshot unavailable");
    }

    #[test]
    fn empty_object_schema_shape() {
        let schema = empty_object_schema();
        assert_eq!(schema["type"], "object");
        assert!(
            schema["properties"]
                .as_object()
                .is_some_and(|p| p.is_empty())
        );
    }

    struct DummyTool;

    impl Tool for DummyTool {
        fn name(&self) -> &str {
            "dummy"
        }
        fn description(&self) -> &str {
            "A dummy tool for testing"
        }
        fn schema(&self) -> serde_json::Value {
            empty_object_schema()
        }
        fn execute(&self, _args: serde_json::Value) -> Result<ToolResult, PlanError> {
            Ok(ToolResult::success("dummy output".to_string()))
        }
    }

    #[test]
    fn tool_trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DummyTool>();
    }

    #[test]
    fn dummy_tool_executes() {
        let result = DummyTool
            .execute(serde_json::json!({}))
            .expect("dummy tool succeeds");
        assert!(result.success);
        assert_eq!(result.content, "dummy output");
    }
}
