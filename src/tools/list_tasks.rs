//! The `list_tasks` query tool.

use std::sync::Arc;

use crate::context::PlanningContext;
use crate::error::PlanError;

use super::types::{Tool, ToolResult, empty_object_schema};

/// Tool returning the session's task summary.
///
/// Zero-argument, read-only, idempotent: every invocation within one
/// session sees the same snapshot and returns the same text.
pub struct ListTasksTool {
    context: Arc<PlanningContext>,
}

impl ListTasksTool {
    /// Create the tool over the session's context.
    pub fn new(context: Arc<PlanningContext>) -> Self {
        Self { context }
    }
}

impl Tool for ListTasksTool {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn description(&self) -> &str {
        "List the user's tasks with their due dates, priorities, and completion state."
    }

    fn schema(&self) -> serde_json::Value {
        empty_object_schema()
    }

    fn execute(&self, _args: serde_json::Value) -> Result<ToolResult, PlanError> {
        Ok(ToolResult::success(self.context.task_summary()))
    }
}
