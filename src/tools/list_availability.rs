//! The `list_availability` query tool.

use std::sync::Arc;

use crate::context::PlanningContext;
use crate::error::PlanError;

use super::types::{Tool, ToolResult, empty_object_schema};

/// Tool returning the session's availability summary.
///
/// Zero-argument, read-only, idempotent, like [`ListTasksTool`](super::ListTasksTool).
pub struct ListAvailabilityTool {
    context: Arc<PlanningContext>,
}

impl ListAvailabilityTool {
    /// Create the tool over the session's context.
    pub fn new(context: Arc<PlanningContext>) -> Self {
        Self { context }
    }
}

impl Tool for ListAvailabilityTool {
    fn name(&self) -> &str {
        "list_availability"
    }

    fn description(&self) -> &str {
        "List the user's recurring weekly availability windows: day of week, start time, end time."
    }

    fn schema(&self) -> serde_json::Value {
        empty_object_schema()
    }

    fn execute(&self, _args: serde_json::Value) -> Result<ToolResult, PlanError> {
        Ok(ToolResult::success(self.context.availability_summary()))
    }
}
