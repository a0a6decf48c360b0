//! Tool registry for one planning session.
//!
//! Holds the session's declared tools, provides lookup by name, and
//! exports [`ToolDefinition`]s for the backend request. The set is closed
//! at session start; nothing registers tools at runtime after that.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::ToolDefinition;

use super::types::Tool;

/// Registry of the tools declared to the backend for one session.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Names of all registered tools, sorted.
    pub fn list_available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.values().map(|t| t.name()).collect();
        names.sort_unstable();
        names
    }

    /// Export tool definitions for the backend request, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.schema()))
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::tools::types::{ToolResult, empty_object_schema};

    struct NamedTool {
        tool_name: &'static str,
    }

    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.tool_name
        }
        fn description(&self) -> &str {
            "test tool"
        }
        fn schema(&self) -> serde_json::Value {
            empty_object_schema()
        }
        fn execute(&self, _args: serde_json::Value) -> Result<ToolResult, PlanError> {
            Ok(ToolResult::success("ok".to_string()))
        }
    }

    fn make_registry() -> ToolRegistry {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(NamedTool { tool_name: "beta" }));
        reg.register(Arc::new(NamedTool { tool_name: "alpha" }));
        reg
    }

    #[test]
    fn register_and_get_tool() {
        let reg = make_registry();
        let tool = reg.get("alpha");
        assert!(tool.is_some());
    }

    #[test]
    fn get_nonexistent_tool_returns_none() {
        let reg = make_registry();
        assert!(reg.get("nonexistent").is_none());
    }

    #[test]
    fn list_available_is_sorted() {
        let reg = make_registry();
        assert_eq!(reg.list_available(), vec!["alpha", "beta"]);
    }

    #[test]
    fn definitions_are_sorted_and_complete() {
        let reg = make_registry();
        let defs = reg.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "alpha");
        assert_eq!(defs[1].name, "beta");
        for def in &defs {
            assert!(!def.description.is_empty());
            assert!(def.parameters.is_object());
        }
    }

    #[test]
    fn register_replaces_same_name() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(NamedTool { tool_name: "alpha" }));
        reg.register(Arc::new(NamedTool { tool_name: "alpha" }));
        assert_eq!(reg.list_available().len(), 1);
    }
}
