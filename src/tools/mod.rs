//! The query tools a reasoning backend may invoke during a session.
//!
//! The tool surface is a small closed set, statically declared: the two
//! read-only queries [`ListTasksTool`] and [`ListAvailabilityTool`], both
//! zero-argument, idempotent, and free of side effects. The backend may
//! invoke each zero, one, or many times before emitting its final answer.

pub mod list_availability;
pub mod list_tasks;
pub mod registry;
pub mod types;

pub use list_availability::ListAvailabilityTool;
pub use list_tasks::ListTasksTool;
pub use registry::ToolRegistry;
pub use types::{Tool, ToolResult};

use std::sync::Arc;

use crate::context::PlanningContext;

/// Build the registry for one planning session over a shared context.
pub fn session_registry(context: Arc<PlanningContext>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ListTasksTool::new(Arc::clone(&context))));
    registry.register(Arc::new(ListAvailabilityTool::new(context)));
    registry
}
