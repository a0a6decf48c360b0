//! Tempora: task scheduling recommendation engine.
//!
//! Assigns a user's pending tasks, each with a due date and priority, to
//! free slots drawn from a weekly recurring availability calendar. The
//! assignment decision is delegated to a natural-language reasoning
//! backend through a constrained tool-calling protocol; every activity
//! the backend returns is independently re-checked before it reaches the
//! caller.
//!
//! # Submodules
//!
//! - [`model`]: immutable domain types (Task, AvailabilityWindow, Person,
//!   ScheduledActivity)
//! - [`context`]: projection of one Person into the query tools' views
//! - [`tools`]: the closed set of query tools a backend may invoke
//! - [`contract`]: the fixed system contract and the final-answer schema
//! - [`backend`]: the pluggable reasoning-backend boundary and the
//!   OpenAI-compatible adapter
//! - [`planner`]: the session orchestrator (retries, timeouts, tool
//!   dispatch)
//! - [`validate`]: post-hoc constraint checking with strict/lenient modes
//! - [`config`]: TOML configuration for embedding applications
//! - [`error`]: error types with stable error codes
//!
//! # Data Flow
//!
//! ```text
//! Person -> PlanningContext -> Planner (tool calls against the context)
//!        -> raw activities -> validate -> PlanningReport | PlanError
//! ```
//!
//! # Error Codes
//!
//! All errors carry a stable code (e.g. `INVALID_INPUT`,
//! `PLANNING_UNAVAILABLE`) that is safe to match on programmatically.

pub mod backend;
pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod model;
pub mod planner;
pub mod tools;
pub mod validate;

pub use backend::openai::{OpenAiBackend, OpenAiConfig};
pub use backend::{
    BackendTurn, FinishReason, Message, ReasoningBackend, RequestOptions, Role, ToolDefinition,
    ToolInvocation,
};
pub use config::{
    EngineConfig, default_config, parse_config, planner_from_config, read_config, validate_config,
};
pub use context::PlanningContext;
pub use error::{PlanError, Result};
pub use model::{AvailabilityWindow, DayOfWeek, Person, Priority, ScheduledActivity, Task};
pub use planner::{Planner, PlannerConfig, PlanningReport, RetryPolicy, SessionState};
pub use tools::{ListAvailabilityTool, ListTasksTool, Tool, ToolRegistry, ToolResult};
pub use validate::{ValidationMode, ValidationReport, Violation, ViolationReason, validate};
