//! Planning session orchestration.
//!
//! [`Planner`] drives one reasoning session per call: it supplies the
//! system contract, injects the current timestamp, dispatches tool calls,
//! collects the structured result, and validates it. [`types`] holds the
//! configuration (turn limits, timeouts, retry policy) and report types.

pub mod session;
pub mod types;

pub use session::Planner;
pub use types::{PlannerConfig, PlanningReport, RetryPolicy, SessionState};
