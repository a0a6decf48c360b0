//! Error types for the tempora engine.
//!
//! Each error variant carries a stable error code (SCREAMING_SNAKE_CASE)
//! that is included in the Display output and accessible via [`PlanError::code()`].
//! Codes are part of the public API contract and will not change.

use crate::validate::Violation;

/// Stable error codes for programmatic error handling.
///
/// These codes never change and form part of the public API contract.
/// Use these for distinguishing errors rather than parsing Display output.
pub mod error_codes {
    /// Malformed Person snapshot (e.g. an inverted availability window).
    pub const INVALID_INPUT: &str = "INVALID_INPUT";

    /// The reasoning backend's final answer did not conform to the schema.
    pub const MALFORMED_OUTPUT: &str = "MALFORMED_OUTPUT";

    /// The reasoning-backend call failed at the network or quota layer.
    pub const TRANSPORT_FAILED: &str = "TRANSPORT_FAILED";

    /// Request or session deadline exceeded.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// Invalid engine configuration or terminal backend rejection.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// Validation rejected the schedule in strict mode.
    pub const CONSTRAINT_VIOLATION: &str = "CONSTRAINT_VIOLATION";

    /// Terminal failure: no schedule could be produced within the retry bound.
    pub const PLANNING_UNAVAILABLE: &str = "PLANNING_UNAVAILABLE";
}

/// Errors produced by the tempora engine.
///
/// Each variant includes a stable error code accessible via [`PlanError::code()`].
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Malformed Person snapshot. Surfaced before any backend call; never retried.
    #[error("[{}] {}", error_codes::INVALID_INPUT, .0)]
    InvalidInput(String),

    /// The backend's final answer could not be parsed into the declared schema.
    ///
    /// Handled in-session by re-prompting with an amended instruction rather
    /// than by blind retry, so [`is_retryable()`](Self::is_retryable) is false.
    #[error("[{}] {}", error_codes::MALFORMED_OUTPUT, .0)]
    MalformedOutput(String),

    /// Network, quota, or server-side failure reaching the backend.
    #[error("[{}] {}", error_codes::TRANSPORT_FAILED, .0)]
    Transport(String),

    /// A request or the whole session exceeded its deadline.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    Timeout(String),

    /// Invalid engine configuration, or a backend rejection that no retry
    /// can fix (bad credentials, unknown model).
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),

    /// One or more scheduled activities violated constraints (strict mode only).
    #[error("[{}] {detail}", error_codes::CONSTRAINT_VIOLATION)]
    ConstraintViolation {
        /// Summary line for Display.
        detail: String,
        /// The individual violations, for diagnostics.
        violations: Vec<Violation>,
    },

    /// Terminal failure after the retry bound was exhausted, or the planner
    /// had no session capacity. A degraded experience must be presented;
    /// a partial or guessed schedule is never returned in its place.
    #[error("[{}] no schedule after {attempts} attempt(s): {detail}", error_codes::PLANNING_UNAVAILABLE)]
    Unavailable {
        /// How many full session attempts were made.
        attempts: u32,
        /// The last underlying failure, as text.
        detail: String,
    },
}

impl PlanError {
    /// Build a [`PlanError::ConstraintViolation`] from a violation list.
    pub fn constraint_violation(violations: Vec<Violation>) -> Self {
        let detail = format!(
            "{} scheduled activit{} violated constraints",
            violations.len(),
            if violations.len() == 1 { "y" } else { "ies" },
        );
        Self::ConstraintViolation { detail, violations }
    }

    /// Returns the stable error code for this error.
    ///
    /// Codes are SCREAMING_SNAKE_CASE strings that remain stable across releases.
    /// Use these for programmatic error handling rather than parsing Display output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => error_codes::INVALID_INPUT,
            Self::MalformedOutput(_) => error_codes::MALFORMED_OUTPUT,
            Self::Transport(_) => error_codes::TRANSPORT_FAILED,
            Self::Timeout(_) => error_codes::TIMEOUT_ERROR,
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::ConstraintViolation { .. } => error_codes::CONSTRAINT_VIOLATION,
            Self::Unavailable { .. } => error_codes::PLANNING_UNAVAILABLE,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(m)
            | Self::MalformedOutput(m)
            | Self::Transport(m)
            | Self::Timeout(m)
            | Self::Config(m) => m,
            Self::ConstraintViolation { detail, .. } => detail,
            Self::Unavailable { detail, .. } => detail,
        }
    }

    /// Returns true if this error represents a transient failure for which
    /// the entire session may be retried with backoff.
    ///
    /// Retryable: transport failures (network errors, rate limits, 5xx) and
    /// timeouts. Everything else either needs an input/config fix, has its
    /// own recovery path (malformed output is re-prompted in-session), or
    /// is already terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

/// Convenience alias for tempora results.
pub type Result<T> = std::result::Result<T, PlanError>;
