//! Configuration and result types for the planner.
//!
//! Provides [`PlannerConfig`] for controlling session behavior (turn
//! limits, timeouts, retry policy, validation mode) and
//! [`PlanningReport`] for capturing the outcome of one session.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::model::ScheduledActivity;
use crate::validate::{ValidationMode, Violation};

/// Default maximum backend round trips per session.
pub const DEFAULT_MAX_TURNS: u32 = 8;

/// Default overall session timeout in seconds.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 45;

/// Default maximum retry attempts beyond the first.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 2;

/// Default base delay for exponential backoff in milliseconds.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Default maximum delay for exponential backoff in milliseconds.
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 8000;

/// Default backoff multiplier.
pub const DEFAULT_RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default cap on concurrent sessions per planner.
pub const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 4;

/// Lower temperature improves tool-calling judgment.
pub const PLANNING_TEMPERATURE: f64 = 0.2;

/// Retry policy for transient session failures.
///
/// Exponential backoff with jitter. Only retryable errors (transport
/// failures and timeouts) are retried; the whole session is re-run on
/// each attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retry attempts beyond the first (0 = no retries).
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps exponential growth).
    pub max_delay_ms: u64,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            backoff_multiplier: DEFAULT_RETRY_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the base delay in milliseconds.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the maximum delay in milliseconds.
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Calculate the delay before a given retry attempt.
    ///
    /// Formula: `min(base * multiplier^(attempt-1), max_delay)` plus a
    /// random jitter of up to 10% of the delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let base = self.base_delay_ms as f64;
        let exp = self.backoff_multiplier.powi(attempt as i32 - 1);
        let delay = (base * exp).min(self.max_delay_ms as f64);
        let jitter = delay * (rand::random::<f64>() * 0.1);

        Duration::from_millis((delay + jitter) as u64)
    }
}

/// Configuration for the planner.
///
/// Everything is explicit and passed to [`Planner::new`](crate::planner::Planner::new);
/// nothing is read from global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Maximum backend round trips per session before giving up.
    pub max_turns: u32,
    /// Overall deadline for one session attempt, in seconds. A timed-out
    /// attempt counts as a transport failure for the retry path.
    pub session_timeout_secs: u64,
    /// Cap on concurrent sessions; an acquire failure fails fast rather
    /// than queueing against the backend's quota.
    pub max_concurrent_sessions: usize,
    /// Retry policy for transient session failures.
    pub retry: RetryPolicy,
    /// Whether violations fail the session or only drop the offenders.
    pub validation: ValidationMode,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            max_concurrent_sessions: DEFAULT_MAX_CONCURRENT_SESSIONS,
            retry: RetryPolicy::default(),
            validation: ValidationMode::default(),
        }
    }
}

impl PlannerConfig {
    /// Create a planner config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum backend round trips per session.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Set the overall session timeout in seconds.
    pub fn with_session_timeout_secs(mut self, secs: u64) -> Self {
        self.session_timeout_secs = secs;
        self
    }

    /// Set the concurrent-session cap.
    pub fn with_max_concurrent_sessions(mut self, max: usize) -> Self {
        self.max_concurrent_sessions = max;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the validation mode.
    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }
}

/// Where one planning session currently stands.
///
/// `Idle -> InSession -> Completed | Failed`; transitions are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, no backend contact yet.
    Idle,
    /// The backend round trips are in flight.
    InSession,
    /// A validated schedule (possibly empty) was produced.
    Completed,
    /// No schedule could be produced.
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::InSession => write!(f, "in_session"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The successful outcome of one planning session.
///
/// An empty `accepted` list with no violations means the person
/// legitimately needed nothing scheduled; that is distinct from every
/// failure, which surfaces as an error instead.
#[derive(Debug, Clone)]
pub struct PlanningReport {
    /// Unique id of the session that produced this report.
    pub session_id: Uuid,
    /// Activities that passed validation, in backend order.
    pub accepted: Vec<ScheduledActivity>,
    /// Activities dropped in lenient mode, with reasons. Always empty in
    /// strict mode (violations fail the session there).
    pub violations: Vec<Violation>,
    /// How many session attempts were made, including the successful one.
    pub attempts: u32,
}
