//! The planning session driver.
//!
//! [`Planner::plan_for`] runs one session for one Person: it validates
//! the snapshot, grounds the backend in the current time, dispatches the
//! backend's tool calls sequentially, parses the structured final answer,
//! and re-checks the result before returning it. The caller blocks for
//! the duration; the only suspension point is the backend round trip.
//!
//! A session moves `Idle -> InSession -> Completed | Failed`. Transport
//! failures and timeouts re-run the whole session with backoff up to the
//! retry bound; a final answer that fails the schema is re-prompted
//! in-session with an amended instruction, bounded likewise. When every
//! path is exhausted the caller gets `PLANNING_UNAVAILABLE`, never a
//! partial or guessed schedule.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::types::{PLANNING_TEMPERATURE, PlannerConfig, PlanningReport, SessionState};
use crate::backend::{Message, ReasoningBackend, RequestOptions, ToolDefinition, ToolInvocation};
use crate::context::PlanningContext;
use crate::contract::{SYSTEM_CONTRACT, amended_instruction, output_schema, parse_final_answer, user_prompt};
use crate::error::PlanError;
use crate::model::{Person, ScheduledActivity};
use crate::tools::{ToolRegistry, session_registry};
use crate::validate::{ValidationMode, validate};

/// The planning session orchestrator.
///
/// One `Planner` serves many Persons; each [`plan_for`](Self::plan_for)
/// call is an isolated single-flight session over its own immutable
/// snapshot, so sessions for different Persons may run fully in parallel.
/// The backend's quota is the only shared resource, and the concurrency
/// cap guards it: a session that cannot acquire capacity fails fast
/// instead of queueing.
pub struct Planner {
    backend: Arc<dyn ReasoningBackend>,
    config: PlannerConfig,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl Planner {
    /// Create a planner over a reasoning backend.
    ///
    /// All configuration is explicit; nothing is read from globals.
    pub fn new(backend: Arc<dyn ReasoningBackend>, config: PlannerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_sessions));
        Self {
            backend,
            config,
            permits,
            cancel: CancellationToken::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Cancel all outstanding sessions.
    ///
    /// Sessions stop at the next check point and surface as
    /// `PLANNING_UNAVAILABLE`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns the cancellation token for external cancellation control.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Plan for one Person against the current wall clock.
    ///
    /// # Errors
    ///
    /// See [`plan_for_at`](Self::plan_for_at).
    pub async fn plan_for(&self, person: &Person) -> Result<PlanningReport, PlanError> {
        self.plan_for_at(person, Local::now().naive_local()).await
    }

    /// Plan for one Person against an explicit "now".
    ///
    /// The timestamp grounds the backend's reasoning (overdue detection)
    /// and the validator's deadline checks; taking it as a parameter
    /// keeps sessions reproducible under test.
    ///
    /// # Errors
    ///
    /// - [`PlanError::InvalidInput`]: malformed snapshot, raised before
    ///   any backend contact
    /// - [`PlanError::Config`]: terminal backend rejection
    /// - [`PlanError::ConstraintViolation`]: strict mode and the
    ///   validator found violations
    /// - [`PlanError::Unavailable`]: retry bound exhausted, no session
    ///   capacity, or cancellation
    pub async fn plan_for_at(
        &self,
        person: &Person,
        now: NaiveDateTime,
    ) -> Result<PlanningReport, PlanError> {
        let session_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "plan_session",
            session_id = %session_id,
            user = %person.username,
        );

        async move {
            tracing::debug!(state = %SessionState::Idle, "session created");

            // Reject corrupt data before any backend call.
            let context = Arc::new(PlanningContext::new(person)?);

            // Nothing pending: a legitimately empty schedule, no backend
            // round trip needed.
            if person.pending_tasks().next().is_none() {
                tracing::info!(state = %SessionState::Completed, "no pending tasks");
                return Ok(PlanningReport {
                    session_id,
                    accepted: Vec::new(),
                    violations: Vec::new(),
                    attempts: 0,
                });
            }

            let Ok(_permit) = self.permits.try_acquire() else {
                tracing::warn!(state = %SessionState::Failed, "no session capacity");
                return Err(PlanError::Unavailable {
                    attempts: 0,
                    detail: "planner session capacity exhausted".to_string(),
                });
            };

            let registry = session_registry(context);
            let tool_definitions = registry.definitions();
            tracing::debug!(state = %SessionState::InSession, tools = tool_definitions.len(), "session started");

            let activities = self.run_with_retries(&registry, &tool_definitions, now).await;
            let (activities, attempts) = match activities {
                Ok(pair) => pair,
                Err(error) => {
                    tracing::warn!(state = %SessionState::Failed, code = error.code(), "session failed");
                    return Err(error);
                }
            };

            let report = validate(&activities, &person.tasks, &person.availabilities, now);
            if self.config.validation == ValidationMode::Strict && !report.is_clean() {
                tracing::warn!(
                    state = %SessionState::Failed,
                    violations = report.violations.len(),
                    "strict validation rejected the schedule"
                );
                return Err(PlanError::constraint_violation(report.violations));
            }

            tracing::info!(
                state = %SessionState::Completed,
                accepted = report.accepted.len(),
                violations = report.violations.len(),
                attempts,
                "session completed"
            );
            Ok(PlanningReport {
                session_id,
                accepted: report.accepted,
                violations: report.violations,
                attempts,
            })
        }
        .instrument(span)
        .await
    }

    /// Run the session, re-running it on transient failure up to the
    /// retry bound. Returns the raw activities and the attempt count.
    async fn run_with_retries(
        &self,
        registry: &ToolRegistry,
        tool_definitions: &[ToolDefinition],
        now: NaiveDateTime,
    ) -> Result<(Vec<ScheduledActivity>, u32), PlanError> {
        let timeout = tokio::time::Duration::from_secs(self.config.session_timeout_secs);
        let mut last_error: Option<PlanError> = None;

        for attempt in 0..=self.config.retry.max_attempts {
            if attempt > 0 {
                let delay = self.config.retry.delay_for_attempt(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying session");
                tokio::time::sleep(delay).await;
            }

            if self.cancel.is_cancelled() {
                return Err(PlanError::Unavailable {
                    attempts: attempt,
                    detail: "session cancelled".to_string(),
                });
            }

            let outcome =
                tokio::time::timeout(timeout, self.run_session(registry, tool_definitions, now))
                    .await;

            match outcome {
                Ok(Ok(activities)) => return Ok((activities, attempt + 1)),
                Ok(Err(error)) => match error {
                    error @ (PlanError::InvalidInput(_) | PlanError::Config(_)) => {
                        return Err(error);
                    }
                    PlanError::MalformedOutput(detail) => {
                        // The in-session amended retries are the bound for
                        // schema violations; do not re-run the session.
                        return Err(PlanError::Unavailable {
                            attempts: attempt + 1,
                            detail,
                        });
                    }
                    error if error.is_retryable() => {
                        tracing::warn!(attempt, code = error.code(), "session attempt failed");
                        last_error = Some(error);
                    }
                    error => return Err(error),
                },
                Err(_elapsed) => {
                    let error = PlanError::Timeout(format!(
                        "session timed out after {}s",
                        self.config.session_timeout_secs
                    ));
                    tracing::warn!(attempt, "session attempt timed out");
                    last_error = Some(error);
                }
            }
        }

        Err(PlanError::Unavailable {
            attempts: self.config.retry.max_attempts + 1,
            detail: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt recorded".to_string()),
        })
    }

    /// One full session: converse until the backend emits a final answer
    /// that parses, dispatching tool calls along the way.
    async fn run_session(
        &self,
        registry: &ToolRegistry,
        tool_definitions: &[ToolDefinition],
        now: NaiveDateTime,
    ) -> Result<Vec<ScheduledActivity>, PlanError> {
        let mut messages = vec![
            Message::system(SYSTEM_CONTRACT),
            Message::user(user_prompt(now)),
        ];
        let options = RequestOptions::new()
            .with_temperature(PLANNING_TEMPERATURE)
            .with_response_schema(output_schema());
        let mut schema_retries = 0u32;

        for turn_number in 1..=self.config.max_turns {
            if self.cancel.is_cancelled() {
                return Err(PlanError::Transport("session cancelled".to_string()));
            }

            let turn = self
                .backend
                .converse(&messages, tool_definitions, &options)
                .await?;

            if turn.wants_tools() {
                tracing::debug!(
                    turn_number,
                    requested = turn.tool_calls.len(),
                    "dispatching tool calls"
                );
                messages.push(Message::assistant_with_tool_calls(
                    (!turn.text.is_empty()).then(|| turn.text.clone()),
                    turn.tool_calls.clone(),
                ));
                // The protocol is sequential: each result is appended in
                // request order before the next round trip.
                for call in &turn.tool_calls {
                    let reply = self.dispatch_tool(registry, call);
                    messages.push(Message::tool_result(&call.call_id, reply));
                }
                continue;
            }

            match parse_final_answer(&turn.text) {
                Ok(activities) => {
                    tracing::debug!(turn_number, count = activities.len(), "final answer parsed");
                    return Ok(activities);
                }
                Err(error) => {
                    schema_retries += 1;
                    if schema_retries > self.config.retry.max_attempts {
                        return Err(error);
                    }
                    tracing::warn!(
                        turn_number,
                        schema_retries,
                        "final answer failed the schema; re-prompting"
                    );
                    messages.push(Message::assistant(turn.text));
                    messages.push(Message::user(amended_instruction(&error)));
                }
            }
        }

        Err(PlanError::MalformedOutput(format!(
            "backend produced no final answer within {} turns",
            self.config.max_turns
        )))
    }

    /// Execute one tool invocation and render its reply text.
    ///
    /// Problems become error text the backend can read and recover from;
    /// only the tool itself aborting escalates, and the session's tools
    /// never do.
    fn dispatch_tool(&self, registry: &ToolRegistry, call: &ToolInvocation) -> String {
        let Some(tool) = registry.get(&call.name) else {
            tracing::warn!(tool = %call.name, "backend requested unknown tool");
            return format!("Error: unknown tool {:?}", call.name);
        };

        let args = if call.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.arguments).unwrap_or_else(|_| serde_json::json!({}))
        };

        tracing::debug!(tool = %call.name, "executing tool");
        match tool.execute(args) {
            Ok(result) => result.reply_text(),
            Err(error) => format!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendTurn;
    use crate::model::{AvailabilityWindow, DayOfWeek, Task};
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend that must never be contacted.
    struct UnreachableBackend {
        calls: AtomicU32,
    }

    impl UnreachableBackend {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ReasoningBackend for UnreachableBackend {
        fn name(&self) -> &str {
            "unreachable"
        }

        async fn converse(
            &self,
            _messages: &[Message],
            _tools: &[ToolDefinition],
            _options: &RequestOptions,
        ) -> Result<BackendTurn, PlanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(BackendTurn::text("{\"recs\": []}"))
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 4)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .expect("valid datetime")
    }

    #[tokio::test]
    async fn zero_pending_tasks_skips_backend() {
        let backend = Arc::new(UnreachableBackend::new());
        let planner = Planner::new(Arc::clone(&backend) as Arc<dyn ReasoningBackend>, PlannerConfig::default());
        let person = Person::new("ada", "ada@example.com")
            .with_task(Task::new("t-1", "already done").completed());

        let report = planner
            .plan_for_at(&person, now())
            .await
            .expect("empty schedule");
        assert!(report.accepted.is_empty());
        assert!(report.violations.is_empty());
        assert_eq!(report.attempts, 0);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_snapshot_rejected_before_backend() {
        let backend = Arc::new(UnreachableBackend::new());
        let planner = Planner::new(Arc::clone(&backend) as Arc<dyn ReasoningBackend>, PlannerConfig::default());
        let start = NaiveTime::from_hms_opt(10, 0, 0).expect("valid time");
        let end = NaiveTime::from_hms_opt(9, 0, 0).expect("valid time");
        let person = Person::new("ada", "ada@example.com")
            .with_task(Task::new("t-1", "write report"))
            .with_availability(AvailabilityWindow::new(DayOfWeek::Monday, start, end));

        let err = planner
            .plan_for_at(&person, now())
            .await
            .expect_err("inverted window");
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn capacity_exhaustion_fails_fast() {
        let backend = Arc::new(UnreachableBackend::new());
        let planner = Planner::new(
            backend as Arc<dyn ReasoningBackend>,
            PlannerConfig::new().with_max_concurrent_sessions(0),
        );
        let person =
            Person::new("ada", "ada@example.com").with_task(Task::new("t-1", "write report"));

        let err = planner
            .plan_for_at(&person, now())
            .await
            .expect_err("no capacity");
        assert_eq!(err.code(), "PLANNING_UNAVAILABLE");
        assert!(err.message().contains("capacity"));
    }

    #[test]
    fn unknown_tool_dispatch_returns_error_text() {
        let backend = Arc::new(UnreachableBackend::new());
        let planner = Planner::new(backend as Arc<dyn ReasoningBackend>, PlannerConfig::default());
        let registry = ToolRegistry::new();
        let reply = planner.dispatch_tool(
            &registry,
            &ToolInvocation {
                call_id: "call_1".into(),
                name: "delete_everything".into(),
                arguments: "{}".into(),
            },
        );
        assert!(reply.starts_with("Error: unknown tool"));
    }
}
