//! Post-hoc validation of backend-produced schedules.
//!
//! The four scheduling rules in the system contract are advisory to the
//! backend; nothing guarantees it honored them. Every returned activity
//! is therefore re-checked here against the original constraints before
//! the session result is accepted:
//!
//! - `start < end` ([`ViolationReason::InvertedInterval`])
//! - the interval lies inside some availability window on the matching
//!   day of week ([`ViolationReason::OutOfWindow`]); availability is
//!   recurring, so matching is by day name and time of day, never by
//!   absolute date
//! - if the activity correlates to a task whose deadline is still ahead,
//!   the activity ends by that deadline ([`ViolationReason::PastDueDate`])
//!
//! Correlation back to a task is by title only and is best-effort: an
//! activity that matches no task is checked against the first two rules
//! and accepted without a deadline check.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::{AvailabilityWindow, DayOfWeek, ScheduledActivity, Task};

/// Caller-selected policy for how violations affect the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Any violation fails the whole session.
    #[default]
    Strict,
    /// Violating activities are dropped; the rest are returned.
    Lenient,
}

impl std::fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lenient => write!(f, "lenient"),
        }
    }
}

/// Why an activity was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationReason {
    /// `start >= end`.
    InvertedInterval,
    /// The interval fits no availability window on its day.
    OutOfWindow,
    /// The correlated task's deadline was still ahead, and the activity
    /// ends after it.
    PastDueDate,
}

impl ViolationReason {
    /// Stable reason code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvertedInterval => "INVERTED_INTERVAL",
            Self::OutOfWindow => "OUT_OF_WINDOW",
            Self::PastDueDate => "PAST_DUE_DATE",
        }
    }
}

impl std::fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One rejected activity with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The offending activity, kept whole for diagnostics.
    pub activity: ScheduledActivity,
    /// Which check failed.
    pub reason: ViolationReason,
    /// Human-readable detail.
    pub detail: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.reason, self.activity.title, self.detail)
    }
}

/// Outcome of validating one session's activities.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Activities that passed every check, in backend order.
    pub accepted: Vec<ScheduledActivity>,
    /// Activities that failed a check, with reasons.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Whether every activity passed.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Re-check every activity against the original constraints.
///
/// Pure function of its inputs. `now` decides whether a deadline was
/// still meetable: a task already overdue at planning time cannot be
/// finished before its due date, so scheduling it into the next window
/// is not a violation.
pub fn validate(
    activities: &[ScheduledActivity],
    tasks: &[Task],
    windows: &[AvailabilityWindow],
    now: NaiveDateTime,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for activity in activities {
        match check_activity(activity, tasks, windows, now) {
            Some(violation) => {
                tracing::warn!(
                    title = %activity.title,
                    reason = %violation.reason,
                    "scheduled activity rejected"
                );
                report.violations.push(violation);
            }
            None => report.accepted.push(activity.clone()),
        }
    }

    tracing::debug!(
        accepted = report.accepted.len(),
        violations = report.violations.len(),
        "validation complete"
    );
    report
}

/// Run all checks for one activity; `None` means it passed.
fn check_activity(
    activity: &ScheduledActivity,
    tasks: &[Task],
    windows: &[AvailabilityWindow],
    now: NaiveDateTime,
) -> Option<Violation> {
    if activity.start >= activity.end {
        return Some(Violation {
            activity: activity.clone(),
            reason: ViolationReason::InvertedInterval,
            detail: format!(
                "starts at {} but ends at {}",
                activity.start, activity.end
            ),
        });
    }

    let day = DayOfWeek::from(activity.start.weekday());
    let contained = activity.start.date() == activity.end.date()
        && windows
            .iter()
            .any(|w| w.day == day && w.contains(activity.start.time(), activity.end.time()));
    if !contained {
        return Some(Violation {
            activity: activity.clone(),
            reason: ViolationReason::OutOfWindow,
            detail: format!(
                "{}-{} fits no availability window on {day}",
                activity.start.time().format("%H:%M"),
                activity.end.time().format("%H:%M"),
            ),
        });
    }

    if let Some(task) = correlate_task(&activity.title, tasks)
        && let Some(due) = task.due_date
        && due > now
        && activity.end > due
    {
        return Some(Violation {
            activity: activity.clone(),
            reason: ViolationReason::PastDueDate,
            detail: format!("task {:?} is due at {due} but the activity ends at {}", task.name, activity.end),
        });
    }

    None
}

/// Best-effort correlation of an activity title back to a task.
///
/// Exact name match (case-insensitive) wins; otherwise either string
/// containing the other counts. Returns `None` when nothing matches,
/// which is tolerated: title correlation is not a durable key.
pub fn correlate_task<'a>(title: &str, tasks: &'a [Task]) -> Option<&'a Task> {
    let title_lower = title.trim().to_lowercase();
    if title_lower.is_empty() {
        return None;
    }

    tasks
        .iter()
        .find(|t| t.name.trim().to_lowercase() == title_lower)
        .or_else(|| {
            tasks.iter().find(|t| {
                let name_lower = t.name.trim().to_lowercase();
                !name_lower.is_empty()
                    && (title_lower.contains(&name_lower) || name_lower.contains(&title_lower))
            })
        })
}
