//! Domain value types for one planning session.
//!
//! Provides the immutable inputs and outputs of the engine:
//! - [`Task`]: a pending item of work with an optional deadline
//! - [`AvailabilityWindow`]: a recurring weekly free slot
//! - [`Person`]: the planning subject, aggregating both
//! - [`ScheduledActivity`]: one recommended assignment, the only output
//!
//! All types carry serde derives because the external store exchanges them
//! as JSON. The engine itself never mutates or persists them; a `Person`
//! is a read-only snapshot taken at call time.
//!
//! Times are naive local wall-clock values: the backend is grounded with
//! the local "now" and availability windows are stored as local times of
//! day, so no timezone arithmetic happens inside the engine.

use chrono::{NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PlanError;

/// Task priority, ordered `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// The store's column default.
    #[default]
    Medium,
    /// Should be scheduled ahead of lower priorities.
    High,
}

impl Priority {
    /// Parse a priority label case-insensitively.
    ///
    /// Unknown labels fall back to [`Priority::Medium`], matching the
    /// external store's column default, so a free-form priority string
    /// never aborts a planning session.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Day of the week for a recurring availability window.
///
/// Serialized with the capitalized English names the external store uses
/// (`"Monday"` .. `"Sunday"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All seven days, Monday first.
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for DayOfWeek {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" => Ok(Self::Monday),
            "tuesday" => Ok(Self::Tuesday),
            "wednesday" => Ok(Self::Wednesday),
            "thursday" => Ok(Self::Thursday),
            "friday" => Ok(Self::Friday),
            "saturday" => Ok(Self::Saturday),
            "sunday" => Ok(Self::Sunday),
            other => Err(PlanError::InvalidInput(format!(
                "unknown day of week: {other:?}"
            ))),
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

/// A pending item of work belonging to one [`Person`].
///
/// Read-only to the engine; created, updated, and deleted by the external
/// task-management collaborator. The identifier is opaque and stable but
/// plays no role in planning: scheduled activities correlate back to tasks
/// by title only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque stable identifier from the external store.
    pub id: String,
    /// Human-readable task name; the correlation key for validation.
    pub name: String,
    /// Deadline. `None` means the task has no deadline.
    pub due_date: Option<NaiveDateTime>,
    /// Whether the task is already done.
    pub completed: bool,
    /// Scheduling priority.
    pub priority: Priority,
}

impl Task {
    /// Create a pending, medium-priority task with no due date.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            due_date: None,
            completed: false,
            priority: Priority::default(),
        }
    }

    /// Set the due date.
    pub fn with_due_date(mut self, due: NaiveDateTime) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Mark the task completed.
    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }
}

/// A recurring weekly free slot: day of week plus a time-of-day range.
///
/// Represents "free every Monday 09:00 to 17:00", not a single calendar
/// instant. Invariant: `start < end`, checked by [`validate()`](Self::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Which weekday the slot recurs on.
    pub day: DayOfWeek,
    /// Start time of day.
    pub start: NaiveTime,
    /// End time of day.
    pub end: NaiveTime,
}

impl AvailabilityWindow {
    /// Create a window. The `start < end` invariant is checked by
    /// [`validate()`](Self::validate), not here, so a malformed snapshot
    /// can still be represented and reported.
    pub fn new(day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> Self {
        Self { day, start, end }
    }

    /// Check the `start < end` invariant.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidInput`] naming the offending window.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.start >= self.end {
            return Err(PlanError::InvalidInput(format!(
                "availability window on {} starts at {} but ends at {}",
                self.day, self.start, self.end
            )));
        }
        Ok(())
    }

    /// Whether a time-of-day interval lies entirely inside this window.
    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start <= start && end <= self.end
    }
}

impl fmt::Display for AvailabilityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.day,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// The planning subject: one user's identity, tasks, and availability.
///
/// A read-only snapshot taken at call time. The engine's unit of work is
/// always one Person, one planning session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Account username.
    pub username: String,
    /// Account email.
    pub email: String,
    /// Tasks, in the store's insertion order.
    pub tasks: Vec<Task>,
    /// Availability windows, in the store's insertion order.
    pub availabilities: Vec<AvailabilityWindow>,
}

impl Person {
    /// Create a person with no tasks and no availability.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            tasks: Vec::new(),
            availabilities: Vec::new(),
        }
    }

    /// Add a task, preserving insertion order.
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Add an availability window, preserving insertion order.
    pub fn with_availability(mut self, window: AvailabilityWindow) -> Self {
        self.availabilities.push(window);
        self
    }

    /// Check snapshot invariants before any planning work begins.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidInput`] for the first malformed
    /// availability window found. Corrupt data is rejected here rather
    /// than passed downstream to the backend.
    pub fn validate(&self) -> Result<(), PlanError> {
        for window in &self.availabilities {
            window.validate()?;
        }
        Ok(())
    }

    /// Tasks not yet completed, in insertion order.
    pub fn pending_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.completed)
    }
}

/// One recommended assignment produced by a planning session.
///
/// Output-only and ephemeral: never persisted by the engine, and linked
/// back to a [`Task`] only by title, which validation treats as
/// best-effort correlation rather than a guaranteed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledActivity {
    /// When to start.
    pub start: NaiveDateTime,
    /// When to stop.
    pub end: NaiveDateTime,
    /// What to do, phrased by the backend; usually names the task.
    pub title: String,
}

impl ScheduledActivity {
    /// Create a scheduled activity.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, title: impl Into<String>) -> Self {
        Self {
            start,
            end,
            title: title.into(),
        }
    }
}

impl fmt::Display for ScheduledActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} to {}",
            self.title,
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}
