//! Context projection for one planning session.
//!
//! [`PlanningContext`] holds a validated, immutable snapshot of one
//! [`Person`] and projects it into the two textual summaries the query
//! tools expose to the reasoning backend. Projection is pure: calling a
//! summary twice on the same snapshot yields identical text.
//!
//! Both summaries preserve the store's insertion order. Tasks are sorted
//! by due date only in the external listing layer, never here; the
//! backend receives them unordered and must reason about ordering itself.

use crate::error::PlanError;
use crate::model::Person;

/// A validated, read-only view of one Person for the duration of a session.
///
/// Construction fails on a malformed snapshot, so everything downstream
/// (tools, backend, validator) can assume the invariants hold.
#[derive(Debug, Clone)]
pub struct PlanningContext {
    person: Person,
}

impl PlanningContext {
    /// Validate the snapshot and take ownership of a copy.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidInput`] if any availability window has
    /// `start >= end`. This is checked before any backend call is made.
    pub fn new(person: &Person) -> Result<Self, PlanError> {
        person.validate()?;
        Ok(Self {
            person: person.clone(),
        })
    }

    /// The underlying snapshot.
    pub fn person(&self) -> &Person {
        &self.person
    }

    /// One line per task: name, due date (or none), priority, completion.
    ///
    /// Insertion order. Completed tasks are included so the backend can
    /// see they need no slot.
    pub fn task_summary(&self) -> String {
        if self.person.tasks.is_empty() {
            return "No tasks.".to_string();
        }

        let lines: Vec<String> = self
            .person
            .tasks
            .iter()
            .map(|task| {
                let status = if task.completed {
                    "COMPLETED"
                } else {
                    "NOT COMPLETED"
                };
                match task.due_date {
                    Some(due) => format!(
                        "{} due at {} with {} priority ({status}).",
                        task.name,
                        due.format("%Y-%m-%d %H:%M"),
                        task.priority,
                    ),
                    None => format!(
                        "{} with no due date and {} priority ({status}).",
                        task.name, task.priority,
                    ),
                }
            })
            .collect();
        lines.join("\n")
    }

    /// One line per availability window: day, start, end. Insertion order.
    pub fn availability_summary(&self) -> String {
        if self.person.availabilities.is_empty() {
            return "No availability windows.".to_string();
        }

        let lines: Vec<String> = self
            .person
            .availabilities
            .iter()
            .map(|w| {
                format!(
                    "Available on {}s from {} to {}",
                    w.day,
                    w.start.format("%H:%M"),
                    w.end.format("%H:%M"),
                )
            })
            .collect();
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AvailabilityWindow, DayOfWeek, Priority, Task};
    use chrono::{NaiveDate, NaiveTime};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn sample_person() -> Person {
        let due = NaiveDate::from_ymd_opt(2025, 3, 7)
            .and_then(|d| d.and_hms_opt(17, 0, 0))
            .expect("valid datetime");
        Person::new("ada", "ada@example.com")
            .with_task(
                Task::new("t-1", "Write the quarterly report")
                    .with_due_date(due)
                    .with_priority(Priority::High),
            )
            .with_task(Task::new("t-2", "Water the plants").completed())
            .with_availability(AvailabilityWindow::new(
                DayOfWeek::Monday,
                time(9, 0),
                time(12, 0),
            ))
            .with_availability(AvailabilityWindow::new(
                DayOfWeek::Thursday,
                time(14, 0),
                time(16, 30),
            ))
    }

    #[test]
    fn construction_rejects_malformed_snapshot() {
        let person = Person::new("ada", "ada@example.com").with_availability(
            AvailabilityWindow::new(DayOfWeek::Monday, time(10, 0), time(9, 0)),
        );
        let err = PlanningContext::new(&person).expect_err("inverted window");
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn task_summary_one_line_per_task() {
        let ctx = PlanningContext::new(&sample_person()).expect("valid snapshot");
        let summary = ctx.task_summary();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Write the quarterly report"));
        assert!(lines[0].contains("2025-03-07 17:00"));
        assert!(lines[0].contains("high priority"));
        assert!(lines[0].contains("NOT COMPLETED"));
        assert!(lines[1].contains("Water the plants"));
        assert!(lines[1].contains("no due date"));
        assert!(lines[1].contains("(COMPLETED)"));
    }

    #[test]
    fn availability_summary_one_line_per_window() {
        let ctx = PlanningContext::new(&sample_person()).expect("valid snapshot");
        let summary = ctx.availability_summary();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Available on Mondays from 09:00 to 12:00");
        assert_eq!(lines[1], "Available on Thursdays from 14:00 to 16:30");
    }

    #[test]
    fn summaries_preserve_insertion_order() {
        let person = Person::new("ada", "ada@example.com")
            .with_task(Task::new("2", "later task"))
            .with_task(Task::new("1", "earlier task"));
        let ctx = PlanningContext::new(&person).expect("valid snapshot");
        let summary = ctx.task_summary();
        let later = summary.find("later task").expect("present");
        let earlier = summary.find("earlier task").expect("present");
        assert!(later < earlier, "insertion order must be preserved");
    }

    #[test]
    fn projection_is_idempotent() {
        let ctx = PlanningContext::new(&sample_person()).expect("valid snapshot");
        assert_eq!(ctx.task_summary(), ctx.task_summary());
        assert_eq!(ctx.availability_summary(), ctx.availability_summary());
    }

    #[test]
    fn empty_collections_have_placeholder_text() {
        let ctx = PlanningContext::new(&Person::new("ada", "ada@example.com"))
            .expect("valid snapshot");
        assert_eq!(ctx.task_summary(), "No tasks.");
        assert_eq!(ctx.availability_summary(), "No availability windows.");
    }
}
