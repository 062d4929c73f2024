use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::constants::{TASK_DESCRIPTION_MAX_LENGTH, TASK_TITLE_MAX_LENGTH, TASK_TITLE_MIN_LENGTH};
use crate::error::AppError;
use crate::validation::FieldErrors;

string_enum! {
    pub enum TaskStatus {
        Todo => "TODO",
        InProgress => "IN_PROGRESS",
        InReview => "IN_REVIEW",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

impl TaskStatus {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskStatus::Todo | TaskStatus::InProgress | TaskStatus::InReview
        )
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

string_enum! {
    /// Ordered from least to most urgent.
    pub enum TaskPriority {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Critical => "CRITICAL",
    }
}

impl TaskPriority {
    pub fn level(&self) -> u8 {
        match self {
            TaskPriority::Low => 0,
            TaskPriority::Medium => 1,
            TaskPriority::High => 2,
            TaskPriority::Critical => 3,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to_id: Option<Uuid>,
    pub assigned_to_name: Option<String>,
    pub created_by_id: Uuid,
    pub created_by_name: String,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_final() && self.due_date.is_some_and(|d| d < today)
    }

    pub fn is_due_today(&self, today: NaiveDate) -> bool {
        !self.status.is_final() && self.due_date == Some(today)
    }

    /// Open tasks due between today and `today + days`, inclusive. A horizon
    /// past the calendar's end has no upper bound.
    pub fn is_due_within(&self, today: NaiveDate, days: i64) -> bool {
        let horizon = TimeDelta::try_days(days).and_then(|span| today.checked_add_signed(span));
        !self.status.is_final()
            && self
                .due_date
                .is_some_and(|d| d >= today && horizon.is_none_or(|h| d <= h))
    }

    pub fn mark_completed(&mut self, by: Uuid, now: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
        self.completed_by_id = Some(by);
    }

    pub fn reopen(&mut self) {
        self.status = TaskStatus::Todo;
        self.completed_at = None;
        self.completed_by_id = None;
    }

    /// Flip between COMPLETED and TODO.
    pub fn toggle_complete(&mut self, by: Uuid, now: DateTime<Utc>) {
        if self.status == TaskStatus::Completed {
            self.reopen();
        } else {
            self.mark_completed(by, now);
        }
    }
}

/// Row to insert for a new task.
#[derive(Debug, Clone)]
pub struct NewTaskRecord {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub assigned_to_id: Option<Uuid>,
    pub created_by_id: Uuid,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i32>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to_id: Option<Uuid>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i32>,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.require_length(
            "title",
            &self.title,
            TASK_TITLE_MIN_LENGTH,
            TASK_TITLE_MAX_LENGTH,
            "Title",
        );
        errors.optional_length(
            "description",
            self.description.as_deref(),
            0,
            TASK_DESCRIPTION_MAX_LENGTH,
            "Description",
        );
        if self.estimated_hours.is_some_and(|h| h < 0) {
            errors.add("estimatedHours", "Estimated hours must not be negative");
        }
        errors.into_result()
    }
}

/// Assignment change carried by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeChange {
    Unassign,
    Assign(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<AssigneeChange>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
}

impl TaskUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.optional_length(
            "title",
            self.title.as_deref(),
            TASK_TITLE_MIN_LENGTH,
            TASK_TITLE_MAX_LENGTH,
            "Title",
        );
        errors.optional_length(
            "description",
            self.description.as_deref(),
            0,
            TASK_DESCRIPTION_MAX_LENGTH,
            "Description",
        );
        if self.estimated_hours.is_some_and(|h| h < 0) {
            errors.add("estimatedHours", "Estimated hours must not be negative");
        }
        if self.actual_hours.is_some_and(|h| h < 0) {
            errors.add("actualHours", "Actual hours must not be negative");
        }
        errors.into_result()
    }
}

/// Filters for a project's task list.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    /// Title or description contains, case-insensitively.
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub todo: i64,
    pub overdue: i64,
    pub due_today: i64,
    /// 0.0..=100.0, rounded to one decimal.
    pub completion_percentage: f64,
}

impl TaskStatistics {
    pub fn from_tasks(tasks: &[Task], today: NaiveDate) -> Self {
        let count = |f: &dyn Fn(&Task) -> bool| tasks.iter().filter(|t| f(t)).count() as i64;
        let total = tasks.len() as i64;
        let completed = count(&|t| t.status == TaskStatus::Completed);
        let completion_percentage = if total == 0 {
            0.0
        } else {
            ((completed as f64 / total as f64) * 1000.0).round() / 10.0
        };
        Self {
            total,
            completed,
            in_progress: count(&|t| t.status == TaskStatus::InProgress),
            todo: count(&|t| t.status == TaskStatus::Todo),
            overdue: count(&|t| t.is_overdue(today)),
            due_today: count(&|t| t.is_due_today(today)),
            completion_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus, due: Option<NaiveDate>) -> Task {
        let now = Utc::now();
        Task {
            id: 1,
            project_id: Uuid::new_v4(),
            title: "Write schema".into(),
            description: None,
            status,
            priority: TaskPriority::default(),
            assigned_to_id: None,
            assigned_to_name: None,
            created_by_id: Uuid::new_v4(),
            created_by_name: "Ada Lovelace".into(),
            due_date: due,
            estimated_hours: None,
            actual_hours: None,
            completed_at: None,
            completed_by_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_priority_levels() {
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(TaskPriority::Low.level(), 0);
        assert_eq!(TaskPriority::Critical.level(), 3);
        assert!(TaskPriority::High > TaskPriority::Medium);
    }

    #[test]
    fn test_status_predicates() {
        assert!(TaskStatus::InReview.is_active());
        assert!(!TaskStatus::InReview.is_final());
        assert!(TaskStatus::Cancelled.is_final());
    }

    #[test]
    fn test_due_date_checks() {
        let today = day(10);
        assert!(task(TaskStatus::Todo, Some(day(9))).is_overdue(today));
        assert!(!task(TaskStatus::Completed, Some(day(9))).is_overdue(today));
        assert!(task(TaskStatus::InProgress, Some(day(10))).is_due_today(today));
        assert!(task(TaskStatus::Todo, Some(day(17))).is_due_within(today, 7));
        assert!(!task(TaskStatus::Todo, Some(day(18))).is_due_within(today, 7));
        assert!(!task(TaskStatus::Todo, None).is_overdue(today));
    }

    #[test]
    fn test_due_within_huge_horizon() {
        let today = day(10);
        assert!(task(TaskStatus::Todo, Some(today)).is_due_within(today, 1_000_000_000));
        assert!(task(TaskStatus::Todo, Some(day(30))).is_due_within(today, i64::MAX));
        assert!(!task(TaskStatus::Todo, Some(day(9))).is_due_within(today, i64::MAX));
        assert!(!task(TaskStatus::Completed, Some(today)).is_due_within(today, i64::MAX));
    }

    #[test]
    fn test_toggle_complete_stamps_and_clears() {
        let mut t = task(TaskStatus::InProgress, None);
        let who = Uuid::new_v4();
        let now = Utc::now();
        t.toggle_complete(who, now);
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.completed_by_id, Some(who));
        assert_eq!(t.completed_at, Some(now));
        t.toggle_complete(who, now);
        assert_eq!(t.status, TaskStatus::Todo);
        assert_eq!(t.completed_by_id, None);
        assert_eq!(t.completed_at, None);
    }

    #[test]
    fn test_statistics() {
        let today = day(10);
        let tasks = vec![
            task(TaskStatus::Completed, Some(day(1))),
            task(TaskStatus::Todo, Some(day(5))),
            task(TaskStatus::InProgress, Some(day(10))),
        ];
        let stats = TaskStatistics::from_tasks(&tasks, today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.todo, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.completion_percentage, 33.3);

        assert_eq!(TaskStatistics::from_tasks(&[], today).completion_percentage, 0.0);
    }

    #[test]
    fn test_new_task_validation() {
        let input = NewTask {
            title: "ab".into(),
            estimated_hours: Some(-1),
            ..Default::default()
        };
        match input.validate() {
            Err(AppError::Validation(errors)) => {
                assert_eq!(
                    errors.get("title"),
                    Some("Title must be between 3 and 200 characters")
                );
                assert!(errors.get("estimatedHours").is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
