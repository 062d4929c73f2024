use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quasar_core::error::AppError;
use quasar_core::task::{
    AssigneeChange, NewTask, Task, TaskFilter, TaskPriority, TaskStatistics, TaskStatus,
    TaskUpdate,
};

use super::present;

/// Blank means "nobody"; anything else must be a user id.
fn parse_assignee(field: &str, raw: Option<&str>) -> Result<Option<Uuid>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(id) => Uuid::parse_str(id)
            .map(Some)
            .map_err(|_| AppError::invalid_field(field, "Assignee must be a valid user id")),
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to_id: Option<String>,
    /// Defaults to MEDIUM.
    #[schema(value_type = Option<String>, example = "HIGH")]
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i32>,
}

impl TryFrom<CreateTaskRequest> for NewTask {
    type Error = AppError;

    fn try_from(r: CreateTaskRequest) -> Result<Self, Self::Error> {
        Ok(NewTask {
            assigned_to_id: parse_assignee("assignedToId", r.assigned_to_id.as_deref())?,
            title: r.title,
            description: r.description,
            priority: r.priority,
            due_date: r.due_date,
            estimated_hours: r.estimated_hours,
        })
    }
}

/// Partial edit. An explicit `null` or empty `assignedToId` unassigns.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub assigned_to_id: Option<Option<String>>,
    #[schema(value_type = Option<String>, example = "IN_PROGRESS")]
    pub status: Option<TaskStatus>,
    #[schema(value_type = Option<String>, example = "HIGH")]
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
}

impl TryFrom<UpdateTaskRequest> for TaskUpdate {
    type Error = AppError;

    fn try_from(r: UpdateTaskRequest) -> Result<Self, Self::Error> {
        let assignee = match r.assigned_to_id {
            None => None,
            Some(raw) => Some(
                match parse_assignee("assignedToId", raw.as_deref())? {
                    Some(id) => AssigneeChange::Assign(id),
                    None => AssigneeChange::Unassign,
                },
            ),
        };
        Ok(TaskUpdate {
            title: r.title,
            description: r.description,
            assignee,
            status: r.status,
            priority: r.priority,
            due_date: r.due_date,
            estimated_hours: r.estimated_hours,
            actual_hours: r.actual_hours,
        })
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskRequest {
    /// Omit or send null to unassign.
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TaskFilterParams {
    #[param(value_type = Option<String>)]
    pub status: Option<TaskStatus>,
    #[param(value_type = Option<String>)]
    pub priority: Option<TaskPriority>,
    pub assigned_to_id: Option<Uuid>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl TaskFilterParams {
    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.status,
            priority: self.priority,
            assigned_to: self.assigned_to_id,
            query: None,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DueSoonParams {
    /// Horizon in days, default 7.
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskSearchParams {
    #[serde(default)]
    pub query: String,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "TODO")]
    pub status: TaskStatus,
    #[schema(value_type = String, example = "MEDIUM")]
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
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(t: Task) -> Self {
        Self {
            is_overdue: t.is_overdue(Utc::now().date_naive()),
            id: t.id,
            project_id: t.project_id,
            title: t.title,
            description: t.description,
            status: t.status,
            priority: t.priority,
            assigned_to_id: t.assigned_to_id,
            assigned_to_name: t.assigned_to_name,
            created_by_id: t.created_by_id,
            created_by_name: t.created_by_name,
            due_date: t.due_date,
            estimated_hours: t.estimated_hours,
            actual_hours: t.actual_hours,
            completed_at: t.completed_at,
            completed_by_id: t.completed_by_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatisticsResponse {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub todo: i64,
    pub overdue: i64,
    pub due_today: i64,
    pub completion_percentage: f64,
}

impl From<TaskStatistics> for TaskStatisticsResponse {
    fn from(s: TaskStatistics) -> Self {
        Self {
            total: s.total,
            completed: s.completed,
            in_progress: s.in_progress,
            todo: s.todo,
            overdue: s.overdue,
            due_today: s.due_today,
            completion_percentage: s.completion_percentage,
        }
    }
}
