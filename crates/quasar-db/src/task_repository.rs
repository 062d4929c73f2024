use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use quasar_core::constants::messages;
use quasar_core::error::AppError;
use quasar_core::page::{Page, PageRequest};
use quasar_core::task::{NewTaskRecord, Task, TaskFilter, TaskPriority, TaskStatus};
use quasar_core::traits::TaskStore;

use crate::support::{db_err, like_pattern};

/// Repository for project tasks.
#[derive(Clone)]
pub struct TaskRepository {
    pool: Pool<Postgres>,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn tasks_where(&self, condition: &str, id: Uuid, order: &str) -> Result<Vec<Task>, AppError> {
        let sql = format!("{TASK_SELECT} WHERE {condition} ORDER BY {order}");
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

const TASK_SELECT: &str = r#"
    SELECT t.id, t.project_id, t.title, t.description, t.status, t.priority,
           t.assigned_to_id, a.first_name || ' ' || a.last_name AS assigned_to_name,
           t.created_by_id, c.first_name || ' ' || c.last_name AS created_by_name,
           t.due_date, t.estimated_hours, t.actual_hours, t.completed_at, t.completed_by_id,
           t.created_at, t.updated_at
    FROM tasks t
    JOIN users c ON c.id = t.created_by_id
    LEFT JOIN users a ON a.id = t.assigned_to_id
"#;

const BY_DUE_DATE: &str = "t.due_date ASC NULLS LAST, t.created_at DESC, t.id";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, project_id: Uuid, filter: &TaskFilter) {
    qb.push(" WHERE t.project_id = ").push_bind(project_id);
    if let Some(status) = filter.status {
        qb.push(" AND t.status = ").push_bind(status.as_str());
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND t.priority = ").push_bind(priority.as_str());
    }
    if let Some(assignee) = filter.assigned_to {
        qb.push(" AND t.assigned_to_id = ").push_bind(assignee);
    }
    if let Some(query) = filter.query.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = like_pattern(query);
        qb.push(" AND (t.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    project_id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    assigned_to_id: Option<Uuid>,
    assigned_to_name: Option<String>,
    created_by_id: Uuid,
    created_by_name: String,
    due_date: Option<NaiveDate>,
    estimated_hours: Option<i32>,
    actual_hours: Option<i32>,
    completed_at: Option<DateTime<Utc>>,
    completed_by_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            status: row.status.parse().unwrap_or(TaskStatus::Todo),
            priority: row.priority.parse().unwrap_or(TaskPriority::Medium),
            assigned_to_id: row.assigned_to_id,
            assigned_to_name: row.assigned_to_name,
            created_by_id: row.created_by_id,
            created_by_name: row.created_by_name,
            due_date: row.due_date,
            estimated_hours: row.estimated_hours,
            actual_hours: row.actual_hours,
            completed_at: row.completed_at,
            completed_by_id: row.completed_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TaskStore for TaskRepository {
    async fn create_task(&self, task: &NewTaskRecord) -> Result<Task, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO tasks
                (project_id, title, description, priority, assigned_to_id, created_by_id,
                 due_date, estimated_hours)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(task.project_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.assigned_to_id)
        .bind(task.created_by_id)
        .bind(task.due_date)
        .bind(task.estimated_hours)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        self.find_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::TASK_NOT_FOUND.into()))
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        let sql = format!("{TASK_SELECT} WHERE t.id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn update_task(&self, task: &Task) -> Result<Task, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, priority = $5, assigned_to_id = $6,
                due_date = $7, estimated_hours = $8, actual_hours = $9, completed_at = $10,
                completed_by_id = $11, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.assigned_to_id)
        .bind(task.due_date)
        .bind(task.estimated_hours)
        .bind(task.actual_hours)
        .bind(task.completed_at)
        .bind(task.completed_by_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::TASK_NOT_FOUND.into()));
        }

        self.find_task(task.id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::TASK_NOT_FOUND.into()))
    }

    async fn delete_task(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_tasks(
        &self,
        project_id: Uuid,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> Result<Page<Task>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks t");
        push_filters(&mut count, project_id, filter);
        let (total,): (i64,) = count
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let mut select = QueryBuilder::<Postgres>::new(TASK_SELECT);
        push_filters(&mut select, project_id, filter);
        select
            .push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<TaskRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }

    async fn project_tasks(&self, project_id: Uuid) -> Result<Vec<Task>, AppError> {
        self.tasks_where("t.project_id = $1", project_id, BY_DUE_DATE)
            .await
    }

    async fn tasks_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>, AppError> {
        self.tasks_where("t.assigned_to_id = $1", user_id, BY_DUE_DATE)
            .await
    }
}
