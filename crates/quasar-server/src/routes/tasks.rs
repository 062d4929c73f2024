use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use uuid::Uuid;

use quasar_core::page::PageRequest;
use quasar_core::task::{NewTask, TaskUpdate};

use super::ApiRouter;
use crate::auth::AuthUser;
use crate::dto::{
    AssignTaskRequest, CreateTaskRequest, DueSoonParams, MessageResponse, PageResponse,
    TaskFilterParams, TaskResponse, TaskSearchParams, TaskStatisticsResponse, UpdateTaskRequest,
    list_of,
};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route(
            "/api/projects/{id}/tasks",
            get(list_tasks).post(create_task),
        )
        .route("/api/projects/{id}/tasks/search", get(search_tasks))
        .route("/api/projects/{id}/tasks/overdue", get(overdue_tasks))
        .route("/api/projects/{id}/tasks/due-today", get(due_today))
        .route("/api/projects/{id}/tasks/due-soon", get(due_soon))
        .route("/api/projects/{id}/tasks/statistics", get(statistics))
        .route("/api/tasks/my", get(my_tasks))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/complete", put(toggle_complete))
        .route("/api/tasks/{id}/assign", put(assign_task))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/tasks",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Validation failed", body = crate::dto::ErrorResponse),
        (status = 403, description = "Members only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = NewTask::try_from(body)?;
    let task = state.tasks.create_task(user.id, project_id, input).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks",
    params(("id" = Uuid, Path, description = "Project id"), TaskFilterParams),
    responses(
        (status = 200, description = "The project's tasks", body = PageResponse<TaskResponse>),
        (status = 403, description = "Members only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<TaskFilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(params.page, params.size);
    let tasks = state
        .tasks
        .list_tasks(user.id, project_id, &params.filter(), page)
        .await?;
    Ok(Json(PageResponse::<TaskResponse>::from(tasks)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks/search",
    params(("id" = Uuid, Path, description = "Project id"), TaskSearchParams),
    responses((status = 200, description = "Tasks whose title or description matches", body = PageResponse<TaskResponse>)),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn search_tasks(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<TaskSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(params.page, params.size);
    let tasks = state
        .tasks
        .search_tasks(user.id, project_id, &params.query, page)
        .await?;
    Ok(Json(PageResponse::<TaskResponse>::from(tasks)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks/overdue",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Open tasks past their due date", body = Vec<TaskResponse>)),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn overdue_tasks(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = state.tasks.overdue_tasks(user.id, project_id).await?;
    Ok(Json(list_of::<_, TaskResponse>(tasks)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks/due-today",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Open tasks due today", body = Vec<TaskResponse>)),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn due_today(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = state.tasks.due_today(user.id, project_id).await?;
    Ok(Json(list_of::<_, TaskResponse>(tasks)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks/due-soon",
    params(("id" = Uuid, Path, description = "Project id"), DueSoonParams),
    responses((status = 200, description = "Open tasks due within the horizon", body = Vec<TaskResponse>)),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn due_soon(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<DueSoonParams>,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = state
        .tasks
        .due_within(user.id, project_id, params.days)
        .await?;
    Ok(Json(list_of::<_, TaskResponse>(tasks)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks/statistics",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Counts by state", body = TaskStatisticsResponse)),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn statistics(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.tasks.statistics(user.id, project_id).await?;
    Ok(Json(TaskStatisticsResponse::from(stats)))
}

#[utoipa::path(
    get,
    path = "/api/tasks/my",
    responses((status = 200, description = "Tasks assigned to the caller", body = Vec<TaskResponse>)),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn my_tasks(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = state.tasks.my_tasks(user.id).await?;
    Ok(Json(list_of::<_, TaskResponse>(tasks)))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = TaskResponse),
        (status = 404, description = "Task not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(TaskResponse::from(state.tasks.get_task(user.id, id).await?)))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = i64, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 403, description = "Creator, assignee or lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = TaskUpdate::try_from(body)?;
    let task = state.tasks.update_task(user.id, id, update).await?;
    Ok(Json(TaskResponse::from(task)))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 403, description = "Creator or lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.tasks.delete_task(user.id, id).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

/// Flips between COMPLETED and TODO.
#[utoipa::path(
    put,
    path = "/api/tasks/{id}/complete",
    params(("id" = i64, Path, description = "Task id")),
    responses((status = 200, description = "Updated task", body = TaskResponse)),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn toggle_complete(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.tasks.toggle_complete(user.id, id).await?;
    Ok(Json(TaskResponse::from(task)))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}/assign",
    params(("id" = i64, Path, description = "Task id")),
    request_body = AssignTaskRequest,
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 400, description = "Assignee is not on the team", body = crate::dto::ErrorResponse),
        (status = 403, description = "Creator or lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "tasks"
)]
pub async fn assign_task(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<AssignTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state
        .tasks
        .assign_task(user.id, id, body.assignee_id)
        .await?;
    Ok(Json(TaskResponse::from(task)))
}
