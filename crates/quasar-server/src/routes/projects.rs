use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use uuid::Uuid;

use quasar_core::page::PageRequest;

use super::ApiRouter;
use crate::auth::AuthUser;
use crate::dto::{
    AddMemberRequest, CountResponse, CreateProjectRequest, MemberResponse, MessageResponse,
    PageParams, PageResponse, ProjectResponse, ProjectSearchParams, UpdateProjectRequest,
    UpdateRoleRequest, list_of,
};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

// Every `/api/projects/{id}/...` route across modules uses the same
// parameter name; the router rejects mixed names at one position.
pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route("/api/projects", post(create_project))
        .route("/api/projects/search", get(search_projects))
        .route("/api/projects/discover", get(discover_projects))
        .route("/api/projects/my-projects", get(my_projects))
        .route("/api/projects/led-by-me", get(led_by_me))
        .route("/api/projects/count", get(count_projects))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/members", get(members).post(add_member))
        .route("/api/projects/{id}/members/{memberId}", delete(remove_member))
        .route("/api/projects/{id}/members/{memberId}/role", put(update_role))
        .route("/api/projects/{id}/leave", post(leave_project))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created; the caller leads it", body = ProjectResponse),
        (status = 400, description = "Validation failed", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.projects.create_project(&user, body.into()).await?;
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "The project", body = ProjectResponse),
        (status = 404, description = "Project not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ProjectResponse::from(state.projects.get_project(id).await?)))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Updated project", body = ProjectResponse),
        (status = 403, description = "Lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state
        .projects
        .update_project(user.id, id, body.into())
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 400, description = "Project in progress or completed", body = crate::dto::ErrorResponse),
        (status = 403, description = "Lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.projects.delete_project(user.id, id).await?;
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

/// Projects the caller neither leads nor belongs to.
#[utoipa::path(
    get,
    path = "/api/projects/search",
    params(ProjectSearchParams),
    responses((status = 200, description = "Matching projects", body = PageResponse<ProjectResponse>)),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn search_projects(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<ProjectSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(params.page, params.size);
    let found = state
        .projects
        .search_projects(user.id, params.search(), page)
        .await?;
    Ok(Json(PageResponse::<ProjectResponse>::from(found)))
}

#[utoipa::path(
    get,
    path = "/api/projects/discover",
    params(PageParams),
    responses((status = 200, description = "Recruiting projects with free seats", body = PageResponse<ProjectResponse>)),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn discover_projects(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.projects.discover(user.id, params.request()).await?;
    Ok(Json(PageResponse::<ProjectResponse>::from(found)))
}

#[utoipa::path(
    get,
    path = "/api/projects/my-projects",
    params(PageParams),
    responses((status = 200, description = "Projects the caller leads or belongs to", body = PageResponse<ProjectResponse>)),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn my_projects(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.projects.my_projects(user.id, params.request()).await?;
    Ok(Json(PageResponse::<ProjectResponse>::from(found)))
}

#[utoipa::path(
    get,
    path = "/api/projects/led-by-me",
    params(PageParams),
    responses((status = 200, description = "Projects the caller leads", body = PageResponse<ProjectResponse>)),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn led_by_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let found = state.projects.led_by(user.id, params.request()).await?;
    Ok(Json(PageResponse::<ProjectResponse>::from(found)))
}

#[utoipa::path(
    get,
    path = "/api/projects/count",
    responses((status = 200, description = "All projects", body = CountResponse)),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn count_projects(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(CountResponse {
        count: state.projects.count_projects().await?,
    }))
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/projects/{id}/members",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Team roster", body = Vec<MemberResponse>),
        (status = 403, description = "Members only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn members(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let members = state.projects.members(user.id, id).await?;
    Ok(Json(list_of::<_, MemberResponse>(members)))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/members",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = MemberResponse),
        (status = 400, description = "Team full", body = crate::dto::ErrorResponse),
        (status = 409, description = "Already a member", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state.projects.add_member(user.id, id, body.user_id).await?;
    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}/members/{memberId}",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("memberId" = i64, Path, description = "Membership id"),
    ),
    responses(
        (status = 200, description = "Member removed", body = MessageResponse),
        (status = 400, description = "The lead cannot be removed", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((id, member_id)): Path<(Uuid, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state.projects.remove_member(user.id, id, member_id).await?;
    Ok(Json(MessageResponse::new("Member removed successfully")))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}/members/{memberId}/role",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("memberId" = i64, Path, description = "Membership id"),
    ),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = MemberResponse),
        (status = 400, description = "LEAD cannot be granted or changed", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((id, member_id)): Path<(Uuid, i64)>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state
        .projects
        .update_member_role(user.id, id, member_id, body.role)
        .await?;
    Ok(Json(MemberResponse::from(member)))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/leave",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Left the project", body = MessageResponse),
        (status = 400, description = "Not a member, or the lead", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn leave_project(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.projects.leave_project(&user, id).await?;
    Ok(Json(MessageResponse::new("You have left the project")))
}
