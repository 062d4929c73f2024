use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use quasar_core::page::PageRequest;
use uuid::Uuid;

use super::ApiRouter;
use crate::auth::AuthUser;
use crate::dto::{
    AvailabilityParams, BatchUserSkillRequest, CountResponse, DashboardResponse, MessageResponse,
    PageResponse, UpdateProfileRequest, UpdateUserSkillRequest, UserProfileResponse, UserResponse,
    UserSearchParams, UserSkillRequest, UserSkillResponse, list_of,
};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route("/api/users/count", get(count_users))
        .route("/api/users/search", get(search_users))
        .route("/api/users/profile", put(update_profile))
        .route("/api/users/availability", put(update_availability))
        .route("/api/users/skills", get(my_skills).post(add_skill))
        .route("/api/users/skills/batch", post(add_skills))
        .route(
            "/api/users/skills/{id}",
            put(update_skill).delete(remove_skill),
        )
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/skills", get(user_skills))
        .route("/api/dashboard/counts", get(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile with skills", body = UserProfileResponse),
        (status = 404, description = "User not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.get_user(id).await?;
    let skills = state.skills.user_skills(id).await?;
    Ok(Json(UserProfileResponse {
        user: user.into(),
        skills: list_of(skills),
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/count",
    responses((status = 200, description = "Registered users", body = CountResponse)),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn count_users(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(CountResponse {
        count: state.users.count_users().await?,
    }))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Validation failed", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.update_profile(user.id, body.into()).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/users/availability",
    params(AvailabilityParams),
    responses((status = 200, description = "Updated profile", body = UserResponse)),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_availability(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<AvailabilityParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .update_availability(user.id, params.status)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// Other users matching the filters; the caller is never listed.
#[utoipa::path(
    get,
    path = "/api/users/search",
    params(UserSearchParams),
    responses((status = 200, description = "Matching users", body = PageResponse<UserResponse>)),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<UserSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(params.page, params.size);
    let found = state.users.search(&params.search(user.id), page).await?;
    Ok(Json(PageResponse::<UserResponse>::from(found)))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/counts",
    responses((status = 200, description = "Caller's dashboard figures", body = DashboardResponse)),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let counts = state.users.dashboard(user.id).await?;
    Ok(Json(DashboardResponse::from(counts)))
}

// ---------------------------------------------------------------------------
// Profile skills
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/users/skills",
    responses((status = 200, description = "Caller's skills", body = Vec<UserSkillResponse>)),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn my_skills(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let skills = state.skills.user_skills(user.id).await?;
    Ok(Json(list_of::<_, UserSkillResponse>(skills)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/skills",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "The user's skills", body = Vec<UserSkillResponse>)),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn user_skills(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.get_user(id).await?;
    let skills = state.skills.user_skills(id).await?;
    Ok(Json(list_of::<_, UserSkillResponse>(skills)))
}

#[utoipa::path(
    post,
    path = "/api/users/skills",
    request_body = UserSkillRequest,
    responses(
        (status = 201, description = "Skill added", body = UserSkillResponse),
        (status = 409, description = "Skill already on the profile", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn add_skill(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<UserSkillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state.skills.add_user_skill(user.id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(UserSkillResponse::from(skill))))
}

#[utoipa::path(
    post,
    path = "/api/users/skills/batch",
    request_body = BatchUserSkillRequest,
    responses((status = 201, description = "Skills that were added", body = Vec<UserSkillResponse>)),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn add_skills(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<BatchUserSkillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let inputs = body.skills.into_iter().map(Into::into).collect();
    let added = state.skills.add_user_skills(user.id, inputs).await?;
    Ok((
        StatusCode::CREATED,
        Json(list_of::<_, UserSkillResponse>(added)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/skills/{id}",
    params(("id" = i64, Path, description = "User skill id")),
    request_body = UpdateUserSkillRequest,
    responses(
        (status = 200, description = "Updated skill", body = UserSkillResponse),
        (status = 403, description = "Not your skill", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_skill(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserSkillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state
        .skills
        .update_user_skill(user.id, id, body.into())
        .await?;
    Ok(Json(UserSkillResponse::from(skill)))
}

#[utoipa::path(
    delete,
    path = "/api/users/skills/{id}",
    params(("id" = i64, Path, description = "User skill id")),
    responses(
        (status = 200, description = "Skill removed", body = MessageResponse),
        (status = 403, description = "Not your skill", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn remove_skill(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.skills.remove_user_skill(user.id, id).await?;
    Ok(Json(MessageResponse::new("Skill removed successfully")))
}
