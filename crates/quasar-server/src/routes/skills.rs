use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use quasar_core::page::PageRequest;

use super::ApiRouter;
use crate::auth::AuthUser;
use crate::dto::{
    CreateSkillRequest, MessageResponse, PageParams, PageResponse, PredefinedSkillResponse,
    SkillResponse, SkillSearchParams, UpdateSkillRequest, list_of,
};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route("/api/skills", get(list_skills).post(create_skill))
        .route("/api/skills/search", get(search_skills))
        .route("/api/skills/categories", get(categories))
        .route("/api/skills/category/{category}", get(skills_by_category))
        .route("/api/skills/popular", get(popular_skills))
        .route("/api/skills/predefined", get(predefined_skills))
        .route(
            "/api/skills/{id}",
            get(get_skill).put(update_skill).delete(delete_skill),
        )
}

#[utoipa::path(
    get,
    path = "/api/skills",
    params(PageParams),
    responses((status = 200, description = "Skills by name", body = PageResponse<SkillResponse>)),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn list_skills(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.skills.list_skills(params.request()).await?;
    Ok(Json(PageResponse::<SkillResponse>::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/skills/search",
    params(SkillSearchParams),
    responses((status = 200, description = "Skills whose name contains the query", body = PageResponse<SkillResponse>)),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn search_skills(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Query(params): Query<SkillSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let request = PageRequest::new(params.page, params.size);
    let page = state.skills.search_skills(&params.query, request).await?;
    Ok(Json(PageResponse::<SkillResponse>::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/skills/categories",
    responses((status = 200, description = "Distinct skill categories", body = Vec<String>)),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn categories(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.skills.categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/skills/category/{category}",
    params(("category" = String, Path, description = "Category name")),
    responses((status = 200, description = "Skills in the category", body = Vec<SkillResponse>)),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn skills_by_category(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let skills = state.skills.skills_by_category(&category).await?;
    Ok(Json(list_of::<_, SkillResponse>(skills)))
}

#[utoipa::path(
    get,
    path = "/api/skills/popular",
    params(PageParams),
    responses((status = 200, description = "Skills by user count", body = PageResponse<SkillResponse>)),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn popular_skills(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.skills.popular_skills(params.request()).await?;
    Ok(Json(PageResponse::<SkillResponse>::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/skills/predefined",
    responses((status = 200, description = "Built-in skill catalogue", body = Vec<PredefinedSkillResponse>)),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn predefined_skills(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
) -> Json<Vec<PredefinedSkillResponse>> {
    Json(predefined(&state))
}

pub(crate) fn predefined(state: &AppState) -> Vec<PredefinedSkillResponse> {
    state
        .skills
        .predefined_skills()
        .iter()
        .map(|&(name, category)| PredefinedSkillResponse { name, category })
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/skills/{id}",
    params(("id" = i64, Path, description = "Skill id")),
    responses(
        (status = 200, description = "The skill", body = SkillResponse),
        (status = 404, description = "Skill not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn get_skill(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(SkillResponse::from(state.skills.get_skill(id).await?)))
}

#[utoipa::path(
    post,
    path = "/api/skills",
    request_body = CreateSkillRequest,
    responses(
        (status = 201, description = "Skill created", body = SkillResponse),
        (status = 409, description = "Skill already exists", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn create_skill(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Json(body): Json<CreateSkillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state.skills.create_skill(body.into()).await?;
    Ok((StatusCode::CREATED, Json(SkillResponse::from(skill))))
}

#[utoipa::path(
    put,
    path = "/api/skills/{id}",
    params(("id" = i64, Path, description = "Skill id")),
    request_body = UpdateSkillRequest,
    responses(
        (status = 200, description = "Updated skill", body = SkillResponse),
        (status = 403, description = "Administrators only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn update_skill(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSkillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let skill = state.skills.update_skill(&user, id, body.into()).await?;
    Ok(Json(SkillResponse::from(skill)))
}

#[utoipa::path(
    delete,
    path = "/api/skills/{id}",
    params(("id" = i64, Path, description = "Skill id")),
    responses(
        (status = 200, description = "Skill deleted", body = MessageResponse),
        (status = 400, description = "Predefined skill", body = crate::dto::ErrorResponse),
        (status = 403, description = "Administrators only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "skills"
)]
pub async fn delete_skill(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.skills.delete_skill(&user, id).await?;
    Ok(Json(MessageResponse::new("Skill deleted successfully")))
}
