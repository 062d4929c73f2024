//! Unauthenticated reference data, landing figures and the health probe.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Deserialize;

use quasar_core::constants::{BRANCHES, PROJECT_CATEGORIES, TEAM_ROLES, graduation_years};
use quasar_core::skill::SkillLevel;

use super::ApiRouter;
use crate::dto::{
    HealthResponse, LandingCountsResponse, PageParams, PageResponse, PredefinedSkillResponse,
    ProjectResponse, SkillResponse, list_of,
};
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::state::AppState;

/// Recent projects shown when the caller gives no limit.
const DEFAULT_RECENT_PROJECTS: i64 = 6;

pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route("/api/static-data/branches", get(branches))
        .route("/api/static-data/graduation-years", get(years))
        .route("/api/static-data/project-categories", get(project_categories))
        .route("/api/static-data/team-roles", get(team_roles))
        .route("/api/static-data/skill-levels", get(skill_levels))
        .route("/api/static-data/predefined-skills", get(predefined_skills))
        .route("/api/data/counts", get(landing_counts))
        .route("/api/data/recent-projects", get(recent_projects))
        .route("/api/data/popular-skills", get(popular_skills))
        .route("/health", get(health))
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/static-data/branches",
    responses((status = 200, description = "Academic branches", body = Vec<String>)),
    tag = "static-data"
)]
pub async fn branches() -> Json<&'static [&'static str]> {
    Json(BRANCHES)
}

#[utoipa::path(
    get,
    path = "/api/static-data/graduation-years",
    responses((status = 200, description = "Accepted graduation years", body = Vec<i32>)),
    tag = "static-data"
)]
pub async fn years() -> Json<Vec<i32>> {
    Json(graduation_years())
}

#[utoipa::path(
    get,
    path = "/api/static-data/project-categories",
    responses((status = 200, description = "Suggested project categories", body = Vec<String>)),
    tag = "static-data"
)]
pub async fn project_categories() -> Json<&'static [&'static str]> {
    Json(PROJECT_CATEGORIES)
}

#[utoipa::path(
    get,
    path = "/api/static-data/team-roles",
    responses((status = 200, description = "Suggested team roles", body = Vec<String>)),
    tag = "static-data"
)]
pub async fn team_roles() -> Json<&'static [&'static str]> {
    Json(TEAM_ROLES)
}

#[utoipa::path(
    get,
    path = "/api/static-data/skill-levels",
    responses((status = 200, description = "Skill proficiency levels", body = Vec<String>)),
    tag = "static-data"
)]
pub async fn skill_levels() -> Json<Vec<&'static str>> {
    Json(SkillLevel::ALL.iter().map(SkillLevel::as_str).collect())
}

#[utoipa::path(
    get,
    path = "/api/static-data/predefined-skills",
    responses((status = 200, description = "Built-in skill catalogue", body = Vec<PredefinedSkillResponse>)),
    tag = "static-data"
)]
pub async fn predefined_skills(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<PredefinedSkillResponse>> {
    Json(super::skills::predefined(&state))
}

// ---------------------------------------------------------------------------
// Landing
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentProjectsParams {
    /// 1 to 20, default 6.
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/data/counts",
    responses((status = 200, description = "Registered users and projects", body = LandingCountsResponse)),
    tag = "landing"
)]
pub async fn landing_counts(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(counts) = state.cache.counts.get(&()).await {
        return Ok(Json(counts));
    }
    let counts = LandingCountsResponse {
        users: state.users.count_users().await?,
        projects: state.projects.count_projects().await?,
    };
    state.cache.counts.insert((), counts.clone()).await;
    Ok(Json(counts))
}

#[utoipa::path(
    get,
    path = "/api/data/recent-projects",
    params(RecentProjectsParams),
    responses((status = 200, description = "Newest projects", body = Vec<ProjectResponse>)),
    tag = "landing"
)]
pub async fn recent_projects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentProjectsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_PROJECTS);
    let projects = state.projects.recent_projects(limit).await?;
    Ok(Json(list_of::<_, ProjectResponse>(projects)))
}

#[utoipa::path(
    get,
    path = "/api/data/popular-skills",
    params(PageParams),
    responses((status = 200, description = "Skills by user count", body = PageResponse<SkillResponse>)),
    tag = "landing"
)]
pub async fn popular_skills(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let request = params.request();
    let key = (request.page, request.size);
    if let Some(page) = state.cache.popular_skills.get(&key).await {
        return Ok(Json(page));
    }
    let page: PageResponse<SkillResponse> = state.skills.popular_skills(request).await?.into();
    state.cache.popular_skills.insert(key, page.clone()).await;
    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "UP",
                database: "UP",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "DOWN",
                    database: "DOWN",
                }),
            )
        }
    }
}
