use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use super::ApiRouter;
use crate::auth::AuthUser;
use crate::dto::{CategoryResponse, CategorySearchParams, CreateCategoryRequest, list_of};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route(
            "/api/project-categories",
            get(list_categories).post(create_category),
        )
        .route("/api/project-categories/search", get(search_categories))
        .route("/api/project-categories/{id}", get(get_category))
}

#[utoipa::path(
    get,
    path = "/api/project-categories",
    responses((status = 200, description = "All categories by name", body = Vec<CategoryResponse>)),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.projects.list_categories().await?;
    Ok(Json(list_of::<_, CategoryResponse>(categories)))
}

#[utoipa::path(
    get,
    path = "/api/project-categories/search",
    params(CategorySearchParams),
    responses((status = 200, description = "Matching categories", body = Vec<CategoryResponse>)),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn search_categories(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Query(params): Query<CategorySearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.projects.search_categories(&params.q).await?;
    Ok(Json(list_of::<_, CategoryResponse>(categories)))
}

#[utoipa::path(
    get,
    path = "/api/project-categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "The category", body = CategoryResponse),
        (status = 404, description = "Category not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.projects.get_category(id).await?;
    Ok(Json(CategoryResponse::from(category)))
}

/// Returns the existing category when the name is already taken.
#[utoipa::path(
    post,
    path = "/api/project-categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "The category", body = CategoryResponse),
        (status = 400, description = "Validation failed", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    _caller: AuthUser,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .projects
        .create_category(&body.name, body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}
