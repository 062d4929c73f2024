use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};

use quasar_core::error::AppError;
use quasar_core::user::User;

use super::ApiRouter;
use crate::auth::AuthUser;
use crate::dto::{
    AuthResponse, GitHubLoginResponse, LoginRequest, MessageResponse, RegisterRequest,
    UserResponse,
};
use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

/// Where the GitHub login flow starts.
pub const GITHUB_AUTHORIZATION_PATH: &str = "/oauth2/authorization/github";

/// Routes that do not need the credential rate limiter.
pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/github", get(github))
}

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        token: state.tokens.issue(&user)?,
        token_type: "Bearer",
        expires_in: state.tokens.expiration_secs(),
        user: user.into(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed", body = crate::dto::ErrorResponse),
        (status = 409, description = "Email already exists", body = crate::dto::ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::dto::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.accounts.register(body.into()).await?;
    tracing::info!(user_id = %user.id, "Registered new account");
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::dto::ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::dto::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.accounts.login(body.into()).await?;
    Ok(Json(auth_response(&state, user)?))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The signed-in user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

/// Tokens are stateless; the client drops its copy.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(AuthUser(user): AuthUser) -> Json<MessageResponse> {
    tracing::debug!(user_id = %user.id, "Signed out");
    Json(MessageResponse::new("Logged out successfully"))
}

#[utoipa::path(
    get,
    path = "/api/auth/github",
    responses(
        (status = 200, description = "Path that starts GitHub login", body = GitHubLoginResponse),
    ),
    tag = "auth"
)]
pub async fn github() -> Json<GitHubLoginResponse> {
    Json(GitHubLoginResponse {
        authorization_url: GITHUB_AUTHORIZATION_PATH.to_string(),
    })
}
