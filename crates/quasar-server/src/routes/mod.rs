//! HTTP routes. Each submodule owns one resource and exposes `routes()`.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::RateLimit;
use crate::error::{not_found, stamp_error_path};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::ws;

pub mod auth;
pub mod categories;
pub mod chat;
pub mod notifications;
pub mod oauth;
pub mod projects;
pub mod public;
pub mod skills;
pub mod tasks;
pub mod team;
pub mod users;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

type ApiRouter = Router<Arc<AppState>>;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let credentials = rate_limited(
        Router::new()
            .route("/api/auth/register", post(auth::register))
            .route("/api/auth/login", post(auth::login)),
        state.config.auth_rate_limit,
        state.config.trusted_proxy,
    );

    let sockets = Router::new()
        .route("/ws/notifications", get(ws::notifications_socket))
        .route("/ws/chat/{projectId}", get(ws::chat_socket));

    Router::new()
        .merge(credentials)
        .merge(auth::routes())
        .merge(oauth::routes())
        .merge(users::routes())
        .merge(skills::routes())
        .merge(categories::routes())
        .merge(projects::routes())
        .merge(team::routes())
        .merge(tasks::routes())
        .merge(notifications::routes())
        .merge(chat::routes())
        .merge(public::routes())
        .merge(sockets)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn(stamp_error_path))
        .with_state(state)
}

/// Per-client-IP token bucket in front of `routes`. The client is the socket
/// peer unless `trusted_proxy` allows forwarding headers. Unusable settings
/// leave the routes unthrottled.
fn rate_limited(routes: ApiRouter, limit: RateLimit, trusted_proxy: bool) -> ApiRouter {
    let throttled = if trusted_proxy {
        GovernorConfigBuilder::default()
            .per_second(limit.replenish_secs)
            .burst_size(limit.burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .map(|config| routes.clone().layer(GovernorLayer::new(Arc::new(config))))
    } else {
        GovernorConfigBuilder::default()
            .per_second(limit.replenish_secs)
            .burst_size(limit.burst)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .map(|config| routes.clone().layer(GovernorLayer::new(Arc::new(config))))
    };
    throttled.unwrap_or_else(|| {
        tracing::warn!(?limit, "Invalid auth rate limit; register and login are unthrottled");
        routes
    })
}
