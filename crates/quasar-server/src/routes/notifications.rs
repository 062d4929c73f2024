use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{delete, get, put};

use quasar_core::page::PageRequest;

use super::ApiRouter;
use crate::auth::AuthUser;
use crate::dto::{
    CountResponse, MessageResponse, NotificationListParams, NotificationResponse, PageResponse,
    list_of,
};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/recent", get(recent_notifications))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/mark-all-read", put(mark_all_read))
        .route("/api/notifications/all", delete(delete_all))
        .route(
            "/api/notifications/{id}",
            get(get_notification).delete(delete_notification),
        )
        .route("/api/notifications/{id}/read", put(mark_read))
}

/// Newest first.
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationListParams),
    responses((status = 200, description = "The caller's notifications", body = PageResponse<NotificationResponse>)),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<NotificationListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(params.page, params.size);
    let notifications = state
        .notifications
        .list(user.id, params.notification_type, params.unread_only, page)
        .await?;
    Ok(Json(PageResponse::<NotificationResponse>::from(notifications)))
}

#[utoipa::path(
    get,
    path = "/api/notifications/recent",
    responses((status = 200, description = "Unread notifications from the last day", body = Vec<NotificationResponse>)),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn recent_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state.notifications.recent_unread(user.id).await?;
    Ok(Json(list_of::<_, NotificationResponse>(notifications)))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses((status = 200, description = "Unread notifications", body = CountResponse)),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(CountResponse {
        count: state.notifications.unread_count(user.id).await?,
    }))
}

#[utoipa::path(
    get,
    path = "/api/notifications/{id}",
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 200, description = "The notification", body = NotificationResponse),
        (status = 403, description = "Not yours", body = crate::dto::ErrorResponse),
        (status = 404, description = "Notification not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn get_notification(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state.notifications.get(user.id, id).await?;
    Ok(Json(NotificationResponse::from(notification)))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(("id" = i64, Path, description = "Notification id")),
    responses((status = 200, description = "The notification, now read", body = NotificationResponse)),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = state.notifications.mark_read(user.id, id).await?;
    Ok(Json(NotificationResponse::from(notification)))
}

#[utoipa::path(
    put,
    path = "/api/notifications/mark-all-read",
    responses((status = 200, description = "Notifications marked read", body = CountResponse)),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.notifications.mark_all_read(user.id).await?;
    Ok(Json(CountResponse {
        count: i64::try_from(updated).unwrap_or(i64::MAX),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = i64, Path, description = "Notification id")),
    responses((status = 200, description = "Notification deleted", body = MessageResponse)),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.notifications.delete(user.id, id).await?;
    Ok(Json(MessageResponse::new("Notification deleted successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/all",
    responses((status = 200, description = "Notifications deleted", body = CountResponse)),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn delete_all(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.notifications.delete_all(user.id).await?;
    Ok(Json(CountResponse {
        count: i64::try_from(removed).unwrap_or(i64::MAX),
    }))
}
