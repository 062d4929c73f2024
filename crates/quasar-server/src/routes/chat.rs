//! Project chat over REST. Every write is also pushed to `/ws/chat/{projectId}`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use uuid::Uuid;

use quasar_core::constants::DEFAULT_CHAT_PAGE_SIZE;
use quasar_core::page::PageRequest;

use super::ApiRouter;
use crate::auth::AuthUser;
use crate::dto::{
    AfterParams, ChatMessageResponse, CountResponse, LatestParams, MessageResponse,
    MessageSearchParams, PageParams, PageResponse, SendMessageRequest, list_of,
};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

/// Messages returned by `/latest` when no limit is given.
const DEFAULT_LATEST_LIMIT: i64 = 50;

pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route(
            "/api/chat/projects/{id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/api/chat/projects/{id}/messages/recent", get(recent_messages))
        .route("/api/chat/projects/{id}/messages/search", get(search_messages))
        .route("/api/chat/projects/{id}/messages/after", get(messages_after))
        .route("/api/chat/projects/{id}/messages/latest", get(latest_messages))
        .route("/api/chat/projects/{id}/messages/count", get(count_messages))
        .route(
            "/api/chat/messages/{id}",
            get(get_message).put(edit_message).delete(delete_message),
        )
}

#[utoipa::path(
    post,
    path = "/api/chat/projects/{id}/messages",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = ChatMessageResponse),
        (status = 400, description = "Empty or too long", body = crate::dto::ErrorResponse),
        (status = 403, description = "Members only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .chat
        .send_message(user.id, project_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(ChatMessageResponse::from(message))))
}

/// Newest first; 50 per page unless `size` says otherwise.
#[utoipa::path(
    get,
    path = "/api/chat/projects/{id}/messages",
    params(("id" = Uuid, Path, description = "Project id"), PageParams),
    responses((status = 200, description = "Messages", body = PageResponse<ChatMessageResponse>)),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = params.request_with_default(DEFAULT_CHAT_PAGE_SIZE);
    let messages = state.chat.list_messages(user.id, project_id, page).await?;
    Ok(Json(PageResponse::<ChatMessageResponse>::from(messages)))
}

#[utoipa::path(
    get,
    path = "/api/chat/projects/{id}/messages/recent",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Messages from the last day, oldest first", body = Vec<ChatMessageResponse>)),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn recent_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state.chat.recent_messages(user.id, project_id).await?;
    Ok(Json(list_of::<_, ChatMessageResponse>(messages)))
}

#[utoipa::path(
    get,
    path = "/api/chat/projects/{id}/messages/search",
    params(("id" = Uuid, Path, description = "Project id"), MessageSearchParams),
    responses((status = 200, description = "Messages containing the query", body = PageResponse<ChatMessageResponse>)),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn search_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<MessageSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page =
        PageRequest::with_default_size(params.page, params.size, DEFAULT_CHAT_PAGE_SIZE);
    let messages = state
        .chat
        .search_messages(user.id, project_id, &params.query, page)
        .await?;
    Ok(Json(PageResponse::<ChatMessageResponse>::from(messages)))
}

#[utoipa::path(
    get,
    path = "/api/chat/projects/{id}/messages/after",
    params(("id" = Uuid, Path, description = "Project id"), AfterParams),
    responses((status = 200, description = "Messages after the timestamp, oldest first", body = Vec<ChatMessageResponse>)),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn messages_after(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<AfterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state
        .chat
        .messages_after(user.id, project_id, params.after)
        .await?;
    Ok(Json(list_of::<_, ChatMessageResponse>(messages)))
}

#[utoipa::path(
    get,
    path = "/api/chat/projects/{id}/messages/latest",
    params(("id" = Uuid, Path, description = "Project id"), LatestParams),
    responses((status = 200, description = "The newest messages, oldest first", body = Vec<ChatMessageResponse>)),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn latest_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<LatestParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LATEST_LIMIT);
    let messages = state
        .chat
        .latest_messages(user.id, project_id, limit)
        .await?;
    Ok(Json(list_of::<_, ChatMessageResponse>(messages)))
}

#[utoipa::path(
    get,
    path = "/api/chat/projects/{id}/messages/count",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Messages in the project", body = CountResponse)),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn count_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(CountResponse {
        count: state.chat.count_messages(user.id, project_id).await?,
    }))
}

#[utoipa::path(
    get,
    path = "/api/chat/messages/{id}",
    params(("id" = i64, Path, description = "Message id")),
    responses(
        (status = 200, description = "The message", body = ChatMessageResponse),
        (status = 404, description = "Message not found", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn get_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.chat.get_message(user.id, id).await?;
    Ok(Json(ChatMessageResponse::from(message)))
}

#[utoipa::path(
    put,
    path = "/api/chat/messages/{id}",
    params(("id" = i64, Path, description = "Message id")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Edited message", body = ChatMessageResponse),
        (status = 403, description = "Sender only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn edit_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.chat.edit_message(user.id, id, &body.content).await?;
    Ok(Json(ChatMessageResponse::from(message)))
}

#[utoipa::path(
    delete,
    path = "/api/chat/messages/{id}",
    params(("id" = i64, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message deleted", body = MessageResponse),
        (status = 403, description = "Sender or lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.chat.delete_message(user.id, id).await?;
    Ok(Json(MessageResponse::new("Message deleted successfully")))
}
