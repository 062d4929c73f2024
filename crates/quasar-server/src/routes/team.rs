//! Invitations (lead to user) and join requests (user to lead).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use uuid::Uuid;

use quasar_core::team::InvitationInput;

use super::ApiRouter;
use crate::auth::AuthUser;
use crate::dto::{
    InvitationRequest, InvitationResponse, InvitationStatusParams, JoinRequestRequest,
    JoinRequestResponse, MemberResponse, MessageResponse, RespondParams, list_of,
};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route("/api/teams/{projectId}/invitations", post(send_invitation))
        .route("/api/invitations/received", get(received_invitations))
        .route("/api/invitations/pending", get(pending_invitations))
        .route("/api/invitations/sent", get(sent_invitations))
        .route("/api/invitations/{id}/respond", put(respond_to_invitation))
        .route("/api/invitations/{id}/cancel", put(cancel_invitation))
        .route("/api/projects/{id}/invitations", get(project_invitations))
        .route(
            "/api/projects/{id}/join-requests",
            get(project_join_requests).post(request_to_join),
        )
        .route("/api/join-requests/my-requests", get(my_join_requests))
        .route("/api/join-requests/{id}/accept", put(accept_join_request))
        .route("/api/join-requests/{id}/reject", put(reject_join_request))
        .route("/api/join-requests/{id}/cancel", delete(cancel_join_request))
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/teams/{projectId}/invitations",
    params(("projectId" = Uuid, Path, description = "Project id")),
    request_body = InvitationRequest,
    responses(
        (status = 201, description = "Invitation sent", body = InvitationResponse),
        (status = 403, description = "Lead only", body = crate::dto::ErrorResponse),
        (status = 409, description = "Already a member or already invited", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn send_invitation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Json(body): Json<InvitationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = InvitationInput::try_from(body)?;
    let invitation = state.team.invite(&user, project_id, input).await?;
    Ok((StatusCode::CREATED, Json(InvitationResponse::from(invitation))))
}

#[utoipa::path(
    put,
    path = "/api/invitations/{id}/respond",
    params(("id" = i64, Path, description = "Invitation id"), RespondParams),
    responses(
        (status = 200, description = "Invitation answered", body = InvitationResponse),
        (status = 400, description = "Already answered or expired", body = crate::dto::ErrorResponse),
        (status = 403, description = "Not the invitee", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn respond_to_invitation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<RespondParams>,
) -> Result<impl IntoResponse, ApiError> {
    let invitation = state.team.respond(&user, id, params.response).await?;
    Ok(Json(InvitationResponse::from(invitation)))
}

#[utoipa::path(
    put,
    path = "/api/invitations/{id}/cancel",
    params(("id" = i64, Path, description = "Invitation id")),
    responses(
        (status = 200, description = "Invitation cancelled", body = MessageResponse),
        (status = 403, description = "Inviter or lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn cancel_invitation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.team.cancel_invitation(user.id, id).await?;
    Ok(Json(MessageResponse::new("Invitation cancelled successfully")))
}

#[utoipa::path(
    get,
    path = "/api/invitations/received",
    params(InvitationStatusParams),
    responses((status = 200, description = "Invitations addressed to the caller", body = Vec<InvitationResponse>)),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn received_invitations(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(params): Query<InvitationStatusParams>,
) -> Result<impl IntoResponse, ApiError> {
    let invitations = state
        .team
        .received_invitations(user.id, params.status)
        .await?;
    Ok(Json(list_of::<_, InvitationResponse>(invitations)))
}

#[utoipa::path(
    get,
    path = "/api/invitations/pending",
    responses((status = 200, description = "Invitations the caller can still answer", body = Vec<InvitationResponse>)),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn pending_invitations(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let invitations = state.team.pending_invitations(user.id).await?;
    Ok(Json(list_of::<_, InvitationResponse>(invitations)))
}

#[utoipa::path(
    get,
    path = "/api/invitations/sent",
    responses((status = 200, description = "Invitations the caller sent", body = Vec<InvitationResponse>)),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn sent_invitations(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let invitations = state.team.sent_invitations(user.id).await?;
    Ok(Json(list_of::<_, InvitationResponse>(invitations)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/invitations",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "All invitations of the project", body = Vec<InvitationResponse>),
        (status = 403, description = "Lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn project_invitations(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invitations = state.team.project_invitations(user.id, project_id).await?;
    Ok(Json(list_of::<_, InvitationResponse>(invitations)))
}

// ---------------------------------------------------------------------------
// Join requests
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/projects/{id}/join-requests",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = JoinRequestRequest,
    responses(
        (status = 201, description = "Request sent to the lead", body = JoinRequestResponse),
        (status = 400, description = "Project not recruiting or full", body = crate::dto::ErrorResponse),
        (status = 409, description = "Already a member or already requested", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn request_to_join(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Json(body): Json<JoinRequestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .team
        .request_to_join(&user, project_id, body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(JoinRequestResponse::from(request))))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/join-requests",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Join requests for the project", body = Vec<JoinRequestResponse>),
        (status = 403, description = "Lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn project_join_requests(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state
        .team
        .project_join_requests(user.id, project_id)
        .await?;
    Ok(Json(list_of::<_, JoinRequestResponse>(requests)))
}

#[utoipa::path(
    put,
    path = "/api/join-requests/{id}/accept",
    params(("id" = i64, Path, description = "Join request id")),
    responses(
        (status = 200, description = "Requester joined the team", body = MemberResponse),
        (status = 400, description = "Already answered or team full", body = crate::dto::ErrorResponse),
        (status = 403, description = "Lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn accept_join_request(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state.team.accept_join_request(user.id, id).await?;
    Ok(Json(MemberResponse::from(member)))
}

#[utoipa::path(
    put,
    path = "/api/join-requests/{id}/reject",
    params(("id" = i64, Path, description = "Join request id")),
    responses(
        (status = 200, description = "Request rejected", body = JoinRequestResponse),
        (status = 403, description = "Lead only", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn reject_join_request(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state.team.reject_join_request(user.id, id).await?;
    Ok(Json(JoinRequestResponse::from(request)))
}

#[utoipa::path(
    delete,
    path = "/api/join-requests/{id}/cancel",
    params(("id" = i64, Path, description = "Join request id")),
    responses(
        (status = 200, description = "Request withdrawn", body = MessageResponse),
        (status = 403, description = "Not your request", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn cancel_join_request(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.team.cancel_join_request(user.id, id).await?;
    Ok(Json(MessageResponse::new("Join request cancelled successfully")))
}

#[utoipa::path(
    get,
    path = "/api/join-requests/my-requests",
    responses((status = 200, description = "The caller's join requests", body = Vec<JoinRequestResponse>)),
    security(("bearer" = [])),
    tag = "team"
)]
pub async fn my_join_requests(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state.team.my_join_requests(user.id).await?;
    Ok(Json(list_of::<_, JoinRequestResponse>(requests)))
}
