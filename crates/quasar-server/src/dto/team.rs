use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quasar_core::error::AppError;
use quasar_core::project::ProjectRole;
use quasar_core::team::{Invitation, InvitationInput, InvitationStatus, JoinRequest};

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRequest {
    pub invited_user_id: Option<Uuid>,
    /// Defaults to MEMBER.
    #[schema(value_type = Option<String>, example = "MEMBER")]
    pub role: Option<ProjectRole>,
    pub message: Option<String>,
}

impl TryFrom<InvitationRequest> for InvitationInput {
    type Error = AppError;

    fn try_from(r: InvitationRequest) -> Result<Self, Self::Error> {
        let invited_user_id = r
            .invited_user_id
            .ok_or_else(|| AppError::invalid_field("invitedUserId", "Invited user is required"))?;
        Ok(InvitationInput {
            invited_user_id,
            role: r.role,
            message: r.message,
        })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub id: i64,
    pub project_id: Uuid,
    pub project_title: String,
    pub invited_user_id: Uuid,
    pub invited_user_name: String,
    pub invited_by_id: Uuid,
    pub invited_by_name: String,
    #[schema(value_type = String, example = "MEMBER")]
    pub role: ProjectRole,
    pub message: Option<String>,
    #[schema(value_type = String, example = "PENDING")]
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl From<Invitation> for InvitationResponse {
    fn from(i: Invitation) -> Self {
        Self {
            id: i.id,
            project_id: i.project_id,
            project_title: i.project_title,
            invited_user_id: i.invited_user_id,
            invited_user_name: i.invited_user_name,
            invited_by_id: i.invited_by_id,
            invited_by_name: i.invited_by_name,
            role: i.role,
            message: i.message,
            status: i.status,
            created_at: i.created_at,
            responded_at: i.responded_at,
            expires_at: i.expires_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RespondParams {
    /// ACCEPTED or REJECTED.
    #[param(value_type = String, example = "ACCEPTED")]
    pub response: InvitationStatus,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvitationStatusParams {
    #[param(value_type = Option<String>)]
    pub status: Option<InvitationStatus>,
}

// ---------------------------------------------------------------------------
// Join requests
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct JoinRequestRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestResponse {
    pub id: i64,
    pub project_id: Uuid,
    pub project_title: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub message: Option<String>,
    #[schema(value_type = String, example = "PENDING")]
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl From<JoinRequest> for JoinRequestResponse {
    fn from(j: JoinRequest) -> Self {
        Self {
            id: j.id,
            project_id: j.project_id,
            project_title: j.project_title,
            user_id: j.user_id,
            user_name: j.user_name,
            message: j.message,
            status: j.status,
            created_at: j.created_at,
            responded_at: j.responded_at,
        }
    }
}
