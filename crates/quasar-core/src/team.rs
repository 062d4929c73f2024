use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::constants::REQUEST_MESSAGE_MAX_LENGTH;
use crate::error::AppError;
use crate::project::ProjectRole;
use crate::validation::FieldErrors;

string_enum! {
    /// Resolution state shared by invitations and join requests.
    pub enum InvitationStatus {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
        Expired => "EXPIRED",
    }
}

impl InvitationStatus {
    pub fn can_respond(&self) -> bool {
        matches!(self, InvitationStatus::Pending)
    }

    pub fn is_final(&self) -> bool {
        !self.can_respond()
    }
}

/// An offer from a project lead to join the team.
#[derive(Debug, Clone, PartialEq)]
pub struct Invitation {
    pub id: i64,
    pub project_id: Uuid,
    pub project_title: String,
    pub invited_user_id: Uuid,
    pub invited_user_name: String,
    pub invited_by_id: Uuid,
    pub invited_by_name: String,
    pub role: ProjectRole,
    pub message: Option<String>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl Invitation {
    /// Still pending but past its deadline; the sweeper has not caught it yet.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && self.expires_at <= now
    }
}

/// Row to insert for a new invitation.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub project_id: Uuid,
    pub invited_user_id: Uuid,
    pub invited_by_id: Uuid,
    pub role: ProjectRole,
    pub message: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Lead's input when inviting someone.
#[derive(Debug, Clone)]
pub struct InvitationInput {
    pub invited_user_id: Uuid,
    /// Defaults to MEMBER.
    pub role: Option<ProjectRole>,
    pub message: Option<String>,
}

impl InvitationInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        if self.role == Some(ProjectRole::Lead) {
            errors.add("role", "A project can only have one lead");
        }
        errors.optional_length(
            "message",
            self.message.as_deref(),
            0,
            REQUEST_MESSAGE_MAX_LENGTH,
            "Message",
        );
        errors.into_result()
    }
}

/// A student's request to join a recruiting project.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub id: i64,
    pub project_id: Uuid,
    pub project_title: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub message: Option<String>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

pub fn validate_request_message(message: Option<&str>) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.optional_length("message", message, 0, REQUEST_MESSAGE_MAX_LENGTH, "Message");
    errors.into_result()
}
