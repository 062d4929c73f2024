use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use super::{
    NotificationService, load_project, load_user, require_lead, require_not_member,
    require_open_seat,
};
use crate::constants::messages;
use crate::error::AppError;
use crate::notification::NewNotification;
use crate::project::{Project, ProjectMember, ProjectRole};
use crate::team::{
    Invitation, InvitationInput, InvitationStatus, JoinRequest, NewInvitation,
    validate_request_message,
};
use crate::traits::{EventSink, NotificationStore, ProjectStore, TeamStore, UserStore};
use crate::user::User;
use crate::validation::normalize_optional;

pub const DEFAULT_INVITATION_TTL_DAYS: i64 = 7;

/// Invitations sent by leads and join requests sent by students.
#[derive(Clone)]
pub struct TeamService<P, U, T, N, E>
where
    P: ProjectStore,
    U: UserStore,
    T: TeamStore,
    N: NotificationStore,
    E: EventSink,
{
    projects: P,
    users: U,
    team: T,
    notifier: NotificationService<N, E>,
    invitation_ttl: TimeDelta,
}

impl<P, U, T, N, E> TeamService<P, U, T, N, E>
where
    P: ProjectStore,
    U: UserStore,
    T: TeamStore,
    N: NotificationStore,
    E: EventSink,
{
    pub fn new(projects: P, users: U, team: T, notifier: NotificationService<N, E>) -> Self {
        Self {
            projects,
            users,
            team,
            notifier,
            invitation_ttl: TimeDelta::days(DEFAULT_INVITATION_TTL_DAYS),
        }
    }

    pub fn with_invitation_ttl(mut self, ttl: TimeDelta) -> Self {
        self.invitation_ttl = ttl;
        self
    }

    // ----- Invitations -----

    pub async fn invite(
        &self,
        inviter: &User,
        project_id: Uuid,
        input: InvitationInput,
    ) -> Result<Invitation, AppError> {
        input.validate()?;
        let project = load_project(&self.projects, project_id).await?;
        require_lead(&project, inviter.id, "invite members")?;
        require_open_seat(&project)?;
        load_user(&self.users, input.invited_user_id).await?;
        require_not_member(&self.projects, project_id, input.invited_user_id).await?;

        if let Some(pending) = self
            .team
            .find_pending_invitation(project_id, input.invited_user_id)
            .await?
        {
            if pending.is_expired_at(Utc::now()) {
                self.team
                    .resolve_invitation(pending.id, InvitationStatus::Expired)
                    .await?;
            } else {
                return Err(AppError::Conflict(messages::INVITATION_ALREADY_SENT.into()));
            }
        }

        let invitation = self
            .team
            .create_invitation(&NewInvitation {
                project_id,
                invited_user_id: input.invited_user_id,
                invited_by_id: inviter.id,
                role: input.role.unwrap_or(ProjectRole::Member),
                message: normalize_optional(input.message),
                expires_at: Utc::now() + self.invitation_ttl,
            })
            .await?;
        tracing::info!(
            invitation_id = invitation.id,
            %project_id,
            invited_user_id = %invitation.invited_user_id,
            "Sent invitation"
        );

        self.notifier
            .send(NewNotification::project_invitation(
                invitation.invited_user_id,
                &project.title,
                &inviter.full_name(),
                invitation.id,
            ))
            .await;
        Ok(invitation)
    }

    /// Accept or reject. Only the invitee may answer, and only while the
    /// invitation is pending and unexpired.
    pub async fn respond(
        &self,
        user: &User,
        invitation_id: i64,
        response: InvitationStatus,
    ) -> Result<Invitation, AppError> {
        let invitation = self.load_invitation(invitation_id).await?;
        if invitation.invited_user_id != user.id {
            return Err(AppError::Forbidden(
                "only the invited user can respond to this invitation".into(),
            ));
        }
        if !invitation.status.can_respond() {
            return Err(AppError::BadRequest(
                "Invitation has already been responded to".into(),
            ));
        }
        if invitation.is_expired_at(Utc::now()) {
            self.team
                .resolve_invitation(invitation_id, InvitationStatus::Expired)
                .await?;
            return Err(AppError::BadRequest("Invitation has expired".into()));
        }

        let project = load_project(&self.projects, invitation.project_id).await?;
        let name = user.full_name();
        match response {
            InvitationStatus::Accepted => {
                require_open_seat(&project)?;
                require_not_member(&self.projects, project.id, user.id).await?;
                self.team.accept_invitation(invitation_id).await?;
                tracing::info!(invitation_id, project_id = %project.id, "Invitation accepted");

                self.notifier
                    .send(NewNotification::invitation_accepted(
                        invitation.invited_by_id,
                        &name,
                        &project.title,
                        project.id,
                    ))
                    .await;
                self.announce_new_member(&project, user.id, &[invitation.invited_by_id])
                    .await?;
            }
            InvitationStatus::Rejected => {
                self.team
                    .resolve_invitation(invitation_id, InvitationStatus::Rejected)
                    .await?;
                tracing::info!(invitation_id, project_id = %project.id, "Invitation rejected");
                self.notifier
                    .send(NewNotification::invitation_rejected(
                        invitation.invited_by_id,
                        &name,
                        &project.title,
                        project.id,
                    ))
                    .await;
            }
            other => {
                return Err(AppError::BadRequest(format!(
                    "Response must be ACCEPTED or REJECTED, got {other}"
                )));
            }
        }
        self.load_invitation(invitation_id).await
    }

    /// The inviter or the lead withdraws a pending invitation.
    pub async fn cancel_invitation(&self, actor_id: Uuid, invitation_id: i64) -> Result<(), AppError> {
        let invitation = self.load_invitation(invitation_id).await?;
        let project = load_project(&self.projects, invitation.project_id).await?;
        if invitation.invited_by_id != actor_id && !project.is_lead(actor_id) {
            return Err(AppError::Forbidden(
                "only the inviter or the project lead can cancel this invitation".into(),
            ));
        }
        if !invitation.status.can_respond() {
            return Err(AppError::BadRequest(
                "Only pending invitations can be cancelled".into(),
            ));
        }
        self.team
            .resolve_invitation(invitation_id, InvitationStatus::Rejected)
            .await?;
        tracing::info!(invitation_id, "Invitation cancelled");
        Ok(())
    }

    pub async fn project_invitations(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Invitation>, AppError> {
        let project = load_project(&self.projects, project_id).await?;
        require_lead(&project, actor_id, "view the project's invitations")?;
        self.team.project_invitations(project_id).await
    }

    pub async fn received_invitations(
        &self,
        user_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        self.team.received_invitations(user_id, status).await
    }

    /// Pending invitations that can still be answered.
    pub async fn pending_invitations(&self, user_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let now = Utc::now();
        let mut invitations = self
            .team
            .received_invitations(user_id, Some(InvitationStatus::Pending))
            .await?;
        invitations.retain(|i| !i.is_expired_at(now));
        Ok(invitations)
    }

    pub async fn sent_invitations(&self, user_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        self.team.sent_invitations(user_id).await
    }

    /// Mark pending invitations past their deadline as EXPIRED.
    pub async fn expire_invitations(&self) -> Result<u64, AppError> {
        self.team.expire_invitations(Utc::now()).await
    }

    // ----- Join requests -----

    pub async fn request_to_join(
        &self,
        user: &User,
        project_id: Uuid,
        message: Option<String>,
    ) -> Result<JoinRequest, AppError> {
        validate_request_message(message.as_deref())?;
        let project = load_project(&self.projects, project_id).await?;
        require_not_member(&self.projects, project_id, user.id).await?;
        require_open_seat(&project)?;
        if self
            .team
            .find_pending_join_request(project_id, user.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(messages::JOIN_REQUEST_ALREADY_SENT.into()));
        }

        let message = normalize_optional(message);
        let request = self
            .team
            .create_join_request(project_id, user.id, message.as_deref())
            .await?;
        tracing::info!(request_id = request.id, %project_id, user_id = %user.id, "Join request sent");

        self.notifier
            .send(NewNotification::join_request_received(
                project.lead_id,
                &user.full_name(),
                &project.title,
                request.id,
            ))
            .await;
        Ok(request)
    }

    pub async fn accept_join_request(
        &self,
        actor_id: Uuid,
        request_id: i64,
    ) -> Result<ProjectMember, AppError> {
        let (request, project) = self.pending_request_for_lead(actor_id, request_id).await?;
        require_open_seat(&project)?;
        require_not_member(&self.projects, project.id, request.user_id).await?;

        let member = self.team.accept_join_request(request_id).await?;
        tracing::info!(request_id, project_id = %project.id, "Join request accepted");

        self.notifier
            .send(NewNotification::join_request_resolved(
                request.user_id,
                &project.title,
                project.id,
                true,
            ))
            .await;
        self.announce_new_member(&project, request.user_id, &[actor_id])
            .await?;
        Ok(member)
    }

    pub async fn reject_join_request(
        &self,
        actor_id: Uuid,
        request_id: i64,
    ) -> Result<JoinRequest, AppError> {
        let (request, project) = self.pending_request_for_lead(actor_id, request_id).await?;
        let request = self
            .team
            .resolve_join_request(request.id, InvitationStatus::Rejected)
            .await?;
        tracing::info!(request_id, project_id = %project.id, "Join request rejected");

        self.notifier
            .send(NewNotification::join_request_resolved(
                request.user_id,
                &project.title,
                project.id,
                false,
            ))
            .await;
        Ok(request)
    }

    /// The requester withdraws a pending request; the row is deleted.
    pub async fn cancel_join_request(&self, user_id: Uuid, request_id: i64) -> Result<(), AppError> {
        let request = self.load_join_request(request_id).await?;
        if request.user_id != user_id {
            return Err(AppError::Forbidden(
                "you can only cancel your own join requests".into(),
            ));
        }
        if !request.status.can_respond() {
            return Err(AppError::BadRequest(
                "Only pending join requests can be cancelled".into(),
            ));
        }
        self.team.delete_join_request(request_id).await
    }

    pub async fn project_join_requests(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<JoinRequest>, AppError> {
        let project = load_project(&self.projects, project_id).await?;
        require_lead(&project, actor_id, "view join requests")?;
        self.team.project_join_requests(project_id).await
    }

    pub async fn my_join_requests(&self, user_id: Uuid) -> Result<Vec<JoinRequest>, AppError> {
        self.team.user_join_requests(user_id).await
    }

    async fn load_invitation(&self, id: i64) -> Result<Invitation, AppError> {
        self.team
            .find_invitation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::INVITATION_NOT_FOUND.into()))
    }

    async fn load_join_request(&self, id: i64) -> Result<JoinRequest, AppError> {
        self.team
            .find_join_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::JOIN_REQUEST_NOT_FOUND.into()))
    }

    async fn pending_request_for_lead(
        &self,
        actor_id: Uuid,
        request_id: i64,
    ) -> Result<(JoinRequest, Project), AppError> {
        let request = self.load_join_request(request_id).await?;
        let project = load_project(&self.projects, request.project_id).await?;
        require_lead(&project, actor_id, "answer join requests")?;
        if !request.status.can_respond() {
            return Err(AppError::BadRequest(
                "Join request has already been processed".into(),
            ));
        }
        Ok((request, project))
    }

    /// MEMBER_JOINED to everyone on the team except the newcomer and `except`.
    async fn announce_new_member(
        &self,
        project: &Project,
        new_member: Uuid,
        except: &[Uuid],
    ) -> Result<(), AppError> {
        let newcomer = load_user(&self.users, new_member).await?.full_name();
        for member in self.projects.project_members(project.id).await? {
            if member.user_id != new_member && !except.contains(&member.user_id) {
                self.notifier
                    .send(NewNotification::member_joined(
                        member.user_id,
                        &newcomer,
                        &project.title,
                        project.id,
                    ))
                    .await;
            }
        }
        Ok(())
    }
}
