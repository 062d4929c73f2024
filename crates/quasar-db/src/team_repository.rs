use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use quasar_core::constants::messages;
use quasar_core::error::AppError;
use quasar_core::project::{ProjectMember, ProjectRole};
use quasar_core::team::{Invitation, InvitationStatus, JoinRequest, NewInvitation};
use quasar_core::traits::TeamStore;

use crate::project_repository::{claim_seat, fetch_member, insert_member};
use crate::support::{conflict_or_db_err, db_err};

/// Repository for invitations and join requests.
#[derive(Clone)]
pub struct TeamRepository {
    pool: Pool<Postgres>,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn invitations_where(
        &self,
        condition: &str,
        id: Uuid,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        let sql = format!(
            "{INVITATION_SELECT} WHERE {condition} AND ($2::TEXT IS NULL OR i.status = $2) \
             ORDER BY i.created_at DESC, i.id DESC"
        );
        let rows = sqlx::query_as::<_, InvitationRow>(&sql)
            .bind(id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn join_requests_where(
        &self,
        condition: &str,
        id: Uuid,
    ) -> Result<Vec<JoinRequest>, AppError> {
        let sql = format!("{JOIN_REQUEST_SELECT} WHERE {condition} ORDER BY r.created_at DESC, r.id DESC");
        let rows = sqlx::query_as::<_, JoinRequestRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn load_invitation(&self, id: i64) -> Result<Invitation, AppError> {
        self.find_invitation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::INVITATION_NOT_FOUND.into()))
    }

    async fn load_join_request(&self, id: i64) -> Result<JoinRequest, AppError> {
        self.find_join_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::JOIN_REQUEST_NOT_FOUND.into()))
    }
}

const INVITATION_SELECT: &str = r#"
    SELECT i.id, i.project_id, p.title AS project_title,
           i.invited_user_id, iu.first_name || ' ' || iu.last_name AS invited_user_name,
           i.invited_by_id, ib.first_name || ' ' || ib.last_name AS invited_by_name,
           i.role, i.message, i.status, i.created_at, i.responded_at, i.expires_at
    FROM project_invitations i
    JOIN projects p ON p.id = i.project_id
    JOIN users iu ON iu.id = i.invited_user_id
    JOIN users ib ON ib.id = i.invited_by_id
"#;

const JOIN_REQUEST_SELECT: &str = r#"
    SELECT r.id, r.project_id, p.title AS project_title,
           r.user_id, u.first_name || ' ' || u.last_name AS user_name,
           r.message, r.status, r.created_at, r.responded_at
    FROM project_join_requests r
    JOIN projects p ON p.id = r.project_id
    JOIN users u ON u.id = r.user_id
"#;

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct InvitationRow {
    id: i64,
    project_id: Uuid,
    project_title: String,
    invited_user_id: Uuid,
    invited_user_name: String,
    invited_by_id: Uuid,
    invited_by_name: String,
    role: String,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
}

impl From<InvitationRow> for Invitation {
    fn from(row: InvitationRow) -> Self {
        Invitation {
            id: row.id,
            project_id: row.project_id,
            project_title: row.project_title,
            invited_user_id: row.invited_user_id,
            invited_user_name: row.invited_user_name,
            invited_by_id: row.invited_by_id,
            invited_by_name: row.invited_by_name,
            role: row.role.parse().unwrap_or(ProjectRole::Member),
            message: row.message,
            status: row.status.parse().unwrap_or(InvitationStatus::Pending),
            created_at: row.created_at,
            responded_at: row.responded_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct JoinRequestRow {
    id: i64,
    project_id: Uuid,
    project_title: String,
    user_id: Uuid,
    user_name: String,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl From<JoinRequestRow> for JoinRequest {
    fn from(row: JoinRequestRow) -> Self {
        JoinRequest {
            id: row.id,
            project_id: row.project_id,
            project_title: row.project_title,
            user_id: row.user_id,
            user_name: row.user_name,
            message: row.message,
            status: row.status.parse().unwrap_or(InvitationStatus::Pending),
            created_at: row.created_at,
            responded_at: row.responded_at,
        }
    }
}

impl TeamStore for TeamRepository {
    async fn create_invitation(&self, invitation: &NewInvitation) -> Result<Invitation, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO project_invitations
                (project_id, invited_user_id, invited_by_id, role, message, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(invitation.project_id)
        .bind(invitation.invited_user_id)
        .bind(invitation.invited_by_id)
        .bind(invitation.role.as_str())
        .bind(&invitation.message)
        .bind(invitation.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_db_err(e, messages::INVITATION_ALREADY_SENT))?;

        self.load_invitation(id).await
    }

    async fn find_invitation(&self, id: i64) -> Result<Option<Invitation>, AppError> {
        let sql = format!("{INVITATION_SELECT} WHERE i.id = $1");
        let row = sqlx::query_as::<_, InvitationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_pending_invitation(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Invitation>, AppError> {
        let sql = format!(
            "{INVITATION_SELECT} WHERE i.project_id = $1 AND i.invited_user_id = $2 \
             AND i.status = 'PENDING'"
        );
        let row = sqlx::query_as::<_, InvitationRow>(&sql)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn resolve_invitation(
        &self,
        id: i64,
        status: InvitationStatus,
    ) -> Result<Invitation, AppError> {
        let result = sqlx::query(
            "UPDATE project_invitations SET status = $2, responded_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::INVITATION_NOT_FOUND.into()));
        }
        self.load_invitation(id).await
    }

    async fn accept_invitation(&self, id: i64) -> Result<ProjectMember, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let accepted: Option<(Uuid, Uuid, String)> = sqlx::query_as(
            r#"
            UPDATE project_invitations SET status = 'ACCEPTED', responded_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING project_id, invited_user_id, role
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        let Some((project_id, user_id, role)) = accepted else {
            return Err(AppError::BadRequest(
                "Invitation has already been responded to".into(),
            ));
        };

        claim_seat(&mut tx, project_id).await?;
        let role = role.parse().unwrap_or(ProjectRole::Member);
        let member_id = insert_member(&mut tx, project_id, user_id, role).await?;
        tx.commit().await.map_err(db_err)?;

        fetch_member(&self.pool, member_id).await
    }

    async fn project_invitations(&self, project_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        self.invitations_where("i.project_id = $1", project_id, None)
            .await
    }

    async fn received_invitations(
        &self,
        user_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        self.invitations_where("i.invited_user_id = $1", user_id, status)
            .await
    }

    async fn sent_invitations(&self, user_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        self.invitations_where("i.invited_by_id = $1", user_id, None)
            .await
    }

    async fn expire_invitations(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE project_invitations SET status = 'EXPIRED' \
             WHERE status = 'PENDING' AND expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn create_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
    ) -> Result<JoinRequest, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO project_join_requests (project_id, user_id, message) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_db_err(e, messages::JOIN_REQUEST_ALREADY_SENT))?;

        self.load_join_request(id).await
    }

    async fn find_join_request(&self, id: i64) -> Result<Option<JoinRequest>, AppError> {
        let sql = format!("{JOIN_REQUEST_SELECT} WHERE r.id = $1");
        let row = sqlx::query_as::<_, JoinRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_pending_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<JoinRequest>, AppError> {
        let sql = format!(
            "{JOIN_REQUEST_SELECT} WHERE r.project_id = $1 AND r.user_id = $2 \
             AND r.status = 'PENDING'"
        );
        let row = sqlx::query_as::<_, JoinRequestRow>(&sql)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn resolve_join_request(
        &self,
        id: i64,
        status: InvitationStatus,
    ) -> Result<JoinRequest, AppError> {
        let result = sqlx::query(
            "UPDATE project_join_requests SET status = $2, responded_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::JOIN_REQUEST_NOT_FOUND.into()));
        }
        self.load_join_request(id).await
    }

    async fn accept_join_request(&self, id: i64) -> Result<ProjectMember, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let accepted: Option<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            UPDATE project_join_requests SET status = 'ACCEPTED', responded_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING project_id, user_id
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        let Some((project_id, user_id)) = accepted else {
            return Err(AppError::BadRequest(
                "Join request has already been processed".into(),
            ));
        };

        claim_seat(&mut tx, project_id).await?;
        let member_id = insert_member(&mut tx, project_id, user_id, ProjectRole::Member).await?;
        tx.commit().await.map_err(db_err)?;

        fetch_member(&self.pool, member_id).await
    }

    async fn delete_join_request(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM project_join_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn project_join_requests(&self, project_id: Uuid) -> Result<Vec<JoinRequest>, AppError> {
        self.join_requests_where("r.project_id = $1", project_id)
            .await
    }

    async fn user_join_requests(&self, user_id: Uuid) -> Result<Vec<JoinRequest>, AppError> {
        self.join_requests_where("r.user_id = $1", user_id).await
    }
}
