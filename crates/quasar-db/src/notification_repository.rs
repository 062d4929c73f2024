use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use quasar_core::constants::messages;
use quasar_core::error::AppError;
use quasar_core::notification::{NewNotification, Notification, NotificationType};
use quasar_core::page::{Page, PageRequest};
use quasar_core::traits::NotificationStore;

use crate::support::db_err;

/// Repository for user notifications.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: Pool<Postgres>,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    user_id: Uuid,
    title: String,
    message: String,
    notification_type: String,
    related_entity_id: Option<String>,
    related_entity_type: Option<String>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            message: row.message,
            notification_type: row
                .notification_type
                .parse()
                .unwrap_or(NotificationType::System),
            related_entity_id: row.related_entity_id,
            related_entity_type: row.related_entity_type,
            is_read: row.is_read,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

/// Shared WHERE clause for listing: $1 user, $2 optional type, $3 unread only.
const LIST_FILTER: &str = "user_id = $1 AND ($2::TEXT IS NULL OR notification_type = $2) \
                           AND (NOT $3 OR is_read = FALSE)";

impl NotificationStore for NotificationRepository {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, AppError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications
                (user_id, title, message, notification_type, related_entity_id, related_entity_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.notification_type.as_str())
        .bind(&notification.related_entity_id)
        .bind(&notification.related_entity_type)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn find_notification(&self, id: i64) -> Result<Option<Notification>, AppError> {
        let row = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        kind: Option<NotificationType>,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        let kind = kind.map(|k| k.as_str());

        let count_sql = format!("SELECT COUNT(*) FROM notifications WHERE {LIST_FILTER}");
        let (total,): (i64,) = sqlx::query_as(&count_sql)
            .bind(user_id)
            .bind(kind)
            .bind(unread_only)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let sql = format!(
            "SELECT * FROM notifications WHERE {LIST_FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(user_id)
            .bind(kind)
            .bind(unread_only)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }

    async fn unread_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND is_read = FALSE AND created_at >= $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(count)
    }

    async fn mark_read(&self, id: i64, at: DateTime<Utc>) -> Result<Notification, AppError> {
        // Re-reading keeps the first read timestamp.
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, $2)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(messages::NOTIFICATION_NOT_FOUND.into()))
    }

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 \
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_all_notifications(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn delete_notifications_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}
