use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use quasar_core::chat::{ChatMessage, MessageType, NewChatMessage};
use quasar_core::constants::messages;
use quasar_core::error::AppError;
use quasar_core::page::{Page, PageRequest};
use quasar_core::traits::ChatStore;

use crate::support::{db_err, like_pattern};

/// Repository for project chat messages.
#[derive(Clone)]
pub struct ChatRepository {
    pool: Pool<Postgres>,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn message_page(
        &self,
        project_id: Uuid,
        query: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<ChatMessage>, AppError> {
        let pattern = query.map(like_pattern);
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM chat_messages cm \
             WHERE cm.project_id = $1 AND ($2::TEXT IS NULL OR cm.content ILIKE $2)",
        )
        .bind(project_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let sql = format!(
            "{MESSAGE_SELECT} WHERE cm.project_id = $1 AND ($2::TEXT IS NULL OR cm.content ILIKE $2) \
             ORDER BY cm.created_at DESC, cm.id DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(project_id)
            .bind(&pattern)
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
}

const MESSAGE_SELECT: &str = r#"
    SELECT cm.id, cm.project_id, cm.sender_id,
           u.first_name || ' ' || u.last_name AS sender_name,
           cm.content, cm.message_type, cm.is_edited, cm.edited_at, cm.created_at
    FROM chat_messages cm
    LEFT JOIN users u ON u.id = cm.sender_id
"#;

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    project_id: Uuid,
    sender_id: Option<Uuid>,
    sender_name: Option<String>,
    content: String,
    message_type: String,
    is_edited: bool,
    edited_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            id: row.id,
            project_id: row.project_id,
            sender_id: row.sender_id,
            sender_name: row.sender_name,
            content: row.content,
            message_type: row.message_type.parse().unwrap_or(MessageType::Text),
            is_edited: row.is_edited,
            edited_at: row.edited_at,
            created_at: row.created_at,
        }
    }
}

impl ChatStore for ChatRepository {
    async fn create_message(&self, message: &NewChatMessage) -> Result<ChatMessage, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO chat_messages (project_id, sender_id, content, message_type) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(message.project_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        self.find_message(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::MESSAGE_NOT_FOUND.into()))
    }

    async fn find_message(&self, id: i64) -> Result<Option<ChatMessage>, AppError> {
        let sql = format!("{MESSAGE_SELECT} WHERE cm.id = $1");
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn edit_message(
        &self,
        id: i64,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<ChatMessage, AppError> {
        let result = sqlx::query(
            "UPDATE chat_messages SET content = $2, is_edited = TRUE, edited_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(content)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::MESSAGE_NOT_FOUND.into()));
        }

        self.find_message(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::MESSAGE_NOT_FOUND.into()))
    }

    async fn delete_message(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM chat_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_messages(
        &self,
        project_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<ChatMessage>, AppError> {
        self.message_page(project_id, None, page).await
    }

    async fn messages_after(
        &self,
        project_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let sql = format!(
            "{MESSAGE_SELECT} WHERE cm.project_id = $1 AND cm.created_at > $2 \
             ORDER BY cm.created_at, cm.id"
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(project_id)
            .bind(after)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_messages(
        &self,
        project_id: Uuid,
        query: &str,
        page: PageRequest,
    ) -> Result<Page<ChatMessage>, AppError> {
        self.message_page(project_id, Some(query), page).await
    }

    async fn latest_messages(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let sql = format!(
            "{MESSAGE_SELECT} WHERE cm.project_id = $1 \
             ORDER BY cm.created_at DESC, cm.id DESC LIMIT $2"
        );
        let mut rows: Vec<ChatMessage> = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(project_id)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Into::into)
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn count_messages(&self, project_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(count)
    }
}
