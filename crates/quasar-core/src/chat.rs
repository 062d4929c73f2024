use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::constants::CHAT_MESSAGE_MAX_LENGTH;
use crate::error::AppError;

string_enum! {
    pub enum MessageType {
        Text => "TEXT",
        System => "SYSTEM",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub project_id: Uuid,
    /// `None` for system messages.
    pub sender_id: Option<Uuid>,
    pub sender_name: Option<String>,
    pub content: String,
    pub message_type: MessageType,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub project_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub content: String,
    pub message_type: MessageType,
}

/// Trim and check message content; returns the trimmed text.
pub fn clean_content(content: &str) -> Result<String, AppError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_field(
            "content",
            "Message content is required",
        ));
    }
    if trimmed.chars().count() > CHAT_MESSAGE_MAX_LENGTH {
        return Err(AppError::invalid_field(
            "content",
            format!("Message must not exceed {CHAT_MESSAGE_MAX_LENGTH} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_content() {
        assert_eq!(clean_content("  hello team ").unwrap(), "hello team");
        assert!(matches!(clean_content("   "), Err(AppError::Validation(_))));
        assert!(clean_content(&"x".repeat(1001)).is_err());
        assert!(clean_content(&"x".repeat(1000)).is_ok());
    }
}
