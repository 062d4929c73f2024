use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quasar_core::chat::{ChatMessage, MessageType};
use quasar_core::events::{ChatEvent, ChatEventKind};
use quasar_core::notification::{Notification, NotificationType};

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "PROJECT_INVITATION")]
    pub notification_type: NotificationType,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            notification_type: n.notification_type,
            related_entity_id: n.related_entity_id,
            related_entity_type: n.related_entity_type,
            is_read: n.is_read,
            read_at: n.read_at,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationListParams {
    #[serde(rename = "type")]
    #[param(value_type = Option<String>)]
    pub notification_type: Option<NotificationType>,
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub id: i64,
    pub project_id: Uuid,
    /// Absent on system messages.
    pub sender_id: Option<Uuid>,
    pub sender_name: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "TEXT")]
    pub message_type: MessageType,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub sent_at: DateTime<Utc>,
}

impl From<ChatMessage> for ChatMessageResponse {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            project_id: m.project_id,
            sender_id: m.sender_id,
            sender_name: m.sender_name,
            content: m.content,
            message_type: m.message_type,
            is_edited: m.is_edited,
            edited_at: m.edited_at,
            sent_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AfterParams {
    /// RFC 3339 timestamp; messages strictly after it are returned.
    pub after: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestParams {
    /// 1 to 100, default 50.
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessageSearchParams {
    #[serde(default)]
    pub query: String,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// Frame pushed to `/ws/chat/{projectId}` subscribers.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatEventResponse {
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "CREATED")]
    pub kind: ChatEventKind,
    pub project_id: Uuid,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessageResponse>,
}

impl ChatEventResponse {
    pub fn new(project_id: Uuid, event: ChatEvent) -> Self {
        let kind = event.kind();
        let (message_id, message) = match event {
            ChatEvent::Created(m) | ChatEvent::Edited(m) => (m.id, Some(m.into())),
            ChatEvent::Deleted { message_id } => (message_id, None),
        };
        Self {
            kind,
            project_id,
            message_id,
            message,
        }
    }
}

/// Frame a chat socket client sends to post a message.
#[derive(Debug, Deserialize)]
pub struct IncomingChatFrame {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ChatMessage {
        ChatMessage {
            id: 7,
            project_id: Uuid::new_v4(),
            sender_id: None,
            sender_name: None,
            content: "Ada joined the team".into(),
            message_type: MessageType::System,
            is_edited: false,
            edited_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_chat_message_renames_type() {
        let json = serde_json::to_value(ChatMessageResponse::from(message())).unwrap();
        assert_eq!(json["type"], "SYSTEM");
        assert!(json["senderId"].is_null());
        assert!(json.get("sentAt").is_some());
    }

    #[test]
    fn test_chat_event_frames() {
        let msg = message();
        let project_id = msg.project_id;

        let created = ChatEventResponse::new(project_id, ChatEvent::Created(msg));
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["type"], "CREATED");
        assert_eq!(json["messageId"], 7);
        assert_eq!(json["message"]["content"], "Ada joined the team");

        let deleted = ChatEventResponse::new(project_id, ChatEvent::Deleted { message_id: 7 });
        let json = serde_json::to_value(&deleted).unwrap();
        assert_eq!(json["type"], "DELETED");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_notification_list_params_accept_lowercase_type() {
        let params: NotificationListParams =
            serde_json::from_str(r#"{"type":"member_joined","unreadOnly":true}"#).unwrap();
        assert_eq!(params.notification_type, Some(NotificationType::MemberJoined));
        assert!(params.unread_only);
    }
}
