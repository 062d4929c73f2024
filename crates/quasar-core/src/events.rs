use serde::Serialize;
use uuid::Uuid;

use crate::chat::ChatMessage;
use crate::notification::Notification;

/// Something connected clients may want to hear about right away.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    Notification(Notification),
    Chat { project_id: Uuid, event: ChatEvent },
    /// `user_id` left the team or was removed from it.
    MemberRemoved { project_id: Uuid, user_id: Uuid },
}

impl DomainEvent {
    /// The user a notification event is addressed to.
    pub fn recipient(&self) -> Option<Uuid> {
        match self {
            DomainEvent::Notification(n) => Some(n.user_id),
            DomainEvent::Chat { .. } | DomainEvent::MemberRemoved { .. } => None,
        }
    }

    pub fn chat_project(&self) -> Option<Uuid> {
        match self {
            DomainEvent::Chat { project_id, .. } => Some(*project_id),
            DomainEvent::Notification(_) | DomainEvent::MemberRemoved { .. } => None,
        }
    }

    /// Whether this event takes `user_id` out of `project_id`.
    pub fn removes(&self, project_id: Uuid, user_id: Uuid) -> bool {
        matches!(
            self,
            DomainEvent::MemberRemoved { project_id: p, user_id: u }
                if *p == project_id && *u == user_id
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Created(ChatMessage),
    Edited(ChatMessage),
    Deleted { message_id: i64 },
}

impl ChatEvent {
    pub fn kind(&self) -> ChatEventKind {
        match self {
            ChatEvent::Created(_) => ChatEventKind::Created,
            ChatEvent::Edited(_) => ChatEventKind::Edited,
            ChatEvent::Deleted { .. } => ChatEventKind::Deleted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatEventKind {
    Created,
    Edited,
    Deleted,
}
