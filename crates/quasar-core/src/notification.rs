use chrono::{DateTime, Utc};
use uuid::Uuid;

string_enum! {
    pub enum NotificationType {
        ProjectInvitation => "PROJECT_INVITATION",
        InvitationAccepted => "INVITATION_ACCEPTED",
        InvitationRejected => "INVITATION_REJECTED",
        MemberJoined => "MEMBER_JOINED",
        MemberLeft => "MEMBER_LEFT",
        ProjectUpdate => "PROJECT_UPDATE",
        TeamUpdate => "TEAM_UPDATE",
        Message => "MESSAGE",
        System => "SYSTEM",
    }
}

/// What a notification's `related_entity_id` points at.
pub const ENTITY_PROJECT: &str = "PROJECT";
pub const ENTITY_INVITATION: &str = "INVITATION";
pub const ENTITY_JOIN_REQUEST: &str = "JOIN_REQUEST";
pub const ENTITY_TASK: &str = "TASK";
pub const ENTITY_MESSAGE: &str = "MESSAGE";

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
}

impl NewNotification {
    fn about(
        user_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        message: String,
        entity: Option<(String, &str)>,
    ) -> Self {
        let (related_entity_id, related_entity_type) = match entity {
            Some((id, kind)) => (Some(id), Some(kind.to_string())),
            None => (None, None),
        };
        Self {
            user_id,
            title: title.to_string(),
            message,
            notification_type,
            related_entity_id,
            related_entity_type,
        }
    }

    pub fn project_invitation(
        user_id: Uuid,
        project_title: &str,
        inviter_name: &str,
        invitation_id: i64,
    ) -> Self {
        Self::about(
            user_id,
            NotificationType::ProjectInvitation,
            "Project Invitation",
            format!("You have been invited to join the project '{project_title}' by {inviter_name}"),
            Some((invitation_id.to_string(), ENTITY_INVITATION)),
        )
    }

    pub fn invitation_accepted(
        user_id: Uuid,
        member_name: &str,
        project_title: &str,
        project_id: Uuid,
    ) -> Self {
        Self::about(
            user_id,
            NotificationType::InvitationAccepted,
            "Invitation Accepted",
            format!("{member_name} has accepted your invitation to join '{project_title}'"),
            Some((project_id.to_string(), ENTITY_PROJECT)),
        )
    }

    pub fn invitation_rejected(
        user_id: Uuid,
        member_name: &str,
        project_title: &str,
        project_id: Uuid,
    ) -> Self {
        Self::about(
            user_id,
            NotificationType::InvitationRejected,
            "Invitation Declined",
            format!("{member_name} has declined your invitation to join '{project_title}'"),
            Some((project_id.to_string(), ENTITY_PROJECT)),
        )
    }

    pub fn member_joined(
        user_id: Uuid,
        member_name: &str,
        project_title: &str,
        project_id: Uuid,
    ) -> Self {
        Self::about(
            user_id,
            NotificationType::MemberJoined,
            "New Team Member",
            format!("{member_name} has joined the project '{project_title}'"),
            Some((project_id.to_string(), ENTITY_PROJECT)),
        )
    }

    pub fn member_left(
        user_id: Uuid,
        member_name: &str,
        project_title: &str,
        project_id: Uuid,
    ) -> Self {
        Self::about(
            user_id,
            NotificationType::MemberLeft,
            "Team Member Left",
            format!("{member_name} has left the project '{project_title}'"),
            Some((project_id.to_string(), ENTITY_PROJECT)),
        )
    }

    pub fn join_request_received(
        user_id: Uuid,
        requester_name: &str,
        project_title: &str,
        request_id: i64,
    ) -> Self {
        Self::about(
            user_id,
            NotificationType::TeamUpdate,
            "New Join Request",
            format!("{requester_name} wants to join your project '{project_title}'"),
            Some((request_id.to_string(), ENTITY_JOIN_REQUEST)),
        )
    }

    pub fn join_request_resolved(
        user_id: Uuid,
        project_title: &str,
        project_id: Uuid,
        accepted: bool,
    ) -> Self {
        let (title, message) = if accepted {
            (
                "Join Request Accepted",
                format!("Your request to join '{project_title}' has been accepted"),
            )
        } else {
            (
                "Join Request Declined",
                format!("Your request to join '{project_title}' has been declined"),
            )
        };
        Self::about(
            user_id,
            NotificationType::TeamUpdate,
            title,
            message,
            Some((project_id.to_string(), ENTITY_PROJECT)),
        )
    }

    pub fn project_update(
        user_id: Uuid,
        project_title: &str,
        update: &str,
        project_id: Uuid,
    ) -> Self {
        Self::about(
            user_id,
            NotificationType::ProjectUpdate,
            "Project Update",
            format!("Update in project '{project_title}': {update}"),
            Some((project_id.to_string(), ENTITY_PROJECT)),
        )
    }

    pub fn task_assigned(user_id: Uuid, task_title: &str, project_title: &str, task_id: i64) -> Self {
        Self::about(
            user_id,
            NotificationType::TeamUpdate,
            "Task Assigned",
            format!("You have been assigned the task '{task_title}' in project '{project_title}'"),
            Some((task_id.to_string(), ENTITY_TASK)),
        )
    }

    pub fn new_message(
        user_id: Uuid,
        sender_name: &str,
        project_title: &str,
        message_id: i64,
    ) -> Self {
        Self::about(
            user_id,
            NotificationType::Message,
            "New Message",
            format!("You have a new message from {sender_name} in project '{project_title}'"),
            Some((message_id.to_string(), ENTITY_MESSAGE)),
        )
    }

    pub fn system(user_id: Uuid, title: &str, message: &str) -> Self {
        Self::about(
            user_id,
            NotificationType::System,
            title,
            message.to_string(),
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_message_template() {
        let user = Uuid::new_v4();
        let n = NewNotification::project_invitation(user, "Campus Connect", "Ada Lovelace", 42);
        assert_eq!(
            n.message,
            "You have been invited to join the project 'Campus Connect' by Ada Lovelace"
        );
        assert_eq!(n.notification_type, NotificationType::ProjectInvitation);
        assert_eq!(n.related_entity_id.as_deref(), Some("42"));
        assert_eq!(n.related_entity_type.as_deref(), Some("INVITATION"));
    }

    #[test]
    fn test_system_notification_has_no_entity() {
        let n = NewNotification::system(Uuid::new_v4(), "Welcome", "Hello there");
        assert_eq!(n.related_entity_id, None);
        assert_eq!(n.related_entity_type, None);
        assert_eq!(n.notification_type, NotificationType::System);
    }

    #[test]
    fn test_type_roundtrip() {
        for t in NotificationType::ALL {
            assert_eq!(t.as_str().parse::<NotificationType>(), Ok(*t));
        }
    }
}
