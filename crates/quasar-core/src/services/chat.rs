use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use super::{load_project, require_member};
use crate::chat::{ChatMessage, MessageType, NewChatMessage, clean_content};
use crate::constants::messages;
use crate::error::AppError;
use crate::events::{ChatEvent, DomainEvent};
use crate::page::{Page, PageRequest};
use crate::traits::{ChatStore, EventSink, ProjectStore};

const RECENT_HOURS: i64 = 24;
pub const MAX_LATEST_MESSAGES: i64 = 100;

/// Per-project team chat.
#[derive(Clone)]
pub struct ChatService<P, C, E>
where
    P: ProjectStore,
    C: ChatStore,
    E: EventSink,
{
    projects: P,
    chat: C,
    sink: E,
}

impl<P, C, E> ChatService<P, C, E>
where
    P: ProjectStore,
    C: ChatStore,
    E: EventSink,
{
    pub fn new(projects: P, chat: C, sink: E) -> Self {
        Self {
            projects,
            chat,
            sink,
        }
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        project_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, AppError> {
        let content = clean_content(content)?;
        self.require_team(project_id, sender_id).await?;
        let message = self
            .chat
            .create_message(&NewChatMessage {
                project_id,
                sender_id: Some(sender_id),
                content,
                message_type: MessageType::Text,
            })
            .await?;
        tracing::debug!(message_id = message.id, %project_id, "Chat message sent");
        self.broadcast(project_id, ChatEvent::Created(message.clone()));
        Ok(message)
    }

    /// A sender-less message, e.g. announcing a new team member.
    pub async fn post_system_message(
        &self,
        project_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, AppError> {
        let content = clean_content(content)?;
        let message = self
            .chat
            .create_message(&NewChatMessage {
                project_id,
                sender_id: None,
                content,
                message_type: MessageType::System,
            })
            .await?;
        self.broadcast(project_id, ChatEvent::Created(message.clone()));
        Ok(message)
    }

    /// Senders may edit their own messages.
    pub async fn edit_message(
        &self,
        user_id: Uuid,
        id: i64,
        content: &str,
    ) -> Result<ChatMessage, AppError> {
        let content = clean_content(content)?;
        let message = self.load_message(id).await?;
        if message.sender_id != Some(user_id) {
            return Err(AppError::Forbidden(
                "you can only edit your own messages".into(),
            ));
        }
        let message = self.chat.edit_message(id, &content, Utc::now()).await?;
        self.broadcast(message.project_id, ChatEvent::Edited(message.clone()));
        Ok(message)
    }

    /// The sender or the project lead may delete.
    pub async fn delete_message(&self, user_id: Uuid, id: i64) -> Result<(), AppError> {
        let message = self.load_message(id).await?;
        let project = load_project(&self.projects, message.project_id).await?;
        if message.sender_id != Some(user_id) && !project.is_lead(user_id) {
            return Err(AppError::Forbidden(
                "only the sender or project lead can delete this message".into(),
            ));
        }
        self.chat.delete_message(id).await?;
        self.broadcast(project.id, ChatEvent::Deleted { message_id: id });
        Ok(())
    }

    pub async fn get_message(&self, user_id: Uuid, id: i64) -> Result<ChatMessage, AppError> {
        let message = self.load_message(id).await?;
        require_member(&self.projects, message.project_id, user_id).await?;
        Ok(message)
    }

    /// Newest first.
    pub async fn list_messages(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<ChatMessage>, AppError> {
        self.require_team(project_id, user_id).await?;
        self.chat.list_messages(project_id, page).await
    }

    /// Messages from the last day, oldest first.
    pub async fn recent_messages(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<ChatMessage>, AppError> {
        self.messages_after(user_id, project_id, Utc::now() - TimeDelta::hours(RECENT_HOURS))
            .await
    }

    pub async fn messages_after(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>, AppError> {
        self.require_team(project_id, user_id).await?;
        self.chat.messages_after(project_id, after).await
    }

    pub async fn search_messages(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        query: &str,
        page: PageRequest,
    ) -> Result<Page<ChatMessage>, AppError> {
        self.require_team(project_id, user_id).await?;
        let query = query.trim();
        if query.is_empty() {
            return self.chat.list_messages(project_id, page).await;
        }
        self.chat.search_messages(project_id, query, page).await
    }

    pub async fn latest_messages(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        self.require_team(project_id, user_id).await?;
        self.chat
            .latest_messages(project_id, limit.clamp(1, MAX_LATEST_MESSAGES))
            .await
    }

    pub async fn count_messages(&self, user_id: Uuid, project_id: Uuid) -> Result<i64, AppError> {
        self.require_team(project_id, user_id).await?;
        self.chat.count_messages(project_id).await
    }

    /// Whether `user_id` may follow the project's chat.
    pub async fn can_access(&self, user_id: Uuid, project_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .projects
            .find_membership(project_id, user_id)
            .await?
            .is_some())
    }

    async fn require_team(&self, project_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        load_project(&self.projects, project_id).await?;
        require_member(&self.projects, project_id, user_id).await?;
        Ok(())
    }

    async fn load_message(&self, id: i64) -> Result<ChatMessage, AppError> {
        self.chat
            .find_message(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::MESSAGE_NOT_FOUND.into()))
    }

    fn broadcast(&self, project_id: Uuid, event: ChatEvent) {
        self.sink.publish(DomainEvent::Chat { project_id, event });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChatEventKind;
    use crate::project::Project;
    use crate::services::{NotificationService, ProjectService, SkillService};
    use crate::testutil::{InMemoryStore, RecordingSink, sample_new_project, sample_new_user};
    use crate::user::User;

    struct Fixture {
        sink: RecordingSink,
        svc: ChatService<InMemoryStore, InMemoryStore, RecordingSink>,
        lead: User,
        member: User,
        outsider: User,
        project: Project,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let projects = ProjectService::new(
            store.clone(),
            store.clone(),
            SkillService::new(store.clone()),
            NotificationService::new(store.clone(), RecordingSink::new()),
        );
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let member = store.insert_user(sample_new_user("member@college.edu"));
        let outsider = store.insert_user(sample_new_user("outsider@college.edu"));
        let project = projects
            .create_project(&lead, sample_new_project())
            .await
            .unwrap();
        projects.add_member(lead.id, project.id, member.id).await.unwrap();
        let sink = RecordingSink::new();
        Fixture {
            svc: ChatService::new(store.clone(), store, sink.clone()),
            sink,
            lead,
            member,
            outsider,
            project,
        }
    }

    #[tokio::test]
    async fn send_trims_and_broadcasts() {
        let f = fixture().await;
        let message = f
            .svc
            .send_message(f.member.id, f.project.id, "  hello team  ")
            .await
            .unwrap();
        assert_eq!(message.content, "hello team");
        assert_eq!(message.message_type, MessageType::Text);
        assert_eq!(message.sender_name.as_deref(), Some(f.member.full_name().as_str()));

        let events = f.sink.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::Chat { project_id, event } => {
                assert_eq!(*project_id, f.project.id);
                assert_eq!(event.kind(), ChatEventKind::Created);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn outsiders_and_blank_messages_are_rejected() {
        let f = fixture().await;
        assert!(matches!(
            f.svc.send_message(f.outsider.id, f.project.id, "hi").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.svc.send_message(f.member.id, f.project.id, "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(!f.svc.can_access(f.outsider.id, f.project.id).await.unwrap());
        assert!(f.svc.can_access(f.lead.id, f.project.id).await.unwrap());
    }

    #[tokio::test]
    async fn edit_own_only_and_delete_by_lead() {
        let f = fixture().await;
        let message = f
            .svc
            .send_message(f.member.id, f.project.id, "frist")
            .await
            .unwrap();

        assert!(matches!(
            f.svc.edit_message(f.lead.id, message.id, "first").await,
            Err(AppError::Forbidden(_))
        ));
        let edited = f.svc.edit_message(f.member.id, message.id, "first").await.unwrap();
        assert!(edited.is_edited);
        assert!(edited.edited_at.is_some());

        f.svc.delete_message(f.lead.id, message.id).await.unwrap();
        assert!(matches!(
            f.svc.get_message(f.lead.id, message.id).await,
            Err(AppError::NotFound(_))
        ));
        let kinds: Vec<_> = f.sink.events().iter().filter_map(|e| match e {
            DomainEvent::Chat { event, .. } => Some(event.kind()),
            _ => None,
        }).collect();
        assert_eq!(
            kinds,
            vec![ChatEventKind::Created, ChatEventKind::Edited, ChatEventKind::Deleted]
        );
    }

    #[tokio::test]
    async fn system_messages_have_no_sender() {
        let f = fixture().await;
        let message = f
            .svc
            .post_system_message(f.project.id, "Grace joined the team")
            .await
            .unwrap();
        assert_eq!(message.sender_id, None);
        assert_eq!(message.message_type, MessageType::System);
        assert!(matches!(
            f.svc.edit_message(f.member.id, message.id, "x").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn history_queries() {
        let f = fixture().await;
        for text in ["one", "two", "three: deploy"] {
            f.svc.send_message(f.member.id, f.project.id, text).await.unwrap();
        }

        let page = f
            .svc
            .list_messages(f.lead.id, f.project.id, PageRequest::with_default_size(None, None, 50))
            .await
            .unwrap();
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.page_size, 50);
        assert_eq!(page.content[0].content, "three: deploy");

        let latest = f.svc.latest_messages(f.lead.id, f.project.id, 2).await.unwrap();
        let texts: Vec<_> = latest.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["two", "three: deploy"]);

        assert_eq!(f.svc.recent_messages(f.lead.id, f.project.id).await.unwrap().len(), 3);
        assert_eq!(f.svc.count_messages(f.lead.id, f.project.id).await.unwrap(), 3);
        let found = f
            .svc
            .search_messages(f.lead.id, f.project.id, "DEPLOY", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(found.total_elements, 1);
        assert!(matches!(
            f.svc.count_messages(f.outsider.id, f.project.id).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
