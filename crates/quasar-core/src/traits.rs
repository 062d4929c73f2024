use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::chat::{ChatMessage, NewChatMessage};
use crate::error::AppError;
use crate::events::DomainEvent;
use crate::notification::{NewNotification, Notification, NotificationType};
use crate::oauth::{GitHubEmail, GitHubUser};
use crate::page::{Page, PageRequest};
use crate::project::{Project, ProjectCategory, ProjectMember, ProjectRole, ProjectSearch};
use crate::skill::{Skill, SkillLevel, UserSkill};
use crate::task::{NewTaskRecord, Task, TaskFilter};
use crate::team::{Invitation, InvitationStatus, JoinRequest, NewInvitation};
use crate::user::{NewUser, User, UserSearch};

/// Persists user accounts.
pub trait UserStore: Send + Sync + Clone {
    fn create_user(&self, user: &NewUser) -> impl Future<Output = Result<User, AppError>> + Send;

    fn find_user(&self, id: Uuid) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    /// Case-insensitive email lookup.
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    fn find_user_by_github_id(
        &self,
        github_id: &str,
    ) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    /// Write every mutable profile field of `user`. Returns the stored row.
    fn update_user(&self, user: &User) -> impl Future<Output = Result<User, AppError>> + Send;

    fn count_users(&self) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn search_users(
        &self,
        search: &UserSearch,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<User>, AppError>> + Send;
}

/// Persists the skill catalogue and the skills on user profiles.
pub trait SkillStore: Send + Sync + Clone {
    fn find_skill(&self, id: i64) -> impl Future<Output = Result<Option<Skill>, AppError>> + Send;

    /// Lookup by normalized name.
    fn find_skill_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Skill>, AppError>> + Send;

    /// Insert, or return the existing row when the id is already taken.
    fn insert_skill(&self, skill: &Skill) -> impl Future<Output = Result<Skill, AppError>> + Send;

    fn update_skill(&self, skill: &Skill) -> impl Future<Output = Result<Skill, AppError>> + Send;

    /// Returns false when nothing was deleted.
    fn delete_skill(&self, id: i64) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn list_skills(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Skill>, AppError>> + Send;

    fn search_skills(
        &self,
        query: &str,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Skill>, AppError>> + Send;

    fn skill_categories(&self) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    fn skills_by_category(
        &self,
        category: &str,
    ) -> impl Future<Output = Result<Vec<Skill>, AppError>> + Send;

    /// Ordered by `users_count` then `projects_count`, descending.
    fn popular_skills(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Skill>, AppError>> + Send;

    /// Add the deltas to the usage counters, never going below zero.
    fn adjust_skill_usage(
        &self,
        id: i64,
        users_delta: i32,
        projects_delta: i32,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn add_user_skill(
        &self,
        user_id: Uuid,
        skill_id: i64,
        level: SkillLevel,
        experience: Option<&str>,
    ) -> impl Future<Output = Result<UserSkill, AppError>> + Send;

    fn find_user_skill(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<UserSkill>, AppError>> + Send;

    fn find_user_skill_by_skill(
        &self,
        user_id: Uuid,
        skill_id: i64,
    ) -> impl Future<Output = Result<Option<UserSkill>, AppError>> + Send;

    fn user_skills(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<UserSkill>, AppError>> + Send;

    fn update_user_skill(
        &self,
        id: i64,
        level: SkillLevel,
        experience: Option<&str>,
    ) -> impl Future<Output = Result<UserSkill, AppError>> + Send;

    fn delete_user_skill(&self, id: i64) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Persists projects, their categories and team membership.
pub trait ProjectStore: Send + Sync + Clone {
    fn list_categories(
        &self,
    ) -> impl Future<Output = Result<Vec<ProjectCategory>, AppError>> + Send;

    fn search_categories(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<ProjectCategory>, AppError>> + Send;

    fn find_category(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ProjectCategory>, AppError>> + Send;

    /// Case-insensitive name lookup.
    fn find_category_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<ProjectCategory>, AppError>> + Send;

    /// Insert, or return the existing category with the same name.
    fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> impl Future<Output = Result<ProjectCategory, AppError>> + Send;

    /// Insert the project, its skills (bumping their project counters) and
    /// the lead's LEAD membership.
    fn insert_project(
        &self,
        project: &Project,
    ) -> impl Future<Output = Result<Project, AppError>> + Send;

    fn find_project(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Project>, AppError>> + Send;

    /// Write scalar fields and category, and replace the skill list.
    fn update_project(
        &self,
        project: &Project,
    ) -> impl Future<Output = Result<Project, AppError>> + Send;

    fn delete_project(&self, id: Uuid) -> impl Future<Output = Result<(), AppError>> + Send;

    fn search_projects(
        &self,
        search: &ProjectSearch,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Project>, AppError>> + Send;

    fn recent_projects(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Project>, AppError>> + Send;

    fn count_projects(&self) -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Projects the user leads or belongs to.
    fn count_projects_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn project_members(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = Result<Vec<ProjectMember>, AppError>> + Send;

    fn find_member(
        &self,
        member_id: i64,
    ) -> impl Future<Output = Result<Option<ProjectMember>, AppError>> + Send;

    fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<ProjectMember>, AppError>> + Send;

    fn add_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> impl Future<Output = Result<ProjectMember, AppError>> + Send;

    fn update_member_role(
        &self,
        member_id: i64,
        role: ProjectRole,
    ) -> impl Future<Output = Result<ProjectMember, AppError>> + Send;

    fn remove_member(&self, member_id: i64) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Persists invitations and join requests.
pub trait TeamStore: Send + Sync + Clone {
    fn create_invitation(
        &self,
        invitation: &NewInvitation,
    ) -> impl Future<Output = Result<Invitation, AppError>> + Send;

    fn find_invitation(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Invitation>, AppError>> + Send;

    fn find_pending_invitation(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<Invitation>, AppError>> + Send;

    /// Set a final status and stamp `responded_at`.
    fn resolve_invitation(
        &self,
        id: i64,
        status: InvitationStatus,
    ) -> impl Future<Output = Result<Invitation, AppError>> + Send;

    /// Atomically mark the invitation ACCEPTED and add the invitee to the
    /// team with the invitation's role.
    fn accept_invitation(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<ProjectMember, AppError>> + Send;

    fn project_invitations(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Invitation>, AppError>> + Send;

    fn received_invitations(
        &self,
        user_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> impl Future<Output = Result<Vec<Invitation>, AppError>> + Send;

    fn sent_invitations(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Invitation>, AppError>> + Send;

    /// Mark PENDING invitations whose deadline passed as EXPIRED.
    fn expire_invitations(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    fn create_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
    ) -> impl Future<Output = Result<JoinRequest, AppError>> + Send;

    fn find_join_request(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<JoinRequest>, AppError>> + Send;

    fn find_pending_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<JoinRequest>, AppError>> + Send;

    fn resolve_join_request(
        &self,
        id: i64,
        status: InvitationStatus,
    ) -> impl Future<Output = Result<JoinRequest, AppError>> + Send;

    /// Atomically mark the request ACCEPTED and add the requester as MEMBER.
    fn accept_join_request(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<ProjectMember, AppError>> + Send;

    fn delete_join_request(&self, id: i64) -> impl Future<Output = Result<(), AppError>> + Send;

    fn project_join_requests(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = Result<Vec<JoinRequest>, AppError>> + Send;

    fn user_join_requests(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<JoinRequest>, AppError>> + Send;
}

/// Persists project tasks.
pub trait TaskStore: Send + Sync + Clone {
    fn create_task(
        &self,
        task: &NewTaskRecord,
    ) -> impl Future<Output = Result<Task, AppError>> + Send;

    fn find_task(&self, id: i64) -> impl Future<Output = Result<Option<Task>, AppError>> + Send;

    fn update_task(&self, task: &Task) -> impl Future<Output = Result<Task, AppError>> + Send;

    fn delete_task(&self, id: i64) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Newest first.
    fn list_tasks(
        &self,
        project_id: Uuid,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Task>, AppError>> + Send;

    /// Every task of a project, ordered by due date (undated last).
    fn project_tasks(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Task>, AppError>> + Send;

    fn tasks_assigned_to(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Task>, AppError>> + Send;
}

/// Persists user notifications.
pub trait NotificationStore: Send + Sync + Clone {
    fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> impl Future<Output = Result<Notification, AppError>> + Send;

    fn find_notification(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Notification>, AppError>> + Send;

    /// Newest first.
    fn list_notifications(
        &self,
        user_id: Uuid,
        kind: Option<NotificationType>,
        unread_only: bool,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Notification>, AppError>> + Send;

    fn unread_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Notification>, AppError>> + Send;

    fn unread_count(&self, user_id: Uuid) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn mark_read(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Notification, AppError>> + Send;

    fn mark_all_read(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    fn delete_notification(&self, id: i64) -> impl Future<Output = Result<(), AppError>> + Send;

    fn delete_all_notifications(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    fn delete_notifications_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;
}

/// Persists project chat.
pub trait ChatStore: Send + Sync + Clone {
    fn create_message(
        &self,
        message: &NewChatMessage,
    ) -> impl Future<Output = Result<ChatMessage, AppError>> + Send;

    fn find_message(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ChatMessage>, AppError>> + Send;

    fn edit_message(
        &self,
        id: i64,
        content: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<ChatMessage, AppError>> + Send;

    fn delete_message(&self, id: i64) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Newest first.
    fn list_messages(
        &self,
        project_id: Uuid,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<ChatMessage>, AppError>> + Send;

    /// Oldest first.
    fn messages_after(
        &self,
        project_id: Uuid,
        after: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, AppError>> + Send;

    fn search_messages(
        &self,
        project_id: Uuid,
        query: &str,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<ChatMessage>, AppError>> + Send;

    /// The `limit` most recent messages, oldest first.
    fn latest_messages(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, AppError>> + Send;

    fn count_messages(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;
}

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync + Clone {
    fn hash(&self, password: &str) -> Result<String, AppError>;

    /// False for a wrong password or an unparseable hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// The slice of the GitHub REST API used during login.
pub trait GitHubApi: Send + Sync + Clone {
    fn fetch_user(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<GitHubUser, AppError>> + Send;

    fn fetch_emails(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<GitHubEmail>, AppError>> + Send;
}

/// Receives domain events for real-time fan-out.
pub trait EventSink: Send + Sync + Clone {
    fn publish(&self, event: DomainEvent);
}

/// An EventSink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: DomainEvent) {}
}
