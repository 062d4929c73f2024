//! Domain services, generic over the store traits.

mod accounts;
mod chat;
mod notifications;
mod projects;
mod skills;
mod tasks;
mod team;
mod users;

pub use accounts::AccountService;
pub use chat::{ChatService, MAX_LATEST_MESSAGES};
pub use notifications::NotificationService;
pub use projects::{ProjectService, RECENT_PROJECTS_LIMIT};
pub use skills::SkillService;
pub use tasks::{DEFAULT_DUE_SOON_DAYS, MAX_DUE_SOON_DAYS, TaskService};
pub use team::{DEFAULT_INVITATION_TTL_DAYS, TeamService};
pub use users::{DashboardCounts, UserService};

use uuid::Uuid;

use crate::constants::messages;
use crate::error::AppError;
use crate::project::{Project, ProjectMember};
use crate::traits::{ProjectStore, UserStore};
use crate::user::User;

async fn load_user<U: UserStore>(users: &U, id: Uuid) -> Result<User, AppError> {
    users
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::USER_NOT_FOUND.into()))
}

async fn load_project<P: ProjectStore>(projects: &P, id: Uuid) -> Result<Project, AppError> {
    projects
        .find_project(id)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::PROJECT_NOT_FOUND.into()))
}

fn require_lead(project: &Project, user_id: Uuid, action: &str) -> Result<(), AppError> {
    if project.is_lead(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "only the project lead can {action}"
        )))
    }
}

/// The caller's seat on the team. The lead holds a LEAD seat.
async fn require_member<P: ProjectStore>(
    projects: &P,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<ProjectMember, AppError> {
    projects
        .find_membership(project_id, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("you are not a member of this project".into()))
}

/// Open seats and recruiting status, checked before anyone joins.
fn require_open_seat(project: &Project) -> Result<(), AppError> {
    if !project.status.can_accept_members() {
        return Err(AppError::BadRequest(messages::NOT_RECRUITING.into()));
    }
    if project.is_full() {
        return Err(AppError::Conflict(messages::PROJECT_FULL.into()));
    }
    Ok(())
}

async fn require_not_member<P: ProjectStore>(
    projects: &P,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    match projects.find_membership(project_id, user_id).await? {
        Some(_) => Err(AppError::Conflict(messages::ALREADY_MEMBER.into())),
        None => Ok(()),
    }
}
