use uuid::Uuid;

use super::load_user;
use crate::error::AppError;
use crate::page::{Page, PageRequest};
use crate::traits::{ProjectStore, SkillStore, UserStore};
use crate::user::{AvailabilityStatus, ProfileUpdate, User, UserSearch};

/// Numbers shown on a user's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCounts {
    pub projects_count: i64,
    pub skills_count: i64,
}

/// Profiles and the people directory.
#[derive(Clone)]
pub struct UserService<U, S, P>
where
    U: UserStore,
    S: SkillStore,
    P: ProjectStore,
{
    users: U,
    skills: S,
    projects: P,
}

impl<U, S, P> UserService<U, S, P>
where
    U: UserStore,
    S: SkillStore,
    P: ProjectStore,
{
    pub fn new(users: U, skills: S, projects: P) -> Self {
        Self {
            users,
            skills,
            projects,
        }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        load_user(&self.users, id).await
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        self.users.count_users().await
    }

    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User, AppError> {
        update.validate()?;
        let mut user = load_user(&self.users, id).await?;
        update.apply_to(&mut user);
        let user = self.users.update_user(&user).await?;
        tracing::info!(user_id = %id, "Updated profile");
        Ok(user)
    }

    pub async fn update_availability(
        &self,
        id: Uuid,
        status: AvailabilityStatus,
    ) -> Result<User, AppError> {
        let mut user = load_user(&self.users, id).await?;
        user.availability_status = status;
        self.users.update_user(&user).await
    }

    pub async fn search(
        &self,
        search: &UserSearch,
        page: PageRequest,
    ) -> Result<Page<User>, AppError> {
        self.users.search_users(search, page).await
    }

    pub async fn dashboard(&self, id: Uuid) -> Result<DashboardCounts, AppError> {
        load_user(&self.users, id).await?;
        let projects_count = self.projects.count_projects_for_user(id).await?;
        let skills_count = self.skills.user_skills(id).await?.len() as i64;
        Ok(DashboardCounts {
            projects_count,
            skills_count,
        })
    }
}
