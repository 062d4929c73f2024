//! Test utilities: an in-memory store and mock collaborators.
//!
//! `InMemoryStore` implements every store trait over one set of tables so
//! services can be wired against each other exactly as in production.
//! Mocks use `Arc<Mutex<_>>` so tests can inspect what they recorded.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::chat::{ChatMessage, NewChatMessage};
use crate::constants::{DEFAULT_BRANCH, DEFAULT_GRADUATION_YEAR, messages};
use crate::error::AppError;
use crate::events::DomainEvent;
use crate::notification::{NewNotification, Notification, NotificationType};
use crate::oauth::{GitHubEmail, GitHubUser};
use crate::page::{Page, PageRequest};
use crate::project::{
    NewProject, Project, ProjectCategory, ProjectMember, ProjectRole, ProjectSearch,
    ProjectStatus, SkillRequirement,
};
use crate::skill::{Skill, SkillLevel, UserSkill};
use crate::task::{NewTaskRecord, Task, TaskFilter, TaskStatus};
use crate::team::{Invitation, InvitationStatus, JoinRequest, NewInvitation};
use crate::traits::{
    ChatStore, EventSink, GitHubApi, NotificationStore, PasswordHasher, ProjectStore, SkillStore,
    TaskStore, TeamStore, UserStore,
};
use crate::user::{AvailabilityStatus, NewUser, User, UserRole, UserSearch};
use crate::util::normalize_name;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A verified student whose first name is the capitalized local part of
/// `email`. The password hash matches `MockHasher` for "Secret123".
pub fn sample_new_user(email: &str) -> NewUser {
    let local = email.split('@').next().unwrap_or("student");
    let mut chars = local.chars();
    let first_name = match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => "Student".to_string(),
    };
    NewUser {
        email: email.to_lowercase(),
        password_hash: Some("hashed:Secret123".into()),
        first_name,
        last_name: "Tester".into(),
        role: UserRole::Student,
        branch: Some(DEFAULT_BRANCH.into()),
        graduation_year: Some(DEFAULT_GRADUATION_YEAR),
        bio: None,
        availability_status: AvailabilityStatus::Available,
        profile_picture_url: None,
        github_url: None,
        github_id: None,
        github_username: None,
        is_verified: true,
    }
}

pub fn sample_new_project() -> NewProject {
    NewProject {
        title: "Campus Connect".into(),
        description: "A platform linking students with campus events".into(),
        max_team_size: Some(4),
        skills: vec![SkillRequirement {
            skill_name: Some("Rust".into()),
            ..Default::default()
        }],
        tech_stack: vec!["axum".into(), "postgres".into()],
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// InMemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    skills: Vec<Skill>,
    user_skills: Vec<UserSkill>,
    categories: Vec<ProjectCategory>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    invitations: Vec<Invitation>,
    join_requests: Vec<JoinRequest>,
    tasks: Vec<Task>,
    notifications: Vec<Notification>,
    messages: Vec<ChatMessage>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: Uuid) -> Result<&User, AppError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound(messages::USER_NOT_FOUND.into()))
    }

    fn name_of(&self, id: Uuid) -> String {
        self.user(id).map(User::full_name).unwrap_or_default()
    }

    fn project_title(&self, id: Uuid) -> Result<String, AppError> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.title.clone())
            .ok_or_else(|| AppError::NotFound(messages::PROJECT_NOT_FOUND.into()))
    }

    /// The stored row with its team size computed from memberships.
    fn project_view(&self, project: &Project) -> Project {
        let mut view = project.clone();
        view.current_team_size = self
            .members
            .iter()
            .filter(|m| m.project_id == project.id)
            .count() as i32;
        view
    }

    fn is_involved(&self, project: &Project, user_id: Uuid) -> bool {
        project.lead_id == user_id
            || self
                .members
                .iter()
                .any(|m| m.project_id == project.id && m.user_id == user_id)
    }

    fn insert_user(&mut self, new: &NewUser) -> Result<User, AppError> {
        if self
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(new.email.trim()))
        {
            return Err(AppError::Conflict(messages::EMAIL_ALREADY_EXISTS.into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.trim().to_lowercase(),
            password_hash: new.password_hash.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            role: new.role,
            branch: new.branch.clone(),
            graduation_year: new.graduation_year,
            bio: new.bio.clone(),
            availability_status: new.availability_status,
            profile_picture_url: new.profile_picture_url.clone(),
            github_url: new.github_url.clone(),
            linkedin_url: None,
            portfolio_url: None,
            github_id: new.github_id.clone(),
            github_username: new.github_username.clone(),
            is_verified: new.is_verified,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn adjust_skill(&mut self, id: i64, users_delta: i32, projects_delta: i32) {
        if let Some(skill) = self.skills.iter_mut().find(|s| s.id == id) {
            skill.users_count = (skill.users_count + users_delta).max(0);
            skill.projects_count = (skill.projects_count + projects_delta).max(0);
        }
    }

    fn insert_project(&mut self, project: &Project) -> Result<Project, AppError> {
        let lead = self.user(project.lead_id)?.clone();
        let mut row = project.clone();
        row.lead_name = lead.full_name();
        for skill in &row.skills {
            self.adjust_skill(skill.skill_id, 0, 1);
        }
        self.projects.push(row);
        self.insert_member(project.id, lead.id, ProjectRole::Lead)?;
        self.find_project(project.id)
            .ok_or_else(|| AppError::NotFound(messages::PROJECT_NOT_FOUND.into()))
    }

    fn find_project(&self, id: Uuid) -> Option<Project> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .map(|p| self.project_view(p))
    }

    /// Same seat check the database runs under its row lock.
    fn claim_seat(&self, project_id: Uuid) -> Result<(), AppError> {
        let project = self
            .find_project(project_id)
            .ok_or_else(|| AppError::NotFound(messages::PROJECT_NOT_FOUND.into()))?;
        if !project.status.can_accept_members() {
            return Err(AppError::BadRequest(messages::NOT_RECRUITING.into()));
        }
        if project.is_full() {
            return Err(AppError::Conflict(messages::PROJECT_FULL.into()));
        }
        Ok(())
    }

    fn insert_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<ProjectMember, AppError> {
        self.project_title(project_id)?;
        if self
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id)
        {
            return Err(AppError::Conflict(messages::ALREADY_MEMBER.into()));
        }
        let user = self.user(user_id)?.clone();
        let member = ProjectMember {
            id: self.next_id(),
            project_id,
            user_id,
            role,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            joined_at: Utc::now(),
        };
        self.members.push(member.clone());
        Ok(member)
    }

    fn invitation_mut(&mut self, id: i64) -> Result<&mut Invitation, AppError> {
        self.invitations
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| AppError::NotFound(messages::INVITATION_NOT_FOUND.into()))
    }

    fn join_request_mut(&mut self, id: i64) -> Result<&mut JoinRequest, AppError> {
        self.join_requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(messages::JOIN_REQUEST_NOT_FOUND.into()))
    }

    fn notification_mut(&mut self, id: i64) -> Result<&mut Notification, AppError> {
        self.notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NotFound(messages::NOTIFICATION_NOT_FOUND.into()))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Ascending by due date, undated last, then by id.
fn sort_by_due_date(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date, t.id));
}

/// Shared in-memory implementation of every store trait.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn insert_user(&self, user: NewUser) -> User {
        self.lock().insert_user(&user).unwrap()
    }

    /// Insert a catalogue skill with the default category for its name.
    pub fn seed_skill(&self, name: &str) -> Skill {
        let skill = Skill::build(name, None, None);
        let mut tables = self.lock();
        if !tables.skills.iter().any(|s| s.id == skill.id) {
            tables.skills.push(skill.clone());
        }
        skill
    }

    pub fn skill_count(&self) -> usize {
        self.lock().skills.len()
    }

    /// Insert a recruiting project without skills, led by `lead`.
    pub fn seed_project(&self, lead: &User) -> Project {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            title: "Campus Connect".into(),
            description: "A platform linking students with campus events".into(),
            category: None,
            status: ProjectStatus::Recruiting,
            lead_id: lead.id,
            lead_name: lead.full_name(),
            max_team_size: 4,
            current_team_size: 1,
            skills: Vec::new(),
            tech_stack: Vec::new(),
            problem_statement: None,
            goals: None,
            objectives: None,
            expected_start_date: None,
            expected_end_date: None,
            github_repo: None,
            demo_url: None,
            created_at: now,
            updated_at: now,
        };
        self.lock().insert_project(&project).unwrap()
    }

    pub fn backdate_notification(&self, id: i64, created_at: DateTime<Utc>) {
        let mut tables = self.lock();
        tables.notification_mut(id).unwrap().created_at = created_at;
    }

    pub fn invitation_statuses(&self) -> Vec<InvitationStatus> {
        self.lock().invitations.iter().map(|i| i.status).collect()
    }
}

impl UserStore for InMemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let mut tables = self.lock();
        if let Some(github_id) = &user.github_id
            && tables
                .users
                .iter()
                .any(|u| u.github_id.as_ref() == Some(github_id))
        {
            return Err(AppError::Conflict("GitHub account already linked".into()));
        }
        tables.insert_user(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.trim();
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_github_id(&self, github_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.github_id.as_deref() == Some(github_id))
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.lock();
        let row = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::NotFound(messages::USER_NOT_FOUND.into()))?;
        *row = User {
            created_at: row.created_at,
            updated_at: Utc::now(),
            ..user.clone()
        };
        Ok(row.clone())
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        Ok(self.lock().users.len() as i64)
    }

    async fn search_users(
        &self,
        search: &UserSearch,
        page: PageRequest,
    ) -> Result<Page<User>, AppError> {
        let tables = self.lock();
        let has_skill = |user: &User, skill: &str| {
            tables
                .user_skills
                .iter()
                .any(|us| us.user_id == user.id && contains_ci(&us.skill_name, skill))
        };
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| search.exclude_user != Some(u.id))
            .filter(|u| {
                search.query.as_deref().is_none_or(|q| {
                    contains_ci(&u.full_name(), q) || contains_ci(&u.email, q)
                })
            })
            .filter(|u| {
                search.branch.as_deref().is_none_or(|b| {
                    u.branch.as_deref().is_some_and(|ub| ub.eq_ignore_ascii_case(b))
                })
            })
            .filter(|u| search.graduation_year.is_none_or(|y| u.graduation_year == Some(y)))
            .filter(|u| search.availability.is_none_or(|a| u.availability_status == a))
            .filter(|u| search.skill.as_deref().is_none_or(|s| has_skill(u, s)))
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.first_name.to_lowercase(), u.last_name.to_lowercase()));
        Ok(Page::from_vec(users, page))
    }
}

impl SkillStore for InMemoryStore {
    async fn find_skill(&self, id: i64) -> Result<Option<Skill>, AppError> {
        Ok(self.lock().skills.iter().find(|s| s.id == id).cloned())
    }

    async fn find_skill_by_name(&self, name: &str) -> Result<Option<Skill>, AppError> {
        let normalized = normalize_name(name);
        Ok(self
            .lock()
            .skills
            .iter()
            .find(|s| s.normalized_name == normalized)
            .cloned())
    }

    async fn insert_skill(&self, skill: &Skill) -> Result<Skill, AppError> {
        let mut tables = self.lock();
        if let Some(existing) = tables.skills.iter().find(|s| s.id == skill.id) {
            return Ok(existing.clone());
        }
        tables.skills.push(skill.clone());
        Ok(skill.clone())
    }

    async fn update_skill(&self, skill: &Skill) -> Result<Skill, AppError> {
        let mut tables = self.lock();
        let row = tables
            .skills
            .iter_mut()
            .find(|s| s.id == skill.id)
            .ok_or_else(|| AppError::NotFound(messages::SKILL_NOT_FOUND.into()))?;
        *row = Skill {
            updated_at: Utc::now(),
            ..skill.clone()
        };
        let updated = row.clone();
        for us in tables.user_skills.iter_mut().filter(|us| us.skill_id == skill.id) {
            us.skill_name = updated.name.clone();
            us.skill_category = updated.category.clone();
        }
        Ok(updated)
    }

    async fn delete_skill(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock();
        let before = tables.skills.len();
        tables.skills.retain(|s| s.id != id);
        tables.user_skills.retain(|us| us.skill_id != id);
        for project in tables.projects.iter_mut() {
            project.skills.retain(|s| s.skill_id != id);
        }
        Ok(tables.skills.len() < before)
    }

    async fn list_skills(&self, page: PageRequest) -> Result<Page<Skill>, AppError> {
        let mut skills = self.lock().skills.clone();
        skills.sort_by_key(|s| s.normalized_name.clone());
        Ok(Page::from_vec(skills, page))
    }

    async fn search_skills(&self, query: &str, page: PageRequest) -> Result<Page<Skill>, AppError> {
        let mut skills: Vec<Skill> = self
            .lock()
            .skills
            .iter()
            .filter(|s| contains_ci(&s.name, query))
            .cloned()
            .collect();
        skills.sort_by_key(|s| s.normalized_name.clone());
        Ok(Page::from_vec(skills, page))
    }

    async fn skill_categories(&self) -> Result<Vec<String>, AppError> {
        let mut categories: Vec<String> =
            self.lock().skills.iter().map(|s| s.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn skills_by_category(&self, category: &str) -> Result<Vec<Skill>, AppError> {
        let mut skills: Vec<Skill> = self
            .lock()
            .skills
            .iter()
            .filter(|s| s.category.eq_ignore_ascii_case(category.trim()))
            .cloned()
            .collect();
        skills.sort_by_key(|s| s.normalized_name.clone());
        Ok(skills)
    }

    async fn popular_skills(&self, page: PageRequest) -> Result<Page<Skill>, AppError> {
        let mut skills = self.lock().skills.clone();
        skills.sort_by(|a, b| {
            b.users_count
                .cmp(&a.users_count)
                .then(b.projects_count.cmp(&a.projects_count))
                .then(a.normalized_name.cmp(&b.normalized_name))
        });
        Ok(Page::from_vec(skills, page))
    }

    async fn adjust_skill_usage(
        &self,
        id: i64,
        users_delta: i32,
        projects_delta: i32,
    ) -> Result<(), AppError> {
        self.lock().adjust_skill(id, users_delta, projects_delta);
        Ok(())
    }

    async fn add_user_skill(
        &self,
        user_id: Uuid,
        skill_id: i64,
        level: SkillLevel,
        experience: Option<&str>,
    ) -> Result<UserSkill, AppError> {
        let mut tables = self.lock();
        tables.user(user_id)?;
        let skill = tables
            .skills
            .iter()
            .find(|s| s.id == skill_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(messages::SKILL_NOT_FOUND.into()))?;
        if tables
            .user_skills
            .iter()
            .any(|us| us.user_id == user_id && us.skill_id == skill_id)
        {
            return Err(AppError::Conflict(format!(
                "You already have the skill {}",
                skill.name
            )));
        }
        let user_skill = UserSkill {
            id: tables.next_id(),
            user_id,
            skill_id,
            skill_name: skill.name,
            skill_category: skill.category,
            level,
            experience: experience.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.user_skills.push(user_skill.clone());
        Ok(user_skill)
    }

    async fn find_user_skill(&self, id: i64) -> Result<Option<UserSkill>, AppError> {
        Ok(self.lock().user_skills.iter().find(|us| us.id == id).cloned())
    }

    async fn find_user_skill_by_skill(
        &self,
        user_id: Uuid,
        skill_id: i64,
    ) -> Result<Option<UserSkill>, AppError> {
        Ok(self
            .lock()
            .user_skills
            .iter()
            .find(|us| us.user_id == user_id && us.skill_id == skill_id)
            .cloned())
    }

    async fn user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkill>, AppError> {
        let mut skills: Vec<UserSkill> = self
            .lock()
            .user_skills
            .iter()
            .filter(|us| us.user_id == user_id)
            .cloned()
            .collect();
        skills.sort_by_key(|us| us.skill_name.to_lowercase());
        Ok(skills)
    }

    async fn update_user_skill(
        &self,
        id: i64,
        level: SkillLevel,
        experience: Option<&str>,
    ) -> Result<UserSkill, AppError> {
        let mut tables = self.lock();
        let row = tables
            .user_skills
            .iter_mut()
            .find(|us| us.id == id)
            .ok_or_else(|| AppError::NotFound(messages::USER_SKILL_NOT_FOUND.into()))?;
        row.level = level;
        row.experience = experience.map(str::to_string);
        Ok(row.clone())
    }

    async fn delete_user_skill(&self, id: i64) -> Result<(), AppError> {
        self.lock().user_skills.retain(|us| us.id != id);
        Ok(())
    }
}

impl ProjectStore for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<ProjectCategory>, AppError> {
        let mut categories = self.lock().categories.clone();
        categories.sort_by_key(|c| c.name.to_lowercase());
        Ok(categories)
    }

    async fn search_categories(&self, query: &str) -> Result<Vec<ProjectCategory>, AppError> {
        let mut categories: Vec<ProjectCategory> = self
            .lock()
            .categories
            .iter()
            .filter(|c| contains_ci(&c.name, query))
            .cloned()
            .collect();
        categories.sort_by_key(|c| c.name.to_lowercase());
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<ProjectCategory>, AppError> {
        Ok(self.lock().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<ProjectCategory>, AppError> {
        Ok(self
            .lock()
            .categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ProjectCategory, AppError> {
        let mut tables = self.lock();
        if let Some(existing) = tables
            .categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
        {
            return Ok(existing.clone());
        }
        let category = ProjectCategory {
            id: tables.next_id(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn insert_project(&self, project: &Project) -> Result<Project, AppError> {
        self.lock().insert_project(project)
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.lock().find_project(id))
    }

    async fn update_project(&self, project: &Project) -> Result<Project, AppError> {
        let mut tables = self.lock();
        let index = tables
            .projects
            .iter()
            .position(|p| p.id == project.id)
            .ok_or_else(|| AppError::NotFound(messages::PROJECT_NOT_FOUND.into()))?;
        let previous = tables.projects[index].clone();
        for skill in &previous.skills {
            tables.adjust_skill(skill.skill_id, 0, -1);
        }
        for skill in &project.skills {
            tables.adjust_skill(skill.skill_id, 0, 1);
        }
        tables.projects[index] = Project {
            lead_id: previous.lead_id,
            lead_name: previous.lead_name,
            created_at: previous.created_at,
            updated_at: Utc::now(),
            ..project.clone()
        };
        let row = tables.projects[index].clone();
        Ok(tables.project_view(&row))
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.lock();
        let Some(index) = tables.projects.iter().position(|p| p.id == id) else {
            return Ok(());
        };
        let project = tables.projects.remove(index);
        for skill in &project.skills {
            tables.adjust_skill(skill.skill_id, 0, -1);
        }
        tables.members.retain(|m| m.project_id != id);
        tables.invitations.retain(|i| i.project_id != id);
        tables.join_requests.retain(|r| r.project_id != id);
        tables.tasks.retain(|t| t.project_id != id);
        tables.messages.retain(|m| m.project_id != id);
        Ok(())
    }

    async fn search_projects(
        &self,
        search: &ProjectSearch,
        page: PageRequest,
    ) -> Result<Page<Project>, AppError> {
        let tables = self.lock();
        let mut projects: Vec<Project> = tables
            .projects
            .iter()
            .rev()
            .map(|p| tables.project_view(p))
            .filter(|p| {
                search.query.as_deref().is_none_or(|q| {
                    contains_ci(&p.title, q) || contains_ci(&p.description, q)
                })
            })
            .filter(|p| {
                search.category.as_deref().is_none_or(|c| {
                    p.category
                        .as_ref()
                        .is_some_and(|pc| pc.name.eq_ignore_ascii_case(c))
                })
            })
            .filter(|p| search.status.is_none_or(|s| p.status == s))
            .filter(|p| !search.available_only || p.can_accept_new_members())
            .filter(|p| search.lead_id.is_none_or(|id| p.lead_id == id))
            .filter(|p| search.exclude_user.is_none_or(|u| !tables.is_involved(p, u)))
            .filter(|p| search.involving_user.is_none_or(|u| tables.is_involved(p, u)))
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::from_vec(projects, page))
    }

    async fn recent_projects(&self, limit: i64) -> Result<Vec<Project>, AppError> {
        let tables = self.lock();
        let mut projects: Vec<Project> = tables
            .projects
            .iter()
            .rev()
            .map(|p| tables.project_view(p))
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        projects.truncate(limit.max(0) as usize);
        Ok(projects)
    }

    async fn count_projects(&self) -> Result<i64, AppError> {
        Ok(self.lock().projects.len() as i64)
    }

    async fn count_projects_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        let tables = self.lock();
        Ok(tables
            .projects
            .iter()
            .filter(|p| tables.is_involved(p, user_id))
            .count() as i64)
    }

    async fn project_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError> {
        let mut members: Vec<ProjectMember> = self
            .lock()
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| (!m.is_lead(), m.joined_at, m.id));
        Ok(members)
    }

    async fn find_member(&self, member_id: i64) -> Result<Option<ProjectMember>, AppError> {
        Ok(self.lock().members.iter().find(|m| m.id == member_id).cloned())
    }

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>, AppError> {
        Ok(self
            .lock()
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn add_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<ProjectMember, AppError> {
        let mut tables = self.lock();
        tables.claim_seat(project_id)?;
        tables.insert_member(project_id, user_id, role)
    }

    async fn update_member_role(
        &self,
        member_id: i64,
        role: ProjectRole,
    ) -> Result<ProjectMember, AppError> {
        let mut tables = self.lock();
        let member = tables
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
            .ok_or_else(|| AppError::NotFound(messages::MEMBER_NOT_FOUND.into()))?;
        member.role = role;
        Ok(member.clone())
    }

    async fn remove_member(&self, member_id: i64) -> Result<(), AppError> {
        self.lock().members.retain(|m| m.id != member_id);
        Ok(())
    }
}

impl TeamStore for InMemoryStore {
    async fn create_invitation(&self, invitation: &NewInvitation) -> Result<Invitation, AppError> {
        let mut tables = self.lock();
        let row = Invitation {
            id: tables.next_id(),
            project_id: invitation.project_id,
            project_title: tables.project_title(invitation.project_id)?,
            invited_user_id: invitation.invited_user_id,
            invited_user_name: tables.name_of(invitation.invited_user_id),
            invited_by_id: invitation.invited_by_id,
            invited_by_name: tables.name_of(invitation.invited_by_id),
            role: invitation.role,
            message: invitation.message.clone(),
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
            expires_at: invitation.expires_at,
        };
        tables.invitations.push(row.clone());
        Ok(row)
    }

    async fn find_invitation(&self, id: i64) -> Result<Option<Invitation>, AppError> {
        Ok(self.lock().invitations.iter().find(|i| i.id == id).cloned())
    }

    async fn find_pending_invitation(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Invitation>, AppError> {
        Ok(self
            .lock()
            .invitations
            .iter()
            .find(|i| {
                i.project_id == project_id
                    && i.invited_user_id == user_id
                    && i.status == InvitationStatus::Pending
            })
            .cloned())
    }

    async fn resolve_invitation(
        &self,
        id: i64,
        status: InvitationStatus,
    ) -> Result<Invitation, AppError> {
        let mut tables = self.lock();
        let invitation = tables.invitation_mut(id)?;
        invitation.status = status;
        invitation.responded_at = Some(Utc::now());
        Ok(invitation.clone())
    }

    async fn accept_invitation(&self, id: i64) -> Result<ProjectMember, AppError> {
        let mut tables = self.lock();
        let invitation = tables.invitation_mut(id)?.clone();
        tables.claim_seat(invitation.project_id)?;
        let member =
            tables.insert_member(invitation.project_id, invitation.invited_user_id, invitation.role)?;
        let row = tables.invitation_mut(id)?;
        row.status = InvitationStatus::Accepted;
        row.responded_at = Some(Utc::now());
        Ok(member)
    }

    async fn project_invitations(&self, project_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let mut rows: Vec<Invitation> = self
            .lock()
            .invitations
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| std::cmp::Reverse((i.created_at, i.id)));
        Ok(rows)
    }

    async fn received_invitations(
        &self,
        user_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        let mut rows: Vec<Invitation> = self
            .lock()
            .invitations
            .iter()
            .filter(|i| i.invited_user_id == user_id && status.is_none_or(|s| i.status == s))
            .cloned()
            .collect();
        rows.sort_by_key(|i| std::cmp::Reverse((i.created_at, i.id)));
        Ok(rows)
    }

    async fn sent_invitations(&self, user_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let mut rows: Vec<Invitation> = self
            .lock()
            .invitations
            .iter()
            .filter(|i| i.invited_by_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| std::cmp::Reverse((i.created_at, i.id)));
        Ok(rows)
    }

    async fn expire_invitations(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut expired = 0;
        for invitation in self.lock().invitations.iter_mut() {
            if invitation.is_expired_at(now) {
                invitation.status = InvitationStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn create_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
    ) -> Result<JoinRequest, AppError> {
        let mut tables = self.lock();
        let request = JoinRequest {
            id: tables.next_id(),
            project_id,
            project_title: tables.project_title(project_id)?,
            user_id,
            user_name: tables.name_of(user_id),
            message: message.map(str::to_string),
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        };
        tables.join_requests.push(request.clone());
        Ok(request)
    }

    async fn find_join_request(&self, id: i64) -> Result<Option<JoinRequest>, AppError> {
        Ok(self.lock().join_requests.iter().find(|r| r.id == id).cloned())
    }

    async fn find_pending_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<JoinRequest>, AppError> {
        Ok(self
            .lock()
            .join_requests
            .iter()
            .find(|r| {
                r.project_id == project_id
                    && r.user_id == user_id
                    && r.status == InvitationStatus::Pending
            })
            .cloned())
    }

    async fn resolve_join_request(
        &self,
        id: i64,
        status: InvitationStatus,
    ) -> Result<JoinRequest, AppError> {
        let mut tables = self.lock();
        let request = tables.join_request_mut(id)?;
        request.status = status;
        request.responded_at = Some(Utc::now());
        Ok(request.clone())
    }

    async fn accept_join_request(&self, id: i64) -> Result<ProjectMember, AppError> {
        let mut tables = self.lock();
        let request = tables.join_request_mut(id)?.clone();
        tables.claim_seat(request.project_id)?;
        let member = tables.insert_member(request.project_id, request.user_id, ProjectRole::Member)?;
        let row = tables.join_request_mut(id)?;
        row.status = InvitationStatus::Accepted;
        row.responded_at = Some(Utc::now());
        Ok(member)
    }

    async fn delete_join_request(&self, id: i64) -> Result<(), AppError> {
        self.lock().join_requests.retain(|r| r.id != id);
        Ok(())
    }

    async fn project_join_requests(&self, project_id: Uuid) -> Result<Vec<JoinRequest>, AppError> {
        let mut rows: Vec<JoinRequest> = self
            .lock()
            .join_requests
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse((r.created_at, r.id)));
        Ok(rows)
    }

    async fn user_join_requests(&self, user_id: Uuid) -> Result<Vec<JoinRequest>, AppError> {
        let mut rows: Vec<JoinRequest> = self
            .lock()
            .join_requests
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse((r.created_at, r.id)));
        Ok(rows)
    }
}

impl TaskStore for InMemoryStore {
    async fn create_task(&self, task: &NewTaskRecord) -> Result<Task, AppError> {
        let mut tables = self.lock();
        tables.project_title(task.project_id)?;
        let now = Utc::now();
        let row = Task {
            id: tables.next_id(),
            project_id: task.project_id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: TaskStatus::Todo,
            priority: task.priority,
            assigned_to_id: task.assigned_to_id,
            assigned_to_name: task.assigned_to_id.map(|id| tables.name_of(id)),
            created_by_id: task.created_by_id,
            created_by_name: tables.name_of(task.created_by_id),
            due_date: task.due_date,
            estimated_hours: task.estimated_hours,
            actual_hours: None,
            completed_at: None,
            completed_by_id: None,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(row.clone());
        Ok(row)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        Ok(self.lock().tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn update_task(&self, task: &Task) -> Result<Task, AppError> {
        let mut tables = self.lock();
        let assigned_to_name = task.assigned_to_id.map(|id| tables.name_of(id));
        let row = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| AppError::NotFound(messages::TASK_NOT_FOUND.into()))?;
        *row = Task {
            assigned_to_name,
            created_at: row.created_at,
            updated_at: Utc::now(),
            ..task.clone()
        };
        Ok(row.clone())
    }

    async fn delete_task(&self, id: i64) -> Result<(), AppError> {
        self.lock().tasks.retain(|t| t.id != id);
        Ok(())
    }

    async fn list_tasks(
        &self,
        project_id: Uuid,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> Result<Page<Task>, AppError> {
        let mut tasks: Vec<Task> = self
            .lock()
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| filter.assigned_to.is_none_or(|u| t.assigned_to_id == Some(u)))
            .filter(|t| {
                filter.query.as_deref().is_none_or(|q| {
                    contains_ci(&t.title, q)
                        || t.description.as_deref().is_some_and(|d| contains_ci(d, q))
                })
            })
            .cloned()
            .collect();
        tasks.sort_by_key(|t| std::cmp::Reverse((t.created_at, t.id)));
        Ok(Page::from_vec(tasks, page))
    }

    async fn project_tasks(&self, project_id: Uuid) -> Result<Vec<Task>, AppError> {
        let mut tasks: Vec<Task> = self
            .lock()
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        sort_by_due_date(&mut tasks);
        Ok(tasks)
    }

    async fn tasks_assigned_to(&self, user_id: Uuid) -> Result<Vec<Task>, AppError> {
        let mut tasks: Vec<Task> = self
            .lock()
            .tasks
            .iter()
            .filter(|t| t.assigned_to_id == Some(user_id))
            .cloned()
            .collect();
        sort_by_due_date(&mut tasks);
        Ok(tasks)
    }
}

impl NotificationStore for InMemoryStore {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, AppError> {
        let mut tables = self.lock();
        let row = Notification {
            id: tables.next_id(),
            user_id: notification.user_id,
            title: notification.title.clone(),
            message: notification.message.clone(),
            notification_type: notification.notification_type,
            related_entity_id: notification.related_entity_id.clone(),
            related_entity_type: notification.related_entity_type.clone(),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        tables.notifications.push(row.clone());
        Ok(row)
    }

    async fn find_notification(&self, id: i64) -> Result<Option<Notification>, AppError> {
        Ok(self.lock().notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        kind: Option<NotificationType>,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, AppError> {
        let mut rows: Vec<Notification> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| kind.is_none_or(|k| n.notification_type == k))
            .filter(|n| !unread_only || !n.is_read)
            .cloned()
            .collect();
        rows.sort_by_key(|n| std::cmp::Reverse((n.created_at, n.id)));
        Ok(Page::from_vec(rows, page))
    }

    async fn unread_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Notification>, AppError> {
        let mut rows: Vec<Notification> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read && n.created_at >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|n| std::cmp::Reverse((n.created_at, n.id)));
        Ok(rows)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, id: i64, at: DateTime<Utc>) -> Result<Notification, AppError> {
        let mut tables = self.lock();
        let row = tables.notification_mut(id)?;
        if !row.is_read {
            row.is_read = true;
            row.read_at = Some(at);
        }
        Ok(row.clone())
    }

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64, AppError> {
        let mut marked = 0;
        for row in self.lock().notifications.iter_mut() {
            if row.user_id == user_id && !row.is_read {
                row.is_read = true;
                row.read_at = Some(at);
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn delete_notification(&self, id: i64) -> Result<(), AppError> {
        self.lock().notifications.retain(|n| n.id != id);
        Ok(())
    }

    async fn delete_all_notifications(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut tables = self.lock();
        let before = tables.notifications.len();
        tables.notifications.retain(|n| n.user_id != user_id);
        Ok((before - tables.notifications.len()) as u64)
    }

    async fn delete_notifications_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.lock();
        let before = tables.notifications.len();
        tables.notifications.retain(|n| n.created_at >= cutoff);
        Ok((before - tables.notifications.len()) as u64)
    }
}

impl ChatStore for InMemoryStore {
    async fn create_message(&self, message: &NewChatMessage) -> Result<ChatMessage, AppError> {
        let mut tables = self.lock();
        tables.project_title(message.project_id)?;
        let row = ChatMessage {
            id: tables.next_id(),
            project_id: message.project_id,
            sender_id: message.sender_id,
            sender_name: message.sender_id.map(|id| tables.name_of(id)),
            content: message.content.clone(),
            message_type: message.message_type,
            is_edited: false,
            edited_at: None,
            created_at: Utc::now(),
        };
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn find_message(&self, id: i64) -> Result<Option<ChatMessage>, AppError> {
        Ok(self.lock().messages.iter().find(|m| m.id == id).cloned())
    }

    async fn edit_message(
        &self,
        id: i64,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<ChatMessage, AppError> {
        let mut tables = self.lock();
        let row = tables
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::NotFound(messages::MESSAGE_NOT_FOUND.into()))?;
        row.content = content.to_string();
        row.is_edited = true;
        row.edited_at = Some(at);
        Ok(row.clone())
    }

    async fn delete_message(&self, id: i64) -> Result<(), AppError> {
        self.lock().messages.retain(|m| m.id != id);
        Ok(())
    }

    async fn list_messages(
        &self,
        project_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<ChatMessage>, AppError> {
        let mut rows: Vec<ChatMessage> = self
            .lock()
            .messages
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| std::cmp::Reverse((m.created_at, m.id)));
        Ok(Page::from_vec(rows, page))
    }

    async fn messages_after(
        &self,
        project_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let mut rows: Vec<ChatMessage> = self
            .lock()
            .messages
            .iter()
            .filter(|m| m.project_id == project_id && m.created_at > after)
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.id));
        Ok(rows)
    }

    async fn search_messages(
        &self,
        project_id: Uuid,
        query: &str,
        page: PageRequest,
    ) -> Result<Page<ChatMessage>, AppError> {
        let mut rows: Vec<ChatMessage> = self
            .lock()
            .messages
            .iter()
            .filter(|m| m.project_id == project_id && contains_ci(&m.content, query))
            .cloned()
            .collect();
        rows.sort_by_key(|m| std::cmp::Reverse((m.created_at, m.id)));
        Ok(Page::from_vec(rows, page))
    }

    async fn latest_messages(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let mut rows: Vec<ChatMessage> = self
            .lock()
            .messages
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.created_at, m.id));
        let skip = rows.len().saturating_sub(limit.max(0) as usize);
        Ok(rows.split_off(skip))
    }

    async fn count_messages(&self, project_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .messages
            .iter()
            .filter(|m| m.project_id == project_id)
            .count() as i64)
    }
}

// ---------------------------------------------------------------------------
// MockHasher
// ---------------------------------------------------------------------------

/// Reversible "hash" so tests can assert on stored values.
#[derive(Debug, Clone, Copy)]
pub struct MockHasher;

impl PasswordHasher for MockHasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        Ok(format!("hashed:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("hashed:") == Some(password)
    }
}

// ---------------------------------------------------------------------------
// MockGitHub
// ---------------------------------------------------------------------------

/// Mock GitHub API returning a fixed profile and email list.
#[derive(Clone)]
pub struct MockGitHub {
    profile: Arc<Mutex<Option<Result<GitHubUser, AppError>>>>,
    emails: Arc<Mutex<Option<Result<Vec<GitHubEmail>, AppError>>>>,
    fallback: GitHubUser,
}

impl MockGitHub {
    pub fn new(profile: GitHubUser) -> Self {
        Self {
            profile: Arc::new(Mutex::new(None)),
            emails: Arc::new(Mutex::new(None)),
            fallback: profile,
        }
    }

    /// The next email lookup returns `emails`; later ones return no emails.
    pub fn with_emails(self, emails: Result<Vec<GitHubEmail>, AppError>) -> Self {
        *self.emails.lock().unwrap() = Some(emails);
        self
    }

    /// The next profile lookup fails with `error`.
    pub fn failing(error: AppError) -> Self {
        let mock = Self::new(GitHubUser::default());
        *mock.profile.lock().unwrap() = Some(Err(error));
        mock
    }
}

impl GitHubApi for MockGitHub {
    async fn fetch_user(&self, _access_token: &str) -> Result<GitHubUser, AppError> {
        match self.profile.lock().unwrap().take() {
            Some(result) => result,
            None => Ok(self.fallback.clone()),
        }
    }

    async fn fetch_emails(&self, _access_token: &str) -> Result<Vec<GitHubEmail>, AppError> {
        self.emails.lock().unwrap().take().unwrap_or(Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Event sink that records everything it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}
