use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use super::{
    NotificationService, SkillService, load_project, load_user, require_lead, require_member,
    require_not_member, require_open_seat,
};
use crate::constants::{CATEGORY_NAME_MAX_LENGTH, MIN_TEAM_SIZE, messages};
use crate::error::AppError;
use crate::events::DomainEvent;
use crate::notification::NewNotification;
use crate::page::{Page, PageRequest};
use crate::project::{
    NewProject, Project, ProjectCategory, ProjectMember, ProjectRole, ProjectSearch,
    ProjectSkill, ProjectStatus, ProjectUpdate, SkillRequirement, clean_tech_stack,
};
use crate::traits::{EventSink, NotificationStore, ProjectStore, SkillStore, UserStore};
use crate::user::User;
use crate::validation::{is_valid_length, normalize_optional};

/// Upper bound for the landing page's recent projects.
pub const RECENT_PROJECTS_LIMIT: i64 = 20;

/// Projects, their categories and team membership.
#[derive(Clone)]
pub struct ProjectService<P, S, U, N, E>
where
    P: ProjectStore,
    S: SkillStore,
    U: UserStore,
    N: NotificationStore,
    E: EventSink,
{
    projects: P,
    users: U,
    skills: SkillService<S>,
    notifier: NotificationService<N, E>,
}

impl<P, S, U, N, E> ProjectService<P, S, U, N, E>
where
    P: ProjectStore,
    S: SkillStore,
    U: UserStore,
    N: NotificationStore,
    E: EventSink,
{
    pub fn new(
        projects: P,
        users: U,
        skills: SkillService<S>,
        notifier: NotificationService<N, E>,
    ) -> Self {
        Self {
            projects,
            users,
            skills,
            notifier,
        }
    }

    // ----- Categories -----

    pub async fn list_categories(&self) -> Result<Vec<ProjectCategory>, AppError> {
        self.projects.list_categories().await
    }

    pub async fn search_categories(&self, query: &str) -> Result<Vec<ProjectCategory>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return self.projects.list_categories().await;
        }
        self.projects.search_categories(query).await
    }

    pub async fn get_category(&self, id: i64) -> Result<ProjectCategory, AppError> {
        self.projects
            .find_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::CATEGORY_NOT_FOUND.into()))
    }

    /// Find-or-create by name.
    pub async fn create_category(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<ProjectCategory, AppError> {
        let name = name.trim();
        if !is_valid_length(name, 2, CATEGORY_NAME_MAX_LENGTH) {
            return Err(AppError::invalid_field(
                "name",
                "Category name must be between 2 and 100 characters",
            ));
        }
        let description = normalize_optional(description);
        self.projects
            .create_category(name, description.as_deref())
            .await
    }

    // ----- Projects -----

    pub async fn create_project(&self, lead: &User, input: NewProject) -> Result<Project, AppError> {
        if input.skills.is_empty() {
            return Err(AppError::BadRequest(
                "Project must have at least one skill".into(),
            ));
        }
        input.validate()?;

        let category = match (input.category_id, input.category_name.as_deref()) {
            (Some(id), _) if id > 0 => Some(self.get_category(id).await?),
            (_, Some(name)) if !name.trim().is_empty() => {
                Some(self.projects.create_category(name.trim(), None).await?)
            }
            _ => None,
        };
        let skills = self.resolve_skills(&input.skills).await?;

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            category,
            status: ProjectStatus::Recruiting,
            lead_id: lead.id,
            lead_name: lead.full_name(),
            max_team_size: input.max_team_size.unwrap_or(MIN_TEAM_SIZE),
            current_team_size: 1,
            skills,
            tech_stack: clean_tech_stack(&input.tech_stack),
            problem_statement: normalize_optional(input.problem_statement),
            goals: normalize_optional(input.goals),
            objectives: normalize_optional(input.objectives),
            expected_start_date: input.expected_start_date,
            expected_end_date: input.expected_end_date,
            github_repo: normalize_optional(input.github_repo),
            demo_url: normalize_optional(input.demo_url),
            created_at: now,
            updated_at: now,
        };
        let project = self.projects.insert_project(&project).await?;
        tracing::info!(project_id = %project.id, lead_id = %lead.id, "Created project");
        Ok(project)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Project, AppError> {
        load_project(&self.projects, id).await
    }

    pub async fn update_project(
        &self,
        actor_id: Uuid,
        id: Uuid,
        update: ProjectUpdate,
    ) -> Result<Project, AppError> {
        let mut project = load_project(&self.projects, id).await?;
        require_lead(&project, actor_id, "update the project")?;
        update.validate()?;

        if let Some(size) = update.max_team_size
            && size < project.current_team_size
        {
            return Err(AppError::BadRequest(format!(
                "Max team size cannot be less than current team size ({})",
                project.current_team_size
            )));
        }
        if let Some(skills) = &update.skills
            && skills.is_empty()
        {
            return Err(AppError::BadRequest(
                "Project must have at least one skill".into(),
            ));
        }

        let previous_status = project.status;
        update.apply_scalars(&mut project);

        match (update.category_id, update.category_name.as_deref()) {
            (Some(0), _) => project.category = None,
            (Some(id), _) => project.category = Some(self.get_category(id).await?),
            (None, Some(name)) if name.trim().is_empty() => project.category = None,
            (None, Some(name)) => {
                project.category = Some(self.projects.create_category(name.trim(), None).await?)
            }
            (None, None) => {}
        }
        if let Some(skills) = &update.skills {
            project.skills = self.resolve_skills(skills).await?;
        }

        let project = self.projects.update_project(&project).await?;
        tracing::info!(project_id = %id, "Updated project");

        if project.status != previous_status {
            let change = format!("status changed to {}", project.status);
            self.notify_team(&project, &[actor_id], |user_id| {
                NewNotification::project_update(user_id, &project.title, &change, project.id)
            })
            .await?;
        }
        Ok(project)
    }

    /// Lead only, and not while the project is under way or done.
    pub async fn delete_project(&self, actor_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let project = load_project(&self.projects, id).await?;
        require_lead(&project, actor_id, "delete the project")?;
        if !project.can_delete() {
            return Err(AppError::BadRequest(
                "Cannot delete a project that is in progress or completed".into(),
            ));
        }
        self.projects.delete_project(id).await?;
        tracing::info!(project_id = %id, "Deleted project");
        Ok(())
    }

    /// Search the projects the caller is not involved in.
    pub async fn search_projects(
        &self,
        caller: Uuid,
        mut search: ProjectSearch,
        page: PageRequest,
    ) -> Result<Page<Project>, AppError> {
        search.exclude_user = Some(caller);
        search.involving_user = None;
        search.lead_id = None;
        self.projects.search_projects(&search, page).await
    }

    /// Recruiting projects with free seats the caller could join.
    pub async fn discover(&self, caller: Uuid, page: PageRequest) -> Result<Page<Project>, AppError> {
        let search = ProjectSearch {
            status: Some(ProjectStatus::Recruiting),
            available_only: true,
            exclude_user: Some(caller),
            ..Default::default()
        };
        self.projects.search_projects(&search, page).await
    }

    pub async fn my_projects(&self, caller: Uuid, page: PageRequest) -> Result<Page<Project>, AppError> {
        let search = ProjectSearch {
            involving_user: Some(caller),
            ..Default::default()
        };
        self.projects.search_projects(&search, page).await
    }

    pub async fn led_by(&self, caller: Uuid, page: PageRequest) -> Result<Page<Project>, AppError> {
        let search = ProjectSearch {
            lead_id: Some(caller),
            ..Default::default()
        };
        self.projects.search_projects(&search, page).await
    }

    pub async fn count_projects(&self) -> Result<i64, AppError> {
        self.projects.count_projects().await
    }

    pub async fn count_projects_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.projects.count_projects_for_user(user_id).await
    }

    pub async fn recent_projects(&self, limit: i64) -> Result<Vec<Project>, AppError> {
        self.projects
            .recent_projects(limit.clamp(1, RECENT_PROJECTS_LIMIT))
            .await
    }

    // ----- Members -----

    /// Visible to the team only.
    pub async fn members(&self, caller: Uuid, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError> {
        load_project(&self.projects, project_id).await?;
        require_member(&self.projects, project_id, caller).await?;
        self.projects.project_members(project_id).await
    }

    pub async fn add_member(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<ProjectMember, AppError> {
        let project = load_project(&self.projects, project_id).await?;
        require_lead(&project, actor_id, "add members")?;
        require_open_seat(&project)?;
        let user = load_user(&self.users, user_id).await?;
        require_not_member(&self.projects, project_id, user_id).await?;

        let member = self
            .projects
            .add_member(project_id, user_id, ProjectRole::Member)
            .await?;
        tracing::info!(%project_id, %user_id, "Added member");

        let name = user.full_name();
        self.notify_team(&project, &[actor_id, user_id], |recipient| {
            NewNotification::member_joined(recipient, &name, &project.title, project.id)
        })
        .await?;
        self.notifier
            .send(NewNotification::project_update(
                user_id,
                &project.title,
                "you have been added to the team",
                project.id,
            ))
            .await;
        Ok(member)
    }

    /// Lead only; the LEAD seat cannot be removed.
    pub async fn remove_member(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        member_id: i64,
    ) -> Result<(), AppError> {
        let project = load_project(&self.projects, project_id).await?;
        require_lead(&project, actor_id, "remove members")?;
        let member = self.member_of(project_id, member_id).await?;
        if member.is_lead() {
            return Err(AppError::BadRequest(
                "The project lead cannot be removed".into(),
            ));
        }
        self.projects.remove_member(member_id).await?;
        tracing::info!(%project_id, user_id = %member.user_id, "Removed member");
        self.notifier.publish(DomainEvent::MemberRemoved {
            project_id,
            user_id: member.user_id,
        });

        self.notifier
            .send(NewNotification::project_update(
                member.user_id,
                &project.title,
                "you have been removed from the team",
                project.id,
            ))
            .await;
        Ok(())
    }

    /// Lead only; roles cannot move to or from LEAD.
    pub async fn update_member_role(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        member_id: i64,
        role: ProjectRole,
    ) -> Result<ProjectMember, AppError> {
        let project = load_project(&self.projects, project_id).await?;
        require_lead(&project, actor_id, "change member roles")?;
        if role == ProjectRole::Lead {
            return Err(AppError::BadRequest("Cannot assign the LEAD role".into()));
        }
        let member = self.member_of(project_id, member_id).await?;
        if member.is_lead() {
            return Err(AppError::BadRequest(
                "Cannot change the role of the project lead".into(),
            ));
        }
        self.projects.update_member_role(member_id, role).await
    }

    pub async fn leave_project(&self, user: &User, project_id: Uuid) -> Result<(), AppError> {
        let project = load_project(&self.projects, project_id).await?;
        let member = self
            .projects
            .find_membership(project_id, user.id)
            .await?
            .ok_or_else(|| AppError::BadRequest("You are not a member of this project".into()))?;
        if member.is_lead() {
            return Err(AppError::BadRequest(
                "The project lead cannot leave the project".into(),
            ));
        }
        self.projects.remove_member(member.id).await?;
        tracing::info!(%project_id, user_id = %user.id, "Member left project");
        self.notifier.publish(DomainEvent::MemberRemoved {
            project_id,
            user_id: user.id,
        });

        let name = user.full_name();
        self.notify_team(&project, &[user.id], |recipient| {
            NewNotification::member_left(recipient, &name, &project.title, project.id)
        })
        .await
    }

    async fn member_of(&self, project_id: Uuid, member_id: i64) -> Result<ProjectMember, AppError> {
        self.projects
            .find_member(member_id)
            .await?
            .filter(|m| m.project_id == project_id)
            .ok_or_else(|| AppError::NotFound(messages::MEMBER_NOT_FOUND.into()))
    }

    /// Resolve requirements by id or name, dropping duplicates.
    async fn resolve_skills(
        &self,
        requirements: &[SkillRequirement],
    ) -> Result<Vec<ProjectSkill>, AppError> {
        let mut seen = HashSet::new();
        let mut skills = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let skill = match (requirement.skill_id, requirement.skill_name.as_deref()) {
                (Some(id), _) => self.skills.get_skill(id).await?,
                (None, Some(name)) => self.skills.find_or_create(name, None).await?,
                (None, None) => continue,
            };
            if seen.insert(skill.id) {
                skills.push(ProjectSkill {
                    skill_id: skill.id,
                    name: skill.name,
                    category: skill.category,
                    required: requirement.required.unwrap_or(true),
                });
            }
        }
        Ok(skills)
    }

    /// Notify every member except `except`.
    async fn notify_team(
        &self,
        project: &Project,
        except: &[Uuid],
        build: impl Fn(Uuid) -> NewNotification,
    ) -> Result<(), AppError> {
        for member in self.projects.project_members(project.id).await? {
            if !except.contains(&member.user_id) {
                self.notifier.send(build(member.user_id)).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationType;
    use crate::testutil::{InMemoryStore, RecordingSink, sample_new_project, sample_new_user};

    type Service =
        ProjectService<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore, RecordingSink>;

    fn service(store: &InMemoryStore) -> Service {
        ProjectService::new(
            store.clone(),
            store.clone(),
            SkillService::new(store.clone()),
            NotificationService::new(store.clone(), RecordingSink::new()),
        )
    }

    #[tokio::test]
    async fn create_inserts_lead_seat_and_skills() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let lead = store.insert_user(sample_new_user("lead@college.edu"));

        let mut input = sample_new_project();
        input.skills = vec![
            SkillRequirement {
                skill_name: Some("Rust".into()),
                ..Default::default()
            },
            SkillRequirement {
                skill_name: Some("rust".into()),
                required: Some(false),
                ..Default::default()
            },
        ];
        input.category_name = Some("Web Development".into());
        let project = svc.create_project(&lead, input).await.unwrap();

        assert_eq!(project.status, ProjectStatus::Recruiting);
        assert_eq!(project.current_team_size, 1);
        assert_eq!(project.skills.len(), 1);
        assert!(project.skills[0].required);
        assert_eq!(project.category.as_ref().unwrap().name, "Web Development");

        let members = svc.members(lead.id, project.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert!(members[0].is_lead());
        let skill = SkillService::new(store.clone()).get_skill(project.skills[0].skill_id).await.unwrap();
        assert_eq!(skill.projects_count, 1);
    }

    #[tokio::test]
    async fn create_without_skills_is_rejected() {
        let store = InMemoryStore::new();
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let mut input = sample_new_project();
        input.skills.clear();
        let err = service(&store).create_project(&lead, input).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Project must have at least one skill"));
    }

    #[tokio::test]
    async fn only_lead_updates_and_team_hears_status_changes() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let other = store.insert_user(sample_new_user("other@college.edu"));
        let project = svc.create_project(&lead, sample_new_project()).await.unwrap();
        svc.add_member(lead.id, project.id, other.id).await.unwrap();

        let err = svc
            .update_project(other.id, project.id, ProjectUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = svc
            .update_project(
                lead.id,
                project.id,
                ProjectUpdate {
                    category_name: Some("Research".into()),
                    status: Some(ProjectStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.category.unwrap().name, "Research");
        assert_eq!(updated.status, ProjectStatus::InProgress);

        let page = store
            .list_notifications(
                other.id,
                Some(NotificationType::ProjectUpdate),
                false,
                PageRequest::default(),
            )
            .await
            .unwrap();
        // One for being added, one for the status change.
        assert_eq!(page.total_elements, 2);

        let cleared = svc
            .update_project(
                lead.id,
                project.id,
                ProjectUpdate {
                    category_id: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.category.is_none());
    }

    #[tokio::test]
    async fn team_size_cannot_drop_below_members() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let a = store.insert_user(sample_new_user("a@college.edu"));
        let b = store.insert_user(sample_new_user("b@college.edu"));
        let mut input = sample_new_project();
        input.max_team_size = Some(4);
        let project = svc.create_project(&lead, input).await.unwrap();
        svc.add_member(lead.id, project.id, a.id).await.unwrap();
        svc.add_member(lead.id, project.id, b.id).await.unwrap();

        let err = svc
            .update_project(
                lead.id,
                project.id,
                ProjectUpdate {
                    max_team_size: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn add_member_enforces_capacity_and_uniqueness() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let a = store.insert_user(sample_new_user("a@college.edu"));
        let b = store.insert_user(sample_new_user("b@college.edu"));
        let mut input = sample_new_project();
        input.max_team_size = Some(2);
        let project = svc.create_project(&lead, input).await.unwrap();

        let stranger = svc.add_member(a.id, project.id, b.id).await.unwrap_err();
        assert!(matches!(stranger, AppError::Forbidden(_)));

        svc.add_member(lead.id, project.id, a.id).await.unwrap();
        let full = svc.add_member(lead.id, project.id, b.id).await.unwrap_err();
        assert!(matches!(full, AppError::Conflict(ref m) if m == messages::PROJECT_FULL));

        let roomy = svc.create_project(&lead, sample_new_project()).await.unwrap();
        svc.add_member(lead.id, roomy.id, a.id).await.unwrap();
        let again = svc.add_member(lead.id, roomy.id, a.id).await.unwrap_err();
        assert!(matches!(again, AppError::Conflict(ref m) if m == messages::ALREADY_MEMBER));
    }

    #[tokio::test]
    async fn lead_seat_is_protected() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let project = svc.create_project(&lead, sample_new_project()).await.unwrap();
        let seat = svc.members(lead.id, project.id).await.unwrap().remove(0);

        assert!(matches!(
            svc.remove_member(lead.id, project.id, seat.id).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            svc.update_member_role(lead.id, project.id, seat.id, ProjectRole::Member).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            svc.leave_project(&lead, project.id).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn leaving_notifies_the_team() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let member = store.insert_user(sample_new_user("m@college.edu"));
        let project = svc.create_project(&lead, sample_new_project()).await.unwrap();
        svc.add_member(lead.id, project.id, member.id).await.unwrap();

        svc.leave_project(&member, project.id).await.unwrap();
        assert_eq!(svc.get_project(project.id).await.unwrap().current_team_size, 1);
        let page = store
            .list_notifications(lead.id, Some(NotificationType::MemberLeft), false, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
        assert!(matches!(
            svc.members(member.id, project.id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn removal_and_leaving_are_broadcast() {
        let store = InMemoryStore::new();
        let sink = RecordingSink::new();
        let svc = ProjectService::new(
            store.clone(),
            store.clone(),
            SkillService::new(store.clone()),
            NotificationService::new(store.clone(), sink.clone()),
        );
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let kicked = store.insert_user(sample_new_user("kicked@college.edu"));
        let quitter = store.insert_user(sample_new_user("quitter@college.edu"));
        let project = svc.create_project(&lead, sample_new_project()).await.unwrap();
        let seat = svc.add_member(lead.id, project.id, kicked.id).await.unwrap();
        svc.add_member(lead.id, project.id, quitter.id).await.unwrap();

        svc.remove_member(lead.id, project.id, seat.id).await.unwrap();
        svc.leave_project(&quitter, project.id).await.unwrap();

        let removed: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, DomainEvent::MemberRemoved { .. }))
            .collect();
        assert_eq!(removed.len(), 2);
        assert!(removed[0].removes(project.id, kicked.id));
        assert!(removed[1].removes(project.id, quitter.id));
        assert!(!removed[0].removes(project.id, lead.id));
    }

    #[tokio::test]
    async fn delete_refused_while_in_progress() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let project = svc.create_project(&lead, sample_new_project()).await.unwrap();
        svc.update_project(
            lead.id,
            project.id,
            ProjectUpdate {
                status: Some(ProjectStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            svc.delete_project(lead.id, project.id).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn listings_respect_involvement() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let outsider = store.insert_user(sample_new_user("out@college.edu"));
        let project = svc.create_project(&lead, sample_new_project()).await.unwrap();

        let discover = svc.discover(outsider.id, PageRequest::default()).await.unwrap();
        assert_eq!(discover.content.len(), 1);
        assert!(svc.discover(lead.id, PageRequest::default()).await.unwrap().content.is_empty());
        assert_eq!(svc.my_projects(lead.id, PageRequest::default()).await.unwrap().content[0].id, project.id);
        assert_eq!(svc.led_by(lead.id, PageRequest::default()).await.unwrap().total_elements, 1);
        assert_eq!(svc.count_projects_for_user(lead.id).await.unwrap(), 1);

        let search = ProjectSearch {
            query: Some("CAMPUS".into()),
            ..Default::default()
        };
        let found = svc.search_projects(outsider.id, search.clone(), PageRequest::default()).await.unwrap();
        assert_eq!(found.total_elements, 1);
        let hidden = svc.search_projects(lead.id, search, PageRequest::default()).await.unwrap();
        assert_eq!(hidden.total_elements, 0);
    }

    #[tokio::test]
    async fn category_find_or_create() {
        let store = InMemoryStore::new();
        let svc = service(&store);
        let a = svc.create_category("Mobile App", None).await.unwrap();
        let b = svc.create_category("mobile app", Some("dup".into())).await.unwrap();
        assert_eq!(a.id, b.id);
        assert!(matches!(svc.get_category(999).await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.create_category("x", None).await, Err(AppError::Validation(_))));
    }
}
