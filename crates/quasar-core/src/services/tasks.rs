use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{NotificationService, load_project, require_member};
use crate::constants::messages;
use crate::error::AppError;
use crate::notification::NewNotification;
use crate::page::{Page, PageRequest};
use crate::project::Project;
use crate::task::{
    AssigneeChange, NewTask, NewTaskRecord, Task, TaskFilter, TaskStatistics, TaskStatus,
    TaskUpdate,
};
use crate::traits::{EventSink, NotificationStore, ProjectStore, TaskStore};
use crate::validation::normalize_optional;

/// Horizon of the "due soon" listing when none is given.
pub const DEFAULT_DUE_SOON_DAYS: i64 = 7;
/// Widest due-soon window, in days.
pub const MAX_DUE_SOON_DAYS: i64 = 3650;

/// Project task boards.
#[derive(Clone)]
pub struct TaskService<P, T, N, E>
where
    P: ProjectStore,
    T: TaskStore,
    N: NotificationStore,
    E: EventSink,
{
    projects: P,
    tasks: T,
    notifier: NotificationService<N, E>,
}

impl<P, T, N, E> TaskService<P, T, N, E>
where
    P: ProjectStore,
    T: TaskStore,
    N: NotificationStore,
    E: EventSink,
{
    pub fn new(projects: P, tasks: T, notifier: NotificationService<N, E>) -> Self {
        Self {
            projects,
            tasks,
            notifier,
        }
    }

    pub async fn create_task(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        input: NewTask,
    ) -> Result<Task, AppError> {
        input.validate()?;
        let project = load_project(&self.projects, project_id).await?;
        require_member(&self.projects, project_id, actor_id).await?;
        if let Some(assignee) = input.assigned_to_id {
            self.require_assignable(project_id, assignee).await?;
        }

        let task = self
            .tasks
            .create_task(&NewTaskRecord {
                project_id,
                title: input.title.trim().to_string(),
                description: normalize_optional(input.description),
                priority: input.priority.unwrap_or_default(),
                assigned_to_id: input.assigned_to_id,
                created_by_id: actor_id,
                due_date: input.due_date,
                estimated_hours: input.estimated_hours,
            })
            .await?;
        tracing::info!(task_id = task.id, %project_id, "Created task");

        self.notify_assignee(&project, &task, actor_id).await;
        Ok(task)
    }

    /// Team members only.
    pub async fn get_task(&self, actor_id: Uuid, id: i64) -> Result<Task, AppError> {
        let task = self.load_task(id).await?;
        require_member(&self.projects, task.project_id, actor_id).await?;
        Ok(task)
    }

    /// The creator, the assignee or the lead may edit.
    pub async fn update_task(
        &self,
        actor_id: Uuid,
        id: i64,
        update: TaskUpdate,
    ) -> Result<Task, AppError> {
        update.validate()?;
        let mut task = self.load_task(id).await?;
        let project = load_project(&self.projects, task.project_id).await?;
        if task.created_by_id != actor_id
            && task.assigned_to_id != Some(actor_id)
            && !project.is_lead(actor_id)
        {
            return Err(AppError::Forbidden(
                "only the task creator, assignee or project lead can update this task".into(),
            ));
        }

        let previous_assignee = task.assigned_to_id;
        if let Some(title) = &update.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            task.description = normalize_optional(Some(description));
        }
        match update.assignee {
            Some(AssigneeChange::Assign(user_id)) => {
                self.require_assignable(project.id, user_id).await?;
                task.assigned_to_id = Some(user_id);
            }
            Some(AssigneeChange::Unassign) => task.assigned_to_id = None,
            None => {}
        }
        if let Some(status) = update.status
            && status != task.status
        {
            if status == TaskStatus::Completed {
                task.mark_completed(actor_id, Utc::now());
            } else {
                task.status = status;
                task.completed_at = None;
                task.completed_by_id = None;
            }
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(hours) = update.estimated_hours {
            task.estimated_hours = Some(hours);
        }
        if let Some(hours) = update.actual_hours {
            task.actual_hours = Some(hours);
        }

        let task = self.tasks.update_task(&task).await?;
        if task.assigned_to_id != previous_assignee {
            self.notify_assignee(&project, &task, actor_id).await;
        }
        Ok(task)
    }

    /// The creator or the lead may delete.
    pub async fn delete_task(&self, actor_id: Uuid, id: i64) -> Result<(), AppError> {
        let task = self.load_task(id).await?;
        let project = load_project(&self.projects, task.project_id).await?;
        if task.created_by_id != actor_id && !project.is_lead(actor_id) {
            return Err(AppError::Forbidden(
                "only the task creator or project lead can delete this task".into(),
            ));
        }
        self.tasks.delete_task(id).await?;
        tracing::info!(task_id = id, project_id = %project.id, "Deleted task");
        Ok(())
    }

    /// Flip between COMPLETED and TODO. Any team member may do this.
    pub async fn toggle_complete(&self, actor_id: Uuid, id: i64) -> Result<Task, AppError> {
        let mut task = self.load_task(id).await?;
        require_member(&self.projects, task.project_id, actor_id).await?;
        task.toggle_complete(actor_id, Utc::now());
        self.tasks.update_task(&task).await
    }

    /// Lead or creator; `assignee == None` unassigns.
    pub async fn assign_task(
        &self,
        actor_id: Uuid,
        id: i64,
        assignee: Option<Uuid>,
    ) -> Result<Task, AppError> {
        let mut task = self.load_task(id).await?;
        let project = load_project(&self.projects, task.project_id).await?;
        if task.created_by_id != actor_id && !project.is_lead(actor_id) {
            return Err(AppError::Forbidden(
                "only the task creator or project lead can assign this task".into(),
            ));
        }
        if let Some(user_id) = assignee {
            self.require_assignable(project.id, user_id).await?;
        }
        let changed = task.assigned_to_id != assignee;
        task.assigned_to_id = assignee;
        let task = self.tasks.update_task(&task).await?;
        if changed {
            self.notify_assignee(&project, &task, actor_id).await;
        }
        Ok(task)
    }

    pub async fn list_tasks(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> Result<Page<Task>, AppError> {
        self.require_team(project_id, actor_id).await?;
        self.tasks.list_tasks(project_id, filter, page).await
    }

    pub async fn search_tasks(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        query: &str,
        page: PageRequest,
    ) -> Result<Page<Task>, AppError> {
        let filter = TaskFilter {
            query: Some(query.trim().to_string()).filter(|q| !q.is_empty()),
            ..Default::default()
        };
        self.list_tasks(actor_id, project_id, &filter, page).await
    }

    pub async fn overdue_tasks(&self, actor_id: Uuid, project_id: Uuid) -> Result<Vec<Task>, AppError> {
        let today = today();
        self.board(actor_id, project_id, |t| t.is_overdue(today)).await
    }

    pub async fn due_today(&self, actor_id: Uuid, project_id: Uuid) -> Result<Vec<Task>, AppError> {
        let today = today();
        self.board(actor_id, project_id, |t| t.is_due_today(today)).await
    }

    pub async fn due_within(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        days: Option<i64>,
    ) -> Result<Vec<Task>, AppError> {
        let days = days
            .unwrap_or(DEFAULT_DUE_SOON_DAYS)
            .clamp(0, MAX_DUE_SOON_DAYS);
        let today = today();
        self.board(actor_id, project_id, |t| t.is_due_within(today, days))
            .await
    }

    /// Tasks assigned to the caller across all projects.
    pub async fn my_tasks(&self, user_id: Uuid) -> Result<Vec<Task>, AppError> {
        self.tasks.tasks_assigned_to(user_id).await
    }

    pub async fn statistics(&self, actor_id: Uuid, project_id: Uuid) -> Result<TaskStatistics, AppError> {
        let tasks = self.board(actor_id, project_id, |_| true).await?;
        Ok(TaskStatistics::from_tasks(&tasks, today()))
    }

    async fn board(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        keep: impl Fn(&Task) -> bool,
    ) -> Result<Vec<Task>, AppError> {
        self.require_team(project_id, actor_id).await?;
        let mut tasks = self.tasks.project_tasks(project_id).await?;
        tasks.retain(|t| keep(t));
        Ok(tasks)
    }

    async fn require_team(&self, project_id: Uuid, actor_id: Uuid) -> Result<(), AppError> {
        load_project(&self.projects, project_id).await?;
        require_member(&self.projects, project_id, actor_id).await?;
        Ok(())
    }

    async fn require_assignable(&self, project_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        match self.projects.find_membership(project_id, user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::BadRequest(
                "Assignee must be a member of this project".into(),
            )),
        }
    }

    async fn load_task(&self, id: i64) -> Result<Task, AppError> {
        self.tasks
            .find_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::TASK_NOT_FOUND.into()))
    }

    async fn notify_assignee(&self, project: &Project, task: &Task, actor_id: Uuid) {
        if let Some(assignee) = task.assigned_to_id
            && assignee != actor_id
        {
            self.notifier
                .send(NewNotification::task_assigned(
                    assignee,
                    &task.title,
                    &project.title,
                    task.id,
                ))
                .await;
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::notification::NotificationType;
    use crate::services::{ProjectService, SkillService};
    use crate::task::TaskPriority;
    use crate::testutil::{InMemoryStore, RecordingSink, sample_new_project, sample_new_user};
    use crate::user::User;

    type Service = TaskService<InMemoryStore, InMemoryStore, InMemoryStore, RecordingSink>;

    struct Fixture {
        store: InMemoryStore,
        svc: Service,
        lead: User,
        member: User,
        outsider: User,
        project: Project,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let notifier = NotificationService::new(store.clone(), RecordingSink::new());
        let projects = ProjectService::new(
            store.clone(),
            store.clone(),
            SkillService::new(store.clone()),
            notifier.clone(),
        );
        let lead = store.insert_user(sample_new_user("lead@college.edu"));
        let member = store.insert_user(sample_new_user("member@college.edu"));
        let outsider = store.insert_user(sample_new_user("outsider@college.edu"));
        let project = projects
            .create_project(&lead, sample_new_project())
            .await
            .unwrap();
        projects.add_member(lead.id, project.id, member.id).await.unwrap();
        Fixture {
            svc: TaskService::new(store.clone(), store.clone(), notifier),
            store,
            lead,
            member,
            outsider,
            project,
        }
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_defaults_and_assignment_notice() {
        let f = fixture().await;
        let mut input = new_task("Design schema");
        input.assigned_to_id = Some(f.member.id);
        let task = f.svc.create_task(f.lead.id, f.project.id, input).await.unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.created_by_id, f.lead.id);

        let notices = f
            .store
            .list_notifications(f.member.id, Some(NotificationType::TeamUpdate), false, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(notices.total_elements, 1);
    }

    #[tokio::test]
    async fn outsiders_are_kept_out() {
        let f = fixture().await;
        let err = f
            .svc
            .create_task(f.outsider.id, f.project.id, new_task("Sneaky"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let task = f
            .svc
            .create_task(f.member.id, f.project.id, new_task("Write docs"))
            .await
            .unwrap();
        assert!(matches!(
            f.svc.get_task(f.outsider.id, task.id).await,
            Err(AppError::Forbidden(_))
        ));

        let mut input = new_task("Assign outside");
        input.assigned_to_id = Some(f.outsider.id);
        let err = f.svc.create_task(f.lead.id, f.project.id, input).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_permissions_and_completion() {
        let f = fixture().await;
        let task = f
            .svc
            .create_task(f.lead.id, f.project.id, new_task("Set up CI"))
            .await
            .unwrap();

        let denied = f
            .svc
            .update_task(f.member.id, task.id, TaskUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(denied, AppError::Forbidden(_)));

        let assigned = f
            .svc
            .update_task(
                f.lead.id,
                task.id,
                TaskUpdate {
                    assignee: Some(AssigneeChange::Assign(f.member.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(assigned.assigned_to_id, Some(f.member.id));

        let done = f
            .svc
            .update_task(
                f.member.id,
                task.id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    actual_hours: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(done.completed_by_id, Some(f.member.id));
        assert!(done.completed_at.is_some());
        assert_eq!(done.actual_hours, Some(3));

        let unassigned = f
            .svc
            .update_task(
                f.lead.id,
                task.id,
                TaskUpdate {
                    assignee: Some(AssigneeChange::Unassign),
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(unassigned.assigned_to_id, None);
        assert_eq!(unassigned.completed_at, None);
    }

    #[tokio::test]
    async fn toggle_and_delete() {
        let f = fixture().await;
        let task = f
            .svc
            .create_task(f.lead.id, f.project.id, new_task("Demo video"))
            .await
            .unwrap();

        let done = f.svc.toggle_complete(f.member.id, task.id).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        let reopened = f.svc.toggle_complete(f.member.id, task.id).await.unwrap();
        assert_eq!(reopened.status, TaskStatus::Todo);
        assert_eq!(reopened.completed_by_id, None);

        assert!(matches!(
            f.svc.delete_task(f.member.id, task.id).await,
            Err(AppError::Forbidden(_))
        ));
        f.svc.delete_task(f.lead.id, task.id).await.unwrap();
        assert!(matches!(
            f.svc.get_task(f.lead.id, task.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn assign_requires_creator_or_lead() {
        let f = fixture().await;
        let task = f
            .svc
            .create_task(f.member.id, f.project.id, new_task("Pitch deck"))
            .await
            .unwrap();
        let assigned = f.svc.assign_task(f.member.id, task.id, Some(f.lead.id)).await.unwrap();
        assert_eq!(assigned.assigned_to_id, Some(f.lead.id));
        let cleared = f.svc.assign_task(f.lead.id, task.id, None).await.unwrap();
        assert_eq!(cleared.assigned_to_id, None);
        assert!(matches!(
            f.svc.assign_task(f.outsider.id, task.id, None).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn due_date_views_and_statistics() {
        let f = fixture().await;
        let today = today();
        let make = |title: &str, due: NaiveDate| NewTask {
            title: title.into(),
            due_date: Some(due),
            assigned_to_id: Some(f.member.id),
            ..Default::default()
        };
        f.svc
            .create_task(f.lead.id, f.project.id, make("Late report", today - TimeDelta::days(2)))
            .await
            .unwrap();
        f.svc
            .create_task(f.lead.id, f.project.id, make("Standup notes", today))
            .await
            .unwrap();
        let later = f
            .svc
            .create_task(f.lead.id, f.project.id, make("Retro", today + TimeDelta::days(5)))
            .await
            .unwrap();
        f.svc.toggle_complete(f.lead.id, later.id).await.unwrap();

        assert_eq!(f.svc.overdue_tasks(f.member.id, f.project.id).await.unwrap().len(), 1);
        assert_eq!(f.svc.due_today(f.member.id, f.project.id).await.unwrap().len(), 1);
        // The completed task is no longer due.
        assert_eq!(f.svc.due_within(f.member.id, f.project.id, None).await.unwrap().len(), 1);
        let wide = f
            .svc
            .due_within(f.member.id, f.project.id, Some(1_000_000_000))
            .await
            .unwrap();
        assert_eq!(wide.len(), 1);

        let stats = f.svc.statistics(f.member.id, f.project.id).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_percentage, 33.3);

        assert_eq!(f.svc.my_tasks(f.member.id).await.unwrap().len(), 3);
        let found = f
            .svc
            .search_tasks(f.lead.id, f.project.id, "standup", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(found.total_elements, 1);
    }
}
