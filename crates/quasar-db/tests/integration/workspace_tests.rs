use chrono::{NaiveDate, TimeDelta, Utc};

use quasar_core::chat::{MessageType, NewChatMessage};
use quasar_core::notification::{NewNotification, NotificationType};
use quasar_core::page::PageRequest;
use quasar_core::task::{NewTaskRecord, TaskFilter, TaskPriority, TaskStatus};
use quasar_core::traits::{ChatStore, NotificationStore, TaskStore};

use crate::integration::common::{create_project, create_user, setup_test_db};

#[tokio::test]
async fn task_lifecycle_with_assignee_names() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let dev = create_user(&db, "dev@college.edu").await;
    let project = create_project(&db, &lead, "Campus Connect").await;
    let tasks = db.tasks();

    let task = tasks
        .create_task(&NewTaskRecord {
            project_id: project.id,
            title: "Design schema".into(),
            description: Some("Tables for events".into()),
            priority: TaskPriority::High,
            assigned_to_id: Some(dev.id),
            created_by_id: lead.id,
            due_date: NaiveDate::from_ymd_opt(2030, 1, 15),
            estimated_hours: Some(6),
        })
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.assigned_to_name, Some(dev.full_name()));
    assert_eq!(task.created_by_name, lead.full_name());

    let mut done = task.clone();
    done.mark_completed(dev.id, Utc::now());
    done.actual_hours = Some(8);
    let done = tasks.update_task(&done).await.unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.completed_by_id, Some(dev.id));
    assert_eq!(done.actual_hours, Some(8));

    assert_eq!(tasks.tasks_assigned_to(dev.id).await.unwrap().len(), 1);
    tasks.delete_task(task.id).await.unwrap();
    assert!(tasks.find_task(task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn list_tasks_filters_and_orders_by_due_date() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let project = create_project(&db, &lead, "Campus Connect").await;
    let tasks = db.tasks();
    for (title, priority, due) in [
        ("Write docs", TaskPriority::Low, None),
        ("Fix login", TaskPriority::Critical, NaiveDate::from_ymd_opt(2030, 3, 1)),
        ("Deploy beta", TaskPriority::High, NaiveDate::from_ymd_opt(2030, 2, 1)),
    ] {
        tasks
            .create_task(&NewTaskRecord {
                project_id: project.id,
                title: title.into(),
                description: None,
                priority,
                assigned_to_id: None,
                created_by_id: lead.id,
                due_date: due,
                estimated_hours: None,
            })
            .await
            .unwrap();
    }

    let critical = TaskFilter {
        priority: Some(TaskPriority::Critical),
        ..Default::default()
    };
    let page = tasks
        .list_tasks(project.id, &critical, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].title, "Fix login");

    let ordered: Vec<_> = tasks
        .project_tasks(project.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(ordered, vec!["Deploy beta", "Fix login", "Write docs"]);
}

#[tokio::test]
async fn notifications_read_state_and_retention() {
    let (db, _container) = setup_test_db().await;
    let user = create_user(&db, "ada@college.edu").await;
    let notifications = db.notifications();

    let first = notifications
        .create_notification(&NewNotification::system(user.id, "Welcome", "Hello"))
        .await
        .unwrap();
    notifications
        .create_notification(&NewNotification::system(user.id, "Reminder", "Fill your profile"))
        .await
        .unwrap();
    assert_eq!(notifications.unread_count(user.id).await.unwrap(), 2);

    let read = notifications.mark_read(first.id, Utc::now()).await.unwrap();
    assert!(read.is_read);
    let again = notifications.mark_read(first.id, Utc::now()).await.unwrap();
    assert_eq!(again.read_at, read.read_at);

    let unread = notifications
        .list_notifications(user.id, Some(NotificationType::System), true, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(unread.total_elements, 1);
    assert_eq!(unread.content[0].title, "Reminder");

    assert_eq!(notifications.mark_all_read(user.id, Utc::now()).await.unwrap(), 1);
    assert_eq!(notifications.unread_count(user.id).await.unwrap(), 0);

    let purged = notifications
        .delete_notifications_before(Utc::now() + TimeDelta::seconds(1))
        .await
        .unwrap();
    assert_eq!(purged, 2);
}

#[tokio::test]
async fn chat_pages_newest_first_and_latest_oldest_first() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let project = create_project(&db, &lead, "Campus Connect").await;
    let chat = db.chat();
    for content in ["first", "second", "third"] {
        chat.create_message(&NewChatMessage {
            project_id: project.id,
            sender_id: Some(lead.id),
            content: content.into(),
            message_type: MessageType::Text,
        })
        .await
        .unwrap();
    }
    let system = chat
        .create_message(&NewChatMessage {
            project_id: project.id,
            sender_id: None,
            content: "Grace joined the team".into(),
            message_type: MessageType::System,
        })
        .await
        .unwrap();
    assert!(system.sender_name.is_none());

    let page = chat
        .list_messages(project.id, PageRequest::new(Some(0), Some(2)))
        .await
        .unwrap();
    assert_eq!(page.total_elements, 4);
    assert_eq!(page.content[0].id, system.id);

    let latest: Vec<_> = chat
        .latest_messages(project.id, 2)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(latest, vec!["third", "Grace joined the team"]);

    let found = chat
        .search_messages(project.id, "SEC", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(found.content.len(), 1);

    let edited = chat
        .edit_message(found.content[0].id, "second, edited", Utc::now())
        .await
        .unwrap();
    assert!(edited.is_edited);
    assert_eq!(chat.count_messages(project.id).await.unwrap(), 4);
}
