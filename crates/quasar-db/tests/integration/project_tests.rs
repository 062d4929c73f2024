use quasar_core::error::AppError;
use quasar_core::page::PageRequest;
use quasar_core::project::{ProjectRole, ProjectSearch, ProjectStatus};
use quasar_core::traits::{ProjectStore, SkillStore};

use crate::integration::common::{
    create_project, create_skill, create_user, project_for, setup_test_db,
};

#[tokio::test]
async fn insert_project_adds_lead_and_counts_skills() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let rust = create_skill(&db, "Rust").await;

    let project = db
        .projects()
        .insert_project(&project_for(&lead, "Campus Connect", 4, &[rust.clone()]))
        .await
        .unwrap();

    assert_eq!(project.lead_name, lead.full_name());
    assert_eq!(project.current_team_size, 1);
    assert_eq!(project.skills.len(), 1);
    assert_eq!(project.tech_stack, vec!["axum", "postgres"]);

    let members = db.projects().project_members(project.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, ProjectRole::Lead);

    let rust = db.skills().find_skill(rust.id).await.unwrap().unwrap();
    assert_eq!(rust.projects_count, 1);
}

#[tokio::test]
async fn update_project_replaces_skills_and_category() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let rust = create_skill(&db, "Rust").await;
    let go = create_skill(&db, "Go").await;
    let projects = db.projects();
    let mut project = projects
        .insert_project(&project_for(&lead, "Campus Connect", 4, &[rust.clone()]))
        .await
        .unwrap();

    let category = projects.create_category("Web Development", None).await.unwrap();
    let replacement = project_for(&lead, "Campus Connect", 4, &[go.clone()]);
    project.skills = replacement.skills;
    project.category = Some(category.clone());
    project.status = ProjectStatus::InProgress;
    let updated = projects.update_project(&project).await.unwrap();

    assert_eq!(updated.status, ProjectStatus::InProgress);
    assert_eq!(updated.category.map(|c| c.id), Some(category.id));
    assert_eq!(updated.skills.len(), 1);
    assert_eq!(updated.skills[0].skill_id, go.id);
    assert_eq!(db.skills().find_skill(rust.id).await.unwrap().unwrap().projects_count, 0);
    assert_eq!(db.skills().find_skill(go.id).await.unwrap().unwrap().projects_count, 1);
}

#[tokio::test]
async fn delete_project_releases_skill_counts() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let rust = create_skill(&db, "Rust").await;
    let projects = db.projects();
    let project = projects
        .insert_project(&project_for(&lead, "Campus Connect", 4, &[rust.clone()]))
        .await
        .unwrap();

    projects.delete_project(project.id).await.unwrap();

    assert!(projects.find_project(project.id).await.unwrap().is_none());
    assert_eq!(db.skills().find_skill(rust.id).await.unwrap().unwrap().projects_count, 0);
}

#[tokio::test]
async fn create_category_returns_existing_on_same_name() {
    let (db, _container) = setup_test_db().await;
    let projects = db.projects();

    let first = projects.create_category("Machine Learning", Some("Models")).await.unwrap();
    let again = projects.create_category("machine learning", None).await.unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(projects.list_categories().await.unwrap().len(), 1);
    assert_eq!(projects.search_categories("learn").await.unwrap().len(), 1);
}

#[tokio::test]
async fn search_projects_discover_and_involvement_filters() {
    let (db, _container) = setup_test_db().await;
    let ada = create_user(&db, "ada@college.edu").await;
    let grace = create_user(&db, "grace@college.edu").await;
    let projects = db.projects();
    let mine = create_project(&db, &ada, "Campus Connect").await;
    let theirs = create_project(&db, &grace, "Library Tracker").await;
    let joined = create_project(&db, &grace, "Robotics Portal").await;
    projects
        .add_member(joined.id, ada.id, ProjectRole::Member)
        .await
        .unwrap();

    let discover = ProjectSearch {
        exclude_user: Some(ada.id),
        available_only: true,
        ..Default::default()
    };
    let page = projects.search_projects(&discover, PageRequest::default()).await.unwrap();
    let ids: Vec<_> = page.content.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![theirs.id]);

    let involved = ProjectSearch {
        involving_user: Some(ada.id),
        ..Default::default()
    };
    let page = projects.search_projects(&involved, PageRequest::default()).await.unwrap();
    assert_eq!(page.total_elements, 2);
    assert!(page.content.iter().any(|p| p.id == mine.id));
    assert!(page.content.iter().any(|p| p.id == joined.id && p.current_team_size == 2));

    let by_text = ProjectSearch {
        query: Some("library".into()),
        ..Default::default()
    };
    let page = projects.search_projects(&by_text, PageRequest::default()).await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(projects.count_projects_for_user(ada.id).await.unwrap(), 2);
    assert_eq!(projects.count_projects().await.unwrap(), 3);
}

#[tokio::test]
async fn membership_changes_and_duplicate_member_conflict() {
    let (db, _container) = setup_test_db().await;
    let lead = create_user(&db, "lead@college.edu").await;
    let member = create_user(&db, "member@college.edu").await;
    let projects = db.projects();
    let project = create_project(&db, &lead, "Campus Connect").await;

    let seat = projects
        .add_member(project.id, member.id, ProjectRole::Member)
        .await
        .unwrap();
    assert_eq!(seat.email, "member@college.edu");

    let err = projects
        .add_member(project.id, member.id, ProjectRole::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let promoted = projects.update_member_role(seat.id, ProjectRole::Lead).await.unwrap();
    assert_eq!(promoted.role, ProjectRole::Lead);

    projects.remove_member(seat.id).await.unwrap();
    assert!(projects
        .find_membership(project.id, member.id)
        .await
        .unwrap()
        .is_none());
}
