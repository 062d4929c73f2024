use quasar_core::error::AppError;
use quasar_core::page::PageRequest;
use quasar_core::skill::{Skill, SkillLevel};
use quasar_core::testutil::sample_new_user;
use quasar_core::traits::{SkillStore, UserStore};
use quasar_core::user::{AvailabilityStatus, UserSearch};

use crate::integration::common::{create_skill, create_user, setup_test_db};

#[tokio::test]
async fn create_user_normalizes_email_and_finds_case_insensitively() {
    let (db, _container) = setup_test_db().await;
    let users = db.users();

    let user = users
        .create_user(&sample_new_user("Ada@College.edu"))
        .await
        .unwrap();
    assert_eq!(user.email, "ada@college.edu");

    let found = users
        .find_user_by_email("ADA@college.EDU")
        .await
        .unwrap()
        .expect("user by email");
    assert_eq!(found.id, user.id);
    assert_eq!(users.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (db, _container) = setup_test_db().await;
    create_user(&db, "ada@college.edu").await;

    let err = db
        .users()
        .create_user(&sample_new_user("ADA@college.edu"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn update_user_writes_profile_fields() {
    let (db, _container) = setup_test_db().await;
    let mut user = create_user(&db, "ada@college.edu").await;

    user.bio = Some("Compilers and coffee".into());
    user.availability_status = AvailabilityStatus::Busy;
    user.linkedin_url = Some("https://linkedin.com/in/ada".into());
    let updated = db.users().update_user(&user).await.unwrap();

    assert_eq!(updated.bio.as_deref(), Some("Compilers and coffee"));
    assert_eq!(updated.availability_status, AvailabilityStatus::Busy);
    assert_eq!(updated.linkedin_url.as_deref(), Some("https://linkedin.com/in/ada"));
    assert!(updated.updated_at >= user.updated_at);
}

#[tokio::test]
async fn search_users_filters_by_skill_and_excludes_caller() {
    let (db, _container) = setup_test_db().await;
    let ada = create_user(&db, "ada@college.edu").await;
    let grace = create_user(&db, "grace@college.edu").await;
    create_user(&db, "linus@college.edu").await;
    let rust = create_skill(&db, "Rust").await;
    db.skills()
        .add_user_skill(grace.id, rust.id, SkillLevel::Advanced, None)
        .await
        .unwrap();

    let search = UserSearch {
        skill: Some("rust".into()),
        exclude_user: Some(ada.id),
        ..Default::default()
    };
    let page = db.users().search_users(&search, PageRequest::default()).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].id, grace.id);

    let by_name = UserSearch {
        query: Some("LIN".into()),
        ..Default::default()
    };
    let page = db.users().search_users(&by_name, PageRequest::default()).await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].first_name, "Linus");
}

#[tokio::test]
async fn insert_skill_is_idempotent_by_name() {
    let (db, _container) = setup_test_db().await;
    let skills = db.skills();

    let first = skills.insert_skill(&Skill::build("React", None, None)).await.unwrap();
    let again = skills.insert_skill(&Skill::build("react", None, None)).await.unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(again.name, "React");
    assert_eq!(skills.list_skills(PageRequest::default()).await.unwrap().total_elements, 1);
}

#[tokio::test]
async fn user_skill_lifecycle_and_duplicate_conflict() {
    let (db, _container) = setup_test_db().await;
    let ada = create_user(&db, "ada@college.edu").await;
    let rust = create_skill(&db, "Rust").await;
    let skills = db.skills();

    let added = skills
        .add_user_skill(ada.id, rust.id, SkillLevel::Beginner, Some("Side projects"))
        .await
        .unwrap();
    assert_eq!(added.skill_name, "Rust");
    assert_eq!(added.level, SkillLevel::Beginner);

    let err = skills
        .add_user_skill(ada.id, rust.id, SkillLevel::Advanced, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let updated = skills
        .update_user_skill(added.id, SkillLevel::Intermediate, None)
        .await
        .unwrap();
    assert_eq!(updated.level, SkillLevel::Intermediate);
    assert!(updated.experience.is_none());

    skills.delete_user_skill(added.id).await.unwrap();
    assert!(skills.user_skills(ada.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn usage_counters_never_go_negative_and_drive_popularity() {
    let (db, _container) = setup_test_db().await;
    let rust = create_skill(&db, "Rust").await;
    let go = create_skill(&db, "Go").await;
    let skills = db.skills();

    skills.adjust_skill_usage(go.id, 2, 0).await.unwrap();
    skills.adjust_skill_usage(rust.id, -5, 1).await.unwrap();

    let rust = skills.find_skill(rust.id).await.unwrap().unwrap();
    assert_eq!(rust.users_count, 0);
    assert_eq!(rust.projects_count, 1);

    let popular = skills.popular_skills(PageRequest::default()).await.unwrap();
    let names: Vec<_> = popular.content.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Go", "Rust"]);
}
