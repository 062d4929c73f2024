use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use uuid::Uuid;

use quasar_core::project::{Project, ProjectSkill, ProjectStatus};
use quasar_core::skill::Skill;
use quasar_core::testutil::sample_new_user;
use quasar_core::traits::{ProjectStore, SkillStore, UserStore};
use quasar_core::user::User;
use quasar_db::Database;

/// Spins up a PostgreSQL container and returns a migrated database.
///
/// The `ContainerAsync` must be kept in scope for the test duration;
/// dropping it stops the container.
pub async fn setup_test_db() -> (Database, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "quasar_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let connection_string = format!("postgresql://postgres:postgres@{host}:{port}/quasar_test");

    // Retry connection until container is fully ready
    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!("Failed to connect to database after {MAX_RETRIES} retries: {e}");
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    };

    let db = Database::from_pool(pool);
    db.migrate().await.expect("Failed to run migrations");
    (db, container)
}

pub async fn create_user(db: &Database, email: &str) -> User {
    db.users()
        .create_user(&sample_new_user(email))
        .await
        .expect("Failed to create user")
}

pub async fn create_skill(db: &Database, name: &str) -> Skill {
    db.skills()
        .insert_skill(&Skill::build(name, None, None))
        .await
        .expect("Failed to create skill")
}

/// A RECRUITING project of `max_team_size` seats led by `lead`.
pub fn project_for(lead: &User, title: &str, max_team_size: i32, skills: &[Skill]) -> Project {
    let now = Utc::now();
    Project {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("{title} helps students collaborate on campus"),
        category: None,
        status: ProjectStatus::Recruiting,
        lead_id: lead.id,
        lead_name: lead.full_name(),
        max_team_size,
        current_team_size: 1,
        skills: skills
            .iter()
            .map(|s| ProjectSkill {
                skill_id: s.id,
                name: s.name.clone(),
                category: s.category.clone(),
                required: true,
            })
            .collect(),
        tech_stack: vec!["axum".into(), "postgres".into()],
        problem_statement: None,
        goals: None,
        objectives: None,
        expected_start_date: None,
        expected_end_date: None,
        github_repo: None,
        demo_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub async fn create_project(db: &Database, lead: &User, title: &str) -> Project {
    db.projects()
        .insert_project(&project_for(lead, title, 4, &[]))
        .await
        .expect("Failed to create project")
}
