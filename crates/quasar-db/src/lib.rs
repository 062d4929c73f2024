pub mod config;
pub mod database;

mod chat_repository;
mod notification_repository;
mod project_repository;
mod skill_repository;
mod support;
mod task_repository;
mod team_repository;
mod user_repository;

pub use chat_repository::ChatRepository;
pub use config::DatabaseConfig;
pub use database::Database;
pub use notification_repository::NotificationRepository;
pub use project_repository::ProjectRepository;
pub use skill_repository::SkillRepository;
pub use task_repository::TaskRepository;
pub use team_repository::TeamRepository;
pub use user_repository::UserRepository;
