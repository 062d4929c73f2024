mod common;
mod project_tests;
mod team_tests;
mod user_skill_tests;
mod workspace_tests;
