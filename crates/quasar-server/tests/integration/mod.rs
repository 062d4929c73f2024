mod common;
mod auth_tests;
mod project_tests;
mod public_tests;
mod user_tests;
