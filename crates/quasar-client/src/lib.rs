pub mod config;
pub mod github;

pub use config::GitHubConfig;
pub use github::GitHubClient;
