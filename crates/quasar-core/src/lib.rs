#[macro_use]
mod macros;

pub mod chat;
pub mod constants;
pub mod error;
pub mod events;
pub mod maintenance;
pub mod notification;
pub mod oauth;
pub mod page;
pub mod project;
pub mod services;
pub mod skill;
pub mod task;
pub mod team;
pub mod traits;
pub mod user;
pub mod util;
pub mod validation;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use error::AppError;
pub use events::{ChatEvent, DomainEvent};
pub use page::{Page, PageRequest};
pub use traits::{
    ChatStore, EventSink, GitHubApi, NotificationStore, PasswordHasher, ProjectStore, SkillStore,
    TaskStore, TeamStore, UserStore,
};
pub use validation::FieldErrors;
