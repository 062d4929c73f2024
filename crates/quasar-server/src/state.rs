use std::time::Duration;

use moka::future::Cache;

use quasar_client::GitHubClient;
use quasar_core::maintenance::MaintenanceService;
use quasar_core::oauth::OAuthService;
use quasar_core::services::{
    AccountService, ChatService, NotificationService, ProjectService, SkillService, TaskService,
    TeamService, UserService,
};
use quasar_db::{
    ChatRepository, Database, NotificationRepository, ProjectRepository, SkillRepository,
    TaskRepository, TeamRepository, UserRepository,
};

use crate::auth::{Argon2Hasher, TokenService};
use crate::config::ServerConfig;
use crate::dto::{LandingCountsResponse, PageResponse, SkillResponse};
use crate::ws::EventHub;

pub type Accounts = AccountService<UserRepository, Argon2Hasher>;
pub type Users = UserService<UserRepository, SkillRepository, ProjectRepository>;
pub type Skills = SkillService<SkillRepository>;
pub type Notifications = NotificationService<NotificationRepository, EventHub>;
pub type Projects = ProjectService<
    ProjectRepository,
    SkillRepository,
    UserRepository,
    NotificationRepository,
    EventHub,
>;
pub type Team =
    TeamService<ProjectRepository, UserRepository, TeamRepository, NotificationRepository, EventHub>;
pub type Tasks = TaskService<ProjectRepository, TaskRepository, NotificationRepository, EventHub>;
pub type Chat = ChatService<ProjectRepository, ChatRepository, EventHub>;
pub type OAuth = OAuthService<UserRepository, GitHubClient>;
pub type Maintenance = MaintenanceService<TeamRepository, NotificationRepository>;

/// Public landing data is recomputed at most this often.
pub const LANDING_CACHE_TTL: Duration = Duration::from_secs(60);

/// Short-lived copies of public landing data.
#[derive(Clone)]
pub struct LandingCache {
    pub counts: Cache<(), LandingCountsResponse>,
    /// Keyed by `(page, size)`.
    pub popular_skills: Cache<(u32, u32), PageResponse<SkillResponse>>,
}

impl LandingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            counts: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            popular_skills: Cache::builder().max_capacity(64).time_to_live(ttl).build(),
        }
    }
}

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub tokens: TokenService,
    pub accounts: Accounts,
    pub users: Users,
    pub skills: Skills,
    pub projects: Projects,
    pub team: Team,
    pub tasks: Tasks,
    pub notifications: Notifications,
    pub chat: Chat,
    /// `None` when GitHub login is not configured.
    pub github: Option<GitHubClient>,
    pub oauth: Option<OAuth>,
    pub hub: EventHub,
    pub cache: LandingCache,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig, github: Option<GitHubClient>) -> Self {
        let hub = EventHub::new();
        let notifier = || NotificationService::new(db.notifications(), hub.clone());

        Self {
            tokens: TokenService::new(&config.jwt_secret, config.jwt_expiration_secs),
            accounts: AccountService::new(db.users(), Argon2Hasher::default()),
            users: UserService::new(db.users(), db.skills(), db.projects()),
            skills: SkillService::new(db.skills()),
            projects: ProjectService::new(
                db.projects(),
                db.users(),
                SkillService::new(db.skills()),
                notifier(),
            ),
            team: TeamService::new(db.projects(), db.users(), db.team(), notifier())
                .with_invitation_ttl(config.invitation_ttl),
            tasks: TaskService::new(db.projects(), db.tasks(), notifier()),
            notifications: notifier(),
            chat: ChatService::new(db.projects(), db.chat(), hub.clone()),
            oauth: github
                .clone()
                .map(|client| OAuthService::new(db.users(), client)),
            github,
            cache: LandingCache::new(LANDING_CACHE_TTL),
            hub,
            config,
            db,
        }
    }

    /// The background sweeper over this state's database.
    pub fn maintenance(&self) -> Maintenance {
        MaintenanceService::new(
            self.db.team(),
            self.db.notifications(),
            self.config.maintenance,
        )
    }
}
