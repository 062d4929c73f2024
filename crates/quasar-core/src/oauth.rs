//! GitHub login provisioning.
//!
//! Resolves a GitHub identity to a local account: lookup by GitHub id, then
//! by email; existing accounts are enriched, unknown ones are created as
//! verified students.

use serde::Deserialize;

use crate::constants::{DEFAULT_BRANCH, DEFAULT_GRADUATION_YEAR, NAME_MIN_LENGTH, messages};
use crate::error::AppError;
use crate::traits::{GitHubApi, UserStore};
use crate::user::{AvailabilityStatus, NewUser, User, UserRole};

pub const GITHUB_PROVIDER: &str = "github";

/// Last name given to accounts created from GitHub, which has no such field.
pub const GITHUB_LAST_NAME_PLACEHOLDER: &str = "---";
const GITHUB_FIRST_NAME_FALLBACK: &str = "GitHubUser";

/// OAuth2 error codes surfaced to the login page.
pub const INVALID_REQUEST: &str = "invalid_request";
pub const SERVER_ERROR: &str = "server_error";

/// `GET /user` response, reduced to what provisioning reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub bio: Option<String>,
}

/// One entry of `GET /user/emails`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Prefer the primary verified address, then any verified one.
pub fn select_email(emails: &[GitHubEmail]) -> Option<String> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.iter().find(|e| e.verified))
        .map(|e| e.email.clone())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub struct OAuthService<U, G>
where
    U: UserStore,
    G: GitHubApi,
{
    users: U,
    github: G,
}

impl<U, G> OAuthService<U, G>
where
    U: UserStore,
    G: GitHubApi,
{
    pub fn new(users: U, github: G) -> Self {
        Self { users, github }
    }

    /// Find or create the local account for the GitHub user behind
    /// `access_token`.
    ///
    /// Failures come back as [`AppError::OAuth`]: caller mistakes carry
    /// `invalid_request` and the original message, anything else is logged
    /// and reported as `server_error`.
    pub async fn provision(&self, provider: &str, access_token: &str) -> Result<User, AppError> {
        match self.provision_inner(provider, access_token).await {
            Ok(user) => Ok(user),
            Err(AppError::BadRequest(message)) => Err(AppError::OAuth {
                code: INVALID_REQUEST,
                message,
            }),
            Err(e) => {
                tracing::error!(error = %e, %provider, "OAuth2 provisioning failed");
                Err(AppError::OAuth {
                    code: SERVER_ERROR,
                    message: "Error processing OAuth2 user".into(),
                })
            }
        }
    }

    async fn provision_inner(&self, provider: &str, access_token: &str) -> Result<User, AppError> {
        if !provider.eq_ignore_ascii_case(GITHUB_PROVIDER) {
            return Err(AppError::BadRequest(format!(
                "Unsupported OAuth2 provider: {provider}"
            )));
        }

        let profile = self.github.fetch_user(access_token).await?;
        let email = match non_blank(profile.email.as_deref()) {
            Some(email) => Some(email.to_lowercase()),
            None => self.fallback_email(access_token).await,
        };
        let Some(email) = email else {
            return Err(AppError::BadRequest(messages::GITHUB_EMAIL_MISSING.into()));
        };

        let github_id = profile.id.to_string();
        let existing = match self.users.find_user_by_github_id(&github_id).await? {
            Some(user) => Some(user),
            None => self.users.find_user_by_email(&email).await?,
        };

        match existing {
            Some(user) => self.refresh(user, &profile, &github_id).await,
            None => self.register(&profile, github_id, email).await,
        }
    }

    async fn fallback_email(&self, access_token: &str) -> Option<String> {
        match self.github.fetch_emails(access_token).await {
            Ok(emails) => select_email(&emails).map(|e| e.to_lowercase()),
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch GitHub emails");
                None
            }
        }
    }

    async fn refresh(
        &self,
        mut user: User,
        profile: &GitHubUser,
        github_id: &str,
    ) -> Result<User, AppError> {
        let mut changed = false;
        if user.github_id.is_none() {
            user.github_id = Some(github_id.to_string());
            user.github_username = Some(profile.login.clone());
            changed = true;
        }
        if user.profile_picture_url.is_none()
            && let Some(avatar) = non_blank(profile.avatar_url.as_deref())
        {
            user.profile_picture_url = Some(avatar.to_string());
            changed = true;
        }
        if user.github_url.is_none()
            && let Some(url) = non_blank(profile.html_url.as_deref())
        {
            user.github_url = Some(url.to_string());
            changed = true;
        }
        if let Some(name) = non_blank(profile.name.as_deref())
            && name.chars().count() > user.first_name.chars().count()
        {
            user.first_name = name.to_string();
            changed = true;
        }

        if !changed {
            return Ok(user);
        }
        tracing::info!(user_id = %user.id, "Updated account from GitHub profile");
        self.users.update_user(&user).await
    }

    async fn register(
        &self,
        profile: &GitHubUser,
        github_id: String,
        email: String,
    ) -> Result<User, AppError> {
        let first_name = non_blank(profile.name.as_deref())
            .or_else(|| non_blank(Some(&profile.login)))
            .filter(|n| n.chars().count() >= NAME_MIN_LENGTH)
            .unwrap_or(GITHUB_FIRST_NAME_FALLBACK)
            .to_string();

        let new_user = NewUser {
            email,
            password_hash: None,
            first_name,
            last_name: GITHUB_LAST_NAME_PLACEHOLDER.into(),
            role: UserRole::Student,
            branch: Some(DEFAULT_BRANCH.into()),
            graduation_year: Some(DEFAULT_GRADUATION_YEAR),
            bio: non_blank(profile.bio.as_deref()).map(str::to_string),
            availability_status: AvailabilityStatus::Available,
            profile_picture_url: non_blank(profile.avatar_url.as_deref()).map(str::to_string),
            github_url: non_blank(profile.html_url.as_deref()).map(str::to_string),
            github_id: Some(github_id),
            github_username: Some(profile.login.clone()),
            is_verified: true,
        };
        let user = self.users.create_user(&new_user).await?;
        tracing::info!(user_id = %user.id, login = %profile.login, "Created account from GitHub");
        Ok(user)
    }
}
