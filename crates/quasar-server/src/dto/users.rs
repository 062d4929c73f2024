use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quasar_core::services::DashboardCounts;
use quasar_core::skill::{
    NewSkill, Skill, SkillLevel, SkillUpdate, UserSkill, UserSkillInput, UserSkillUpdate,
};
use quasar_core::user::{
    AvailabilityStatus, LoginCredentials, ProfileUpdate, Registration, User, UserRole, UserSearch,
};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub branch: String,
    pub graduation_year: Option<i32>,
    pub bio: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(r: RegisterRequest) -> Self {
        Registration {
            email: r.email,
            password: r.password,
            first_name: r.first_name,
            last_name: r.last_name,
            branch: r.branch,
            graduation_year: r.graduation_year,
            bio: r.bio,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl From<LoginRequest> for LoginCredentials {
    fn from(r: LoginRequest) -> Self {
        LoginCredentials {
            email: r.email,
            password: r.password,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitHubLoginResponse {
    /// Path that starts the GitHub login.
    pub authorization_url: String,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[schema(value_type = String, example = "STUDENT")]
    pub role: UserRole,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    pub bio: Option<String>,
    #[schema(value_type = String, example = "AVAILABLE")]
    pub availability_status: AvailabilityStatus,
    pub profile_picture_url: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub github_username: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            full_name: u.full_name(),
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            branch: u.branch,
            graduation_year: u.graduation_year,
            bio: u.bio,
            availability_status: u.availability_status,
            profile_picture_url: u.profile_picture_url,
            github_url: u.github_url,
            linkedin_url: u.linkedin_url,
            portfolio_url: u.portfolio_url,
            github_username: u.github_username,
            is_verified: u.is_verified,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// A user together with their profile skills.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub skills: Vec<UserSkillResponse>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub availability_status: Option<AvailabilityStatus>,
    pub profile_picture_url: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(r: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            first_name: r.first_name,
            last_name: r.last_name,
            bio: r.bio,
            branch: r.branch,
            graduation_year: r.graduation_year,
            availability_status: r.availability_status,
            profile_picture_url: r.profile_picture_url,
            github_url: r.github_url,
            linkedin_url: r.linkedin_url,
            portfolio_url: r.portfolio_url,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityParams {
    #[param(value_type = String, example = "BUSY")]
    pub status: AvailabilityStatus,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserSearchParams {
    /// Matches first name, last name or email.
    pub query: Option<String>,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    #[param(value_type = Option<String>)]
    pub availability: Option<AvailabilityStatus>,
    /// Case-insensitive skill name.
    pub skill: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl UserSearchParams {
    pub fn search(&self, exclude: Uuid) -> UserSearch {
        UserSearch {
            query: self.query.clone(),
            branch: self.branch.clone(),
            graduation_year: self.graduation_year,
            availability: self.availability,
            skill: self.skill.clone(),
            exclude_user: Some(exclude),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub projects_count: i64,
    pub skills_count: i64,
}

impl From<DashboardCounts> for DashboardResponse {
    fn from(c: DashboardCounts) -> Self {
        Self {
            projects_count: c.projects_count,
            skills_count: c.skills_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponse {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub is_predefined: bool,
    pub users_count: i32,
    pub projects_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Skill> for SkillResponse {
    fn from(s: Skill) -> Self {
        Self {
            id: s.id,
            name: s.name,
            category: s.category,
            description: s.description,
            is_predefined: s.is_predefined,
            users_count: s.users_count,
            projects_count: s.projects_count,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateSkillRequest {
    #[serde(default)]
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl From<CreateSkillRequest> for NewSkill {
    fn from(r: CreateSkillRequest) -> Self {
        NewSkill {
            name: r.name,
            category: r.category,
            description: r.description,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateSkillRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl From<UpdateSkillRequest> for SkillUpdate {
    fn from(r: UpdateSkillRequest) -> Self {
        SkillUpdate {
            name: r.name,
            category: r.category,
            description: r.description,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SkillSearchParams {
    #[serde(default)]
    pub query: String,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PredefinedSkillResponse {
    pub name: &'static str,
    pub category: &'static str,
}

// ---------------------------------------------------------------------------
// User skills
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSkillRequest {
    pub skill_id: Option<i64>,
    #[serde(default)]
    pub skill_name: String,
    pub category: Option<String>,
    #[schema(value_type = Option<String>, example = "INTERMEDIATE")]
    pub level: Option<SkillLevel>,
    /// Free-text description of the user's experience.
    pub experience: Option<String>,
}

impl From<UserSkillRequest> for UserSkillInput {
    fn from(r: UserSkillRequest) -> Self {
        UserSkillInput {
            skill_id: r.skill_id,
            skill_name: r.skill_name,
            category: r.category,
            level: r.level,
            experience: r.experience,
        }
    }
}

/// Several skills at once; invalid entries and ones already held are skipped.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct BatchUserSkillRequest {
    #[serde(default)]
    pub skills: Vec<UserSkillRequest>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserSkillRequest {
    #[schema(value_type = Option<String>, example = "ADVANCED")]
    pub level: Option<SkillLevel>,
    pub experience: Option<String>,
}

impl From<UpdateUserSkillRequest> for UserSkillUpdate {
    fn from(r: UpdateUserSkillRequest) -> Self {
        UserSkillUpdate {
            level: r.level,
            experience: r.experience,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSkillResponse {
    pub id: i64,
    pub user_id: Uuid,
    pub skill_id: i64,
    pub skill_name: String,
    pub skill_category: String,
    #[schema(value_type = String, example = "INTERMEDIATE")]
    pub level: SkillLevel,
    pub experience: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserSkill> for UserSkillResponse {
    fn from(s: UserSkill) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            skill_id: s.skill_id,
            skill_name: s.skill_name,
            skill_category: s.skill_category,
            level: s.level,
            experience: s.experience,
            created_at: s.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_missing_fields_default_to_empty() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@b.dev","firstName":"Ada"}"#).unwrap();
        let registration = Registration::from(request);
        assert_eq!(registration.first_name, "Ada");
        assert!(registration.password.is_empty());
        assert!(registration.validate().is_err());
    }

    #[test]
    fn test_user_skill_request_parses_level() {
        let request: UserSkillRequest =
            serde_json::from_str(r#"{"skillName":"Rust","level":"VIBE_CODING"}"#).unwrap();
        assert_eq!(request.level, Some(SkillLevel::VibeCoding));
        assert!(request.skill_id.is_none());
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        let result: Result<UserSkillRequest, _> =
            serde_json::from_str(r#"{"skillName":"Rust","level":"GURU"}"#);
        assert!(result.is_err());
    }
}
