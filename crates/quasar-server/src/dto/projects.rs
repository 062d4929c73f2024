use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quasar_core::project::{
    NewProject, Project, ProjectCategory, ProjectMember, ProjectRole, ProjectSearch, ProjectSkill,
    ProjectStatus, ProjectUpdate, SkillRequirement,
};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectCategory> for CategoryResponse {
    fn from(c: ProjectCategory) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategorySearchParams {
    /// Name contains, case-insensitively.
    #[serde(default)]
    pub q: String,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequirementRequest {
    pub skill_id: Option<i64>,
    pub skill_name: Option<String>,
    /// Defaults to true.
    pub required: Option<bool>,
}

impl From<SkillRequirementRequest> for SkillRequirement {
    fn from(r: SkillRequirementRequest) -> Self {
        SkillRequirement {
            skill_id: r.skill_id,
            skill_name: r.skill_name,
            required: r.required,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<i64>,
    /// Used when `categoryId` is absent; created if unknown.
    pub category_name: Option<String>,
    pub max_team_size: Option<i32>,
    pub expected_start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub goals: Option<String>,
    pub problem_statement: Option<String>,
    pub objectives: Option<String>,
    #[serde(default)]
    pub skills: Vec<SkillRequirementRequest>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub github_repo: Option<String>,
    pub demo_url: Option<String>,
}

impl From<CreateProjectRequest> for NewProject {
    fn from(r: CreateProjectRequest) -> Self {
        NewProject {
            title: r.title,
            description: r.description,
            category_id: r.category_id,
            category_name: r.category_name,
            max_team_size: r.max_team_size,
            expected_start_date: r.expected_start_date,
            expected_end_date: r.expected_end_date,
            goals: r.goals,
            problem_statement: r.problem_statement,
            objectives: r.objectives,
            skills: r.skills.into_iter().map(Into::into).collect(),
            tech_stack: r.tech_stack,
            github_repo: r.github_repo,
            demo_url: r.demo_url,
        }
    }
}

/// Partial edit. Omitted fields stay as they are; `skills` replaces
/// the whole list; `categoryId: 0` removes the category.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub max_team_size: Option<i32>,
    #[schema(value_type = Option<String>, example = "IN_PROGRESS")]
    pub status: Option<ProjectStatus>,
    pub expected_start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub goals: Option<String>,
    pub problem_statement: Option<String>,
    pub objectives: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub github_repo: Option<String>,
    pub demo_url: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub skills: Option<Vec<SkillRequirementRequest>>,
}

impl From<UpdateProjectRequest> for ProjectUpdate {
    fn from(r: UpdateProjectRequest) -> Self {
        ProjectUpdate {
            title: r.title,
            description: r.description,
            max_team_size: r.max_team_size,
            status: r.status,
            expected_start_date: r.expected_start_date,
            expected_end_date: r.expected_end_date,
            goals: r.goals,
            problem_statement: r.problem_statement,
            objectives: r.objectives,
            tech_stack: r.tech_stack,
            github_repo: r.github_repo,
            demo_url: r.demo_url,
            category_id: r.category_id,
            category_name: r.category_name,
            skills: r
                .skills
                .map(|skills| skills.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSkillResponse {
    pub skill_id: i64,
    pub name: String,
    pub category: String,
    pub required: bool,
}

impl From<ProjectSkill> for ProjectSkillResponse {
    fn from(s: ProjectSkill) -> Self {
        Self {
            skill_id: s.skill_id,
            name: s.name,
            category: s.category,
            required: s.required,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<CategoryResponse>,
    #[schema(value_type = String, example = "RECRUITING")]
    pub status: ProjectStatus,
    pub lead_id: Uuid,
    pub lead_name: String,
    pub max_team_size: i32,
    pub current_team_size: i32,
    pub available_spots: i32,
    pub is_full: bool,
    pub required_skills: Vec<ProjectSkillResponse>,
    pub tech_stack: Vec<String>,
    pub problem_statement: Option<String>,
    pub goals: Option<String>,
    pub objectives: Option<String>,
    pub expected_start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub github_repo: Option<String>,
    pub demo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            available_spots: p.available_spots(),
            is_full: p.is_full(),
            id: p.id,
            title: p.title,
            description: p.description,
            category: p.category.map(Into::into),
            status: p.status,
            lead_id: p.lead_id,
            lead_name: p.lead_name,
            max_team_size: p.max_team_size,
            current_team_size: p.current_team_size,
            required_skills: p.skills.into_iter().map(Into::into).collect(),
            tech_stack: p.tech_stack,
            problem_statement: p.problem_statement,
            goals: p.goals,
            objectives: p.objectives,
            expected_start_date: p.expected_start_date,
            expected_end_date: p.expected_end_date,
            github_repo: p.github_repo,
            demo_url: p.demo_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProjectSearchParams {
    /// Title or description contains.
    pub query: Option<String>,
    /// Category name.
    pub category: Option<String>,
    #[param(value_type = Option<String>)]
    pub status: Option<ProjectStatus>,
    /// Only RECRUITING projects with free seats.
    #[serde(default)]
    pub available_only: bool,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl ProjectSearchParams {
    pub fn search(&self) -> ProjectSearch {
        ProjectSearch {
            query: self.query.clone(),
            category: self.category.clone(),
            status: self.status,
            available_only: self.available_only,
            ..ProjectSearch::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    /// Membership id, used by the member management routes.
    pub id: i64,
    pub project_id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = String, example = "MEMBER")]
    pub role: ProjectRole,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

impl From<ProjectMember> for MemberResponse {
    fn from(m: ProjectMember) -> Self {
        Self {
            full_name: m.full_name(),
            id: m.id,
            project_id: m.project_id,
            user_id: m.user_id,
            role: m.role,
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email,
            joined_at: m.joined_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRoleRequest {
    #[schema(value_type = String, example = "MEMBER")]
    pub role: ProjectRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_maps_required_skills() {
        let request: CreateProjectRequest = serde_json::from_str(
            r#"{
                "title": "Campus Connect",
                "description": "A portal for student collaboration",
                "maxTeamSize": 4,
                "skills": [{"skillName": "Rust"}, {"skillId": 42, "required": false}],
                "techStack": ["Rust", "Postgres"]
            }"#,
        )
        .unwrap();
        let project = NewProject::from(request);

        assert_eq!(project.skills.len(), 2);
        assert_eq!(project.skills[0].skill_name.as_deref(), Some("Rust"));
        assert_eq!(project.skills[1].skill_id, Some(42));
        assert_eq!(project.skills[1].required, Some(false));
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_update_request_keeps_absent_skills_untouched() {
        let request: UpdateProjectRequest =
            serde_json::from_str(r#"{"status":"IN_PROGRESS"}"#).unwrap();
        let update = ProjectUpdate::from(request);
        assert_eq!(update.status, Some(ProjectStatus::InProgress));
        assert!(update.skills.is_none());
        assert!(update.tech_stack.is_none());
    }

    #[test]
    fn test_search_params_default_to_everything() {
        let search = ProjectSearchParams::default().search();
        assert!(!search.available_only);
        assert!(search.exclude_user.is_none());
        assert!(search.involving_user.is_none());
    }
}
