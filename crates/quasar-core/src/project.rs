use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::constants::{
    CATEGORY_NAME_MAX_LENGTH, MAX_TEAM_SIZE, MIN_TEAM_SIZE, PROJECT_DESCRIPTION_MAX_LENGTH,
    PROJECT_DESCRIPTION_MIN_LENGTH, PROJECT_LINK_MAX_LENGTH, PROJECT_TEXT_MAX_LENGTH,
    PROJECT_TITLE_MAX_LENGTH, PROJECT_TITLE_MIN_LENGTH, SKILL_NAME_MAX_LENGTH,
    SKILL_NAME_MIN_LENGTH,
};
use crate::error::AppError;
use crate::validation::{FieldErrors, normalize_optional};

string_enum! {
    /// Project lifecycle: RECRUITING → IN_PROGRESS → COMPLETED/CANCELLED.
    pub enum ProjectStatus {
        Recruiting => "RECRUITING",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

impl ProjectStatus {
    pub fn can_accept_members(&self) -> bool {
        matches!(self, ProjectStatus::Recruiting)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Recruiting | ProjectStatus::InProgress)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }
}

string_enum! {
    /// Role of a member inside one project.
    pub enum ProjectRole {
        Lead => "LEAD",
        Member => "MEMBER",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A skill attached to a project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSkill {
    pub skill_id: i64,
    pub name: String,
    pub category: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<ProjectCategory>,
    pub status: ProjectStatus,
    pub lead_id: Uuid,
    pub lead_name: String,
    pub max_team_size: i32,
    /// Members including the lead.
    pub current_team_size: i32,
    pub skills: Vec<ProjectSkill>,
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

impl Project {
    pub fn is_lead(&self, user_id: Uuid) -> bool {
        self.lead_id == user_id
    }

    pub fn is_full(&self) -> bool {
        self.current_team_size >= self.max_team_size
    }

    pub fn available_spots(&self) -> i32 {
        (self.max_team_size - self.current_team_size).max(0)
    }

    pub fn can_accept_new_members(&self) -> bool {
        self.status.can_accept_members() && !self.is_full()
    }

    /// Projects that are under way or done are kept for the record.
    pub fn can_delete(&self) -> bool {
        !matches!(
            self.status,
            ProjectStatus::InProgress | ProjectStatus::Completed
        )
    }
}

/// A user's seat on a project team.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}

impl ProjectMember {
    pub fn is_lead(&self) -> bool {
        self.role == ProjectRole::Lead
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A skill reference in a project request: by id, or by name (created when
/// missing).
#[derive(Debug, Clone, Default)]
pub struct SkillRequirement {
    pub skill_id: Option<i64>,
    pub skill_name: Option<String>,
    /// Defaults to true.
    pub required: Option<bool>,
}

impl SkillRequirement {
    fn check(&self, index: usize, errors: &mut FieldErrors) {
        let field = format!("skills[{index}]");
        match (&self.skill_id, self.skill_name.as_deref().map(str::trim)) {
            (Some(_), _) => {}
            (None, Some(name)) if !name.is_empty() => {
                if !crate::validation::is_valid_length(
                    name,
                    SKILL_NAME_MIN_LENGTH,
                    SKILL_NAME_MAX_LENGTH,
                ) {
                    errors.add(
                        &format!("{field}.skillName"),
                        "Skill name must be between 2 and 100 characters",
                    );
                }
            }
            _ => errors.add(&field, "Either skillId or skillName is required"),
        }
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub max_team_size: Option<i32>,
    pub expected_start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub goals: Option<String>,
    pub problem_statement: Option<String>,
    pub objectives: Option<String>,
    pub skills: Vec<SkillRequirement>,
    pub tech_stack: Vec<String>,
    pub github_repo: Option<String>,
    pub demo_url: Option<String>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.require_length(
            "title",
            &self.title,
            PROJECT_TITLE_MIN_LENGTH,
            PROJECT_TITLE_MAX_LENGTH,
            "Project title",
        );
        errors.require_length(
            "description",
            &self.description,
            PROJECT_DESCRIPTION_MIN_LENGTH,
            PROJECT_DESCRIPTION_MAX_LENGTH,
            "Project description",
        );
        match self.max_team_size {
            None => errors.add("maxTeamSize", "Max team size is required"),
            Some(size) => {
                errors.range_i32("maxTeamSize", size, MIN_TEAM_SIZE, MAX_TEAM_SIZE, "Team size")
            }
        }
        check_details(
            &mut errors,
            Details {
                category_name: self.category_name.as_deref(),
                goals: self.goals.as_deref(),
                problem_statement: self.problem_statement.as_deref(),
                objectives: self.objectives.as_deref(),
                github_repo: self.github_repo.as_deref(),
                demo_url: self.demo_url.as_deref(),
                tech_stack: Some(&self.tech_stack),
                start: self.expected_start_date,
                end: self.expected_end_date,
            },
        );
        for (i, skill) in self.skills.iter().enumerate() {
            skill.check(i, &mut errors);
        }
        errors.into_result()
    }
}

/// Partial project edit. `None` leaves a field unchanged; blank text clears
/// optional text; `category_id == Some(0)` or a blank `category_name` removes
/// the category; `skills` replaces the whole skill list.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub max_team_size: Option<i32>,
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
    pub skills: Option<Vec<SkillRequirement>>,
}

impl ProjectUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.optional_length(
            "title",
            self.title.as_deref(),
            PROJECT_TITLE_MIN_LENGTH,
            PROJECT_TITLE_MAX_LENGTH,
            "Project title",
        );
        errors.optional_length(
            "description",
            self.description.as_deref(),
            PROJECT_DESCRIPTION_MIN_LENGTH,
            PROJECT_DESCRIPTION_MAX_LENGTH,
            "Project description",
        );
        if let Some(size) = self.max_team_size {
            errors.range_i32("maxTeamSize", size, MIN_TEAM_SIZE, MAX_TEAM_SIZE, "Team size");
        }
        check_details(
            &mut errors,
            Details {
                category_name: self.category_name.as_deref(),
                goals: self.goals.as_deref(),
                problem_statement: self.problem_statement.as_deref(),
                objectives: self.objectives.as_deref(),
                github_repo: self.github_repo.as_deref(),
                demo_url: self.demo_url.as_deref(),
                tech_stack: self.tech_stack.as_deref(),
                start: self.expected_start_date,
                end: self.expected_end_date,
            },
        );
        if let Some(skills) = &self.skills {
            for (i, skill) in skills.iter().enumerate() {
                skill.check(i, &mut errors);
            }
        }
        errors.into_result()
    }

    /// Copy scalar fields onto `project`. Category and skills are resolved by
    /// the service since they need the store.
    pub fn apply_scalars(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            project.description = description.trim().to_string();
        }
        if let Some(size) = self.max_team_size {
            project.max_team_size = size;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(date) = self.expected_start_date {
            project.expected_start_date = Some(date);
        }
        if let Some(date) = self.expected_end_date {
            project.expected_end_date = Some(date);
        }
        if let Some(goals) = &self.goals {
            project.goals = normalize_optional(Some(goals.clone()));
        }
        if let Some(text) = &self.problem_statement {
            project.problem_statement = normalize_optional(Some(text.clone()));
        }
        if let Some(text) = &self.objectives {
            project.objectives = normalize_optional(Some(text.clone()));
        }
        if let Some(stack) = &self.tech_stack {
            project.tech_stack = clean_tech_stack(stack);
        }
        if let Some(repo) = &self.github_repo {
            project.github_repo = normalize_optional(Some(repo.clone()));
        }
        if let Some(url) = &self.demo_url {
            project.demo_url = normalize_optional(Some(url.clone()));
        }
    }
}

struct Details<'a> {
    category_name: Option<&'a str>,
    goals: Option<&'a str>,
    problem_statement: Option<&'a str>,
    objectives: Option<&'a str>,
    github_repo: Option<&'a str>,
    demo_url: Option<&'a str>,
    tech_stack: Option<&'a [String]>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

fn check_details(errors: &mut FieldErrors, d: Details<'_>) {
    errors.optional_length(
        "categoryName",
        d.category_name,
        0,
        CATEGORY_NAME_MAX_LENGTH,
        "Category name",
    );
    errors.optional_length("goals", d.goals, 0, PROJECT_TEXT_MAX_LENGTH, "Goals");
    errors.optional_length(
        "problemStatement",
        d.problem_statement,
        0,
        PROJECT_TEXT_MAX_LENGTH,
        "Problem statement",
    );
    errors.optional_length("objectives", d.objectives, 0, PROJECT_TEXT_MAX_LENGTH, "Objectives");
    errors.optional_length("githubRepo", d.github_repo, 0, PROJECT_LINK_MAX_LENGTH, "GitHub repo");
    errors.optional_url("githubRepo", d.github_repo, "GitHub repo");
    errors.optional_length("demoUrl", d.demo_url, 0, PROJECT_LINK_MAX_LENGTH, "Demo URL");
    errors.optional_url("demoUrl", d.demo_url, "Demo URL");
    if let Some(stack) = d.tech_stack
        && stack.iter().any(|t| t.trim().is_empty())
    {
        errors.add("techStack", "Tech stack entries must not be blank");
    }
    if let (Some(start), Some(end)) = (d.start, d.end)
        && end < start
    {
        errors.add(
            "expectedEndDate",
            "Expected end date must not be before the start date",
        );
    }
}

/// Trimmed, de-duplicated (case-insensitively) tech stack, order preserved.
pub fn clean_tech_stack(stack: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    stack
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

/// Filters shared by search, discover, my-projects and led-by-me listings.
#[derive(Debug, Clone, Default)]
pub struct ProjectSearch {
    /// Title or description contains, case-insensitively.
    pub query: Option<String>,
    /// Category name, case-insensitively.
    pub category: Option<String>,
    pub status: Option<ProjectStatus>,
    /// RECRUITING with free seats.
    pub available_only: bool,
    /// Hide projects this user leads or belongs to.
    pub exclude_user: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    /// Projects this user leads or belongs to.
    pub involving_user: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(size: i32, max: i32, status: ProjectStatus) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            title: "Campus Connect".into(),
            description: "Connect students across campus".into(),
            category: None,
            status,
            lead_id: Uuid::new_v4(),
            lead_name: "Ada Lovelace".into(),
            max_team_size: max,
            current_team_size: size,
            skills: vec![],
            tech_stack: vec![],
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

    #[test]
    fn test_status_predicates() {
        assert!(ProjectStatus::Recruiting.can_accept_members());
        assert!(!ProjectStatus::InProgress.can_accept_members());
        assert!(ProjectStatus::InProgress.is_active());
        assert!(!ProjectStatus::Completed.is_active());
        assert!(ProjectStatus::Cancelled.is_finished());
        assert!(!ProjectStatus::Recruiting.is_finished());
    }

    #[test]
    fn test_capacity_rules() {
        let open = project(2, 4, ProjectStatus::Recruiting);
        assert!(!open.is_full());
        assert_eq!(open.available_spots(), 2);
        assert!(open.can_accept_new_members());

        let full = project(4, 4, ProjectStatus::Recruiting);
        assert!(full.is_full());
        assert!(!full.can_accept_new_members());

        let running = project(1, 4, ProjectStatus::InProgress);
        assert!(!running.can_accept_new_members());
    }

    #[test]
    fn test_can_delete() {
        assert!(project(1, 4, ProjectStatus::Recruiting).can_delete());
        assert!(project(1, 4, ProjectStatus::Cancelled).can_delete());
        assert!(!project(1, 4, ProjectStatus::InProgress).can_delete());
        assert!(!project(1, 4, ProjectStatus::Completed).can_delete());
    }

    #[test]
    fn test_new_project_validation() {
        let input = NewProject {
            title: "Tiny".into(),
            description: "short".into(),
            max_team_size: Some(25),
            skills: vec![SkillRequirement::default()],
            tech_stack: vec!["Rust".into(), " ".into()],
            expected_start_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            expected_end_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            ..Default::default()
        };
        match input.validate() {
            Err(AppError::Validation(errors)) => {
                assert!(errors.get("title").is_some());
                assert!(errors.get("description").is_some());
                assert_eq!(errors.get("maxTeamSize"), Some("Team size must not exceed 20"));
                assert!(errors.get("skills[0]").is_some());
                assert!(errors.get("techStack").is_some());
                assert!(errors.get("expectedEndDate").is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_update_applies_scalars_and_clears_text() {
        let mut p = project(1, 4, ProjectStatus::Recruiting);
        p.goals = Some("old goals".into());
        let update = ProjectUpdate {
            title: Some("  Campus Connect v2 ".into()),
            status: Some(ProjectStatus::InProgress),
            goals: Some("".into()),
            tech_stack: Some(vec!["Rust".into(), "rust".into(), "Postgres".into()]),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        update.apply_scalars(&mut p);
        assert_eq!(p.title, "Campus Connect v2");
        assert_eq!(p.status, ProjectStatus::InProgress);
        assert_eq!(p.goals, None);
        assert_eq!(p.tech_stack, vec!["Rust".to_string(), "Postgres".to_string()]);
    }
}
