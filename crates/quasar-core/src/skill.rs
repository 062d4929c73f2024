use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_SKILL_CATEGORY, SKILL_NAME_MAX_LENGTH, SKILL_NAME_MIN_LENGTH, predefined_skill_category,
};
use crate::error::AppError;
use crate::util::{normalize_name, stable_id};
use crate::validation::{FieldErrors, normalize_optional};

pub const SKILL_CATEGORY_MAX_LENGTH: usize = 50;
pub const EXPERIENCE_MAX_LENGTH: usize = 500;

string_enum! {
    /// Self-assessed proficiency.
    pub enum SkillLevel {
        VibeCoding => "VIBE_CODING",
        Beginner => "BEGINNER",
        Intermediate => "INTERMEDIATE",
        Advanced => "ADVANCED",
    }
}

/// A named competency shared by users and projects.
#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    /// Derived from `normalized_name`, see [`Skill::id_for`].
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    pub category: String,
    pub description: Option<String>,
    pub is_predefined: bool,
    pub users_count: i32,
    pub projects_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Skill {
    /// Id a skill with this display name has (or would have).
    pub fn id_for(name: &str) -> i64 {
        stable_id(&normalize_name(name))
    }

    /// Build a not-yet-persisted skill. Predefined names get their canonical
    /// category unless one is supplied.
    pub fn build(name: &str, category: Option<&str>, description: Option<String>) -> Self {
        let name = name.trim().to_string();
        let normalized_name = normalize_name(&name);
        let predefined = predefined_skill_category(&name);
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .or_else(|| predefined.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_SKILL_CATEGORY.to_string());
        let now = Utc::now();
        Self {
            id: stable_id(&normalized_name),
            name,
            normalized_name,
            category,
            description: normalize_optional(description),
            is_predefined: predefined.is_some(),
            users_count: 0,
            projects_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when the stored category is a placeholder a caller may refine.
    pub fn has_default_category(&self) -> bool {
        let category = self.category.trim();
        category.is_empty() || category.eq_ignore_ascii_case(DEFAULT_SKILL_CATEGORY)
    }
}

/// Input for creating a skill.
#[derive(Debug, Clone)]
pub struct NewSkill {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl NewSkill {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.require_length(
            "name",
            &self.name,
            SKILL_NAME_MIN_LENGTH,
            SKILL_NAME_MAX_LENGTH,
            "Skill name",
        );
        errors.optional_length(
            "category",
            self.category.as_deref(),
            0,
            SKILL_CATEGORY_MAX_LENGTH,
            "Category",
        );
        errors.into_result()
    }
}

/// Partial skill edit.
#[derive(Debug, Clone, Default)]
pub struct SkillUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl SkillUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.optional_length(
            "name",
            self.name.as_deref(),
            SKILL_NAME_MIN_LENGTH,
            SKILL_NAME_MAX_LENGTH,
            "Skill name",
        );
        errors.optional_length(
            "category",
            self.category.as_deref(),
            0,
            SKILL_CATEGORY_MAX_LENGTH,
            "Category",
        );
        errors.into_result()
    }
}

/// A skill on a user's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSkill {
    pub id: i64,
    pub user_id: Uuid,
    pub skill_id: i64,
    pub skill_name: String,
    pub skill_category: String,
    pub level: SkillLevel,
    pub experience: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for adding a skill to the caller's profile. The skill is referenced
/// by id, or by name and created when missing.
#[derive(Debug, Clone, Default)]
pub struct UserSkillInput {
    pub skill_id: Option<i64>,
    pub skill_name: String,
    pub category: Option<String>,
    pub level: Option<SkillLevel>,
    pub experience: Option<String>,
}

impl UserSkillInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        // With an id the name is ignored.
        if self.skill_id.is_none() && self.skill_name.trim().is_empty() {
            errors.add("skillName", "Skill name is required");
        } else if self.skill_id.is_none() {
            errors.require_length(
                "skillName",
                &self.skill_name,
                SKILL_NAME_MIN_LENGTH,
                SKILL_NAME_MAX_LENGTH,
                "Skill name",
            );
        }
        if self.level.is_none() {
            errors.add("level", "Skill level is required");
        }
        errors.optional_length(
            "experience",
            self.experience.as_deref(),
            0,
            EXPERIENCE_MAX_LENGTH,
            "Experience description",
        );
        errors.optional_length(
            "category",
            self.category.as_deref(),
            0,
            SKILL_CATEGORY_MAX_LENGTH,
            "Category",
        );
        errors.into_result()
    }
}

/// Change level and/or experience of a profile skill.
#[derive(Debug, Clone)]
pub struct UserSkillUpdate {
    pub level: Option<SkillLevel>,
    pub experience: Option<String>,
}

impl UserSkillUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        if self.level.is_none() {
            errors.add("level", "Skill level is required");
        }
        errors.optional_length(
            "experience",
            self.experience.as_deref(),
            0,
            EXPERIENCE_MAX_LENGTH,
            "Experience description",
        );
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_id_ignores_case_and_outer_spacing() {
        assert_eq!(Skill::id_for("Spring Boot"), Skill::id_for("  spring BOOT "));
        assert_ne!(Skill::id_for("Spring Boot"), Skill::id_for("Spring  Boot"));
        assert_ne!(Skill::id_for("Java"), Skill::id_for("JavaScript"));
    }

    #[test]
    fn test_build_predefined_skill() {
        let skill = Skill::build("react", None, None);
        assert!(skill.is_predefined);
        assert_eq!(skill.category, "Frontend Framework");
        assert_eq!(skill.normalized_name, "react");
        assert_eq!(skill.id, Skill::id_for("React"));
    }

    #[test]
    fn test_build_custom_skill_defaults_category() {
        let skill = Skill::build(" Rust Async ", Some("  "), Some(" ".into()));
        assert_eq!(skill.name, "Rust Async");
        assert_eq!(skill.category, "General");
        assert!(skill.has_default_category());
        assert!(!skill.is_predefined);
        assert_eq!(skill.description, None);
    }

    #[test]
    fn test_level_ordering() {
        assert!(SkillLevel::VibeCoding < SkillLevel::Beginner);
        assert!(SkillLevel::Intermediate < SkillLevel::Advanced);
        assert_eq!("vibe_coding".parse::<SkillLevel>(), Ok(SkillLevel::VibeCoding));
    }

    #[test]
    fn test_user_skill_input_requires_level() {
        let input = UserSkillInput {
            skill_name: "Rust".into(),
            ..Default::default()
        };
        match input.validate() {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.get("level"), Some("Skill level is required"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_user_skill_input_by_id_needs_no_name() {
        let input = UserSkillInput {
            skill_id: Some(7),
            level: Some(SkillLevel::Beginner),
            ..Default::default()
        };
        assert!(input.validate().is_ok());

        let missing = UserSkillInput {
            level: Some(SkillLevel::Beginner),
            ..Default::default()
        };
        assert!(missing.validate().is_err());
    }

    #[test]
    fn test_new_skill_name_bounds() {
        let skill = NewSkill {
            name: "R".into(),
            category: None,
            description: None,
        };
        assert!(skill.validate().is_err());
    }
}
