use uuid::Uuid;

use crate::constants::{PREDEFINED_SKILLS, messages};
use crate::error::AppError;
use crate::page::{Page, PageRequest};
use crate::skill::{
    NewSkill, Skill, SkillUpdate, UserSkill, UserSkillInput, UserSkillUpdate,
};
use crate::traits::SkillStore;
use crate::user::User;
use crate::util::normalize_name;
use crate::validation::normalize_optional;

/// The skill catalogue and the skills listed on profiles.
#[derive(Clone)]
pub struct SkillService<S>
where
    S: SkillStore,
{
    skills: S,
}

impl<S> SkillService<S>
where
    S: SkillStore,
{
    pub fn new(skills: S) -> Self {
        Self { skills }
    }

    /// Look up a skill by name, creating it when missing. A stored skill
    /// still in the default category adopts `category` when one is given.
    pub async fn find_or_create(&self, name: &str, category: Option<&str>) -> Result<Skill, AppError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        if let Some(mut skill) = self.skills.find_skill_by_name(name).await? {
            if let Some(category) = category
                && skill.has_default_category()
                && !category.eq_ignore_ascii_case(&skill.category)
            {
                skill.category = category.to_string();
                skill = self.skills.update_skill(&skill).await?;
                tracing::debug!(skill_id = skill.id, category = %skill.category, "Refined skill category");
            }
            return Ok(skill);
        }

        let skill = self
            .skills
            .insert_skill(&Skill::build(name, category, None))
            .await?;
        tracing::info!(skill_id = skill.id, name = %skill.name, "Created skill");
        Ok(skill)
    }

    pub async fn create_skill(&self, input: NewSkill) -> Result<Skill, AppError> {
        input.validate()?;
        if self.skills.find_skill_by_name(&input.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Skill already exists: {}",
                input.name.trim()
            )));
        }
        self.skills
            .insert_skill(&Skill::build(
                &input.name,
                input.category.as_deref(),
                input.description,
            ))
            .await
    }

    pub async fn get_skill(&self, id: i64) -> Result<Skill, AppError> {
        self.skills
            .find_skill(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::SKILL_NOT_FOUND.into()))
    }

    /// Administrators only. A rename keeps the id.
    pub async fn update_skill(
        &self,
        actor: &User,
        id: i64,
        update: SkillUpdate,
    ) -> Result<Skill, AppError> {
        require_admin(actor, "modify skills")?;
        update.validate()?;
        let mut skill = self.get_skill(id).await?;

        if let Some(name) = update.name.as_deref().map(str::trim)
            && normalize_name(name) != skill.normalized_name
        {
            if let Some(other) = self.skills.find_skill_by_name(name).await?
                && other.id != id
            {
                return Err(AppError::Conflict(format!("Skill already exists: {name}")));
            }
            skill.name = name.to_string();
            skill.normalized_name = normalize_name(name);
        }
        if let Some(category) = update.category.as_deref().map(str::trim)
            && !category.is_empty()
        {
            skill.category = category.to_string();
        }
        if let Some(description) = update.description {
            skill.description = normalize_optional(Some(description));
        }
        self.skills.update_skill(&skill).await
    }

    /// Administrators only; predefined skills stay.
    pub async fn delete_skill(&self, actor: &User, id: i64) -> Result<(), AppError> {
        require_admin(actor, "delete skills")?;
        let skill = self.get_skill(id).await?;
        if skill.is_predefined {
            return Err(AppError::BadRequest(
                "Predefined skills cannot be deleted".into(),
            ));
        }
        self.skills.delete_skill(id).await?;
        tracing::info!(skill_id = id, name = %skill.name, "Deleted skill");
        Ok(())
    }

    pub async fn list_skills(&self, page: PageRequest) -> Result<Page<Skill>, AppError> {
        self.skills.list_skills(page).await
    }

    pub async fn search_skills(&self, query: &str, page: PageRequest) -> Result<Page<Skill>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return self.skills.list_skills(page).await;
        }
        self.skills.search_skills(query, page).await
    }

    pub async fn categories(&self) -> Result<Vec<String>, AppError> {
        self.skills.skill_categories().await
    }

    pub async fn skills_by_category(&self, category: &str) -> Result<Vec<Skill>, AppError> {
        self.skills.skills_by_category(category.trim()).await
    }

    pub async fn popular_skills(&self, page: PageRequest) -> Result<Page<Skill>, AppError> {
        self.skills.popular_skills(page).await
    }

    /// The built-in catalogue as `(name, category)` pairs.
    pub fn predefined_skills(&self) -> &'static [(&'static str, &'static str)] {
        PREDEFINED_SKILLS
    }

    /// Insert every predefined skill that is missing. Returns how many were
    /// created.
    pub async fn seed_predefined(&self) -> Result<usize, AppError> {
        let mut created = 0;
        for (name, category) in PREDEFINED_SKILLS {
            if self.skills.find_skill_by_name(name).await?.is_none() {
                self.skills
                    .insert_skill(&Skill::build(name, Some(category), None))
                    .await?;
                created += 1;
            }
        }
        Ok(created)
    }

    pub async fn add_user_skill(
        &self,
        user_id: Uuid,
        input: UserSkillInput,
    ) -> Result<UserSkill, AppError> {
        input.validate()?;
        let skill = match input.skill_id {
            Some(id) => self.get_skill(id).await?,
            None => {
                self.find_or_create(&input.skill_name, input.category.as_deref())
                    .await?
            }
        };
        if self
            .skills
            .find_user_skill_by_skill(user_id, skill.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "You already have the skill {}",
                skill.name
            )));
        }

        let level = input
            .level
            .ok_or_else(|| AppError::invalid_field("level", "Skill level is required"))?;
        let experience = normalize_optional(input.experience);
        let user_skill = self
            .skills
            .add_user_skill(user_id, skill.id, level, experience.as_deref())
            .await?;
        self.skills.adjust_skill_usage(skill.id, 1, 0).await?;
        Ok(user_skill)
    }

    /// Add several skills, skipping invalid entries and ones already held.
    pub async fn add_user_skills(
        &self,
        user_id: Uuid,
        inputs: Vec<UserSkillInput>,
    ) -> Result<Vec<UserSkill>, AppError> {
        let mut added = Vec::with_capacity(inputs.len());
        for input in inputs {
            match self.add_user_skill(user_id, input).await {
                Ok(skill) => added.push(skill),
                Err(e) if e.is_client_error() => {
                    tracing::debug!(%user_id, error = %e, "Skipped skill in batch");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    pub async fn update_user_skill(
        &self,
        user_id: Uuid,
        id: i64,
        update: UserSkillUpdate,
    ) -> Result<UserSkill, AppError> {
        update.validate()?;
        let user_skill = self.owned_user_skill(user_id, id, "update").await?;
        let level = update.level.unwrap_or(user_skill.level);
        let experience = normalize_optional(update.experience);
        self.skills
            .update_user_skill(id, level, experience.as_deref())
            .await
    }

    pub async fn remove_user_skill(&self, user_id: Uuid, id: i64) -> Result<(), AppError> {
        let user_skill = self.owned_user_skill(user_id, id, "remove").await?;
        self.skills.delete_user_skill(id).await?;
        self.skills
            .adjust_skill_usage(user_skill.skill_id, -1, 0)
            .await
    }

    pub async fn user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkill>, AppError> {
        self.skills.user_skills(user_id).await
    }

    async fn owned_user_skill(
        &self,
        user_id: Uuid,
        id: i64,
        action: &str,
    ) -> Result<UserSkill, AppError> {
        let user_skill = self
            .skills
            .find_user_skill(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::USER_SKILL_NOT_FOUND.into()))?;
        if user_skill.user_id != user_id {
            return Err(AppError::BadRequest(format!(
                "You can only {action} your own skills"
            )));
        }
        Ok(user_skill)
    }
}

fn require_admin(actor: &User, action: &str) -> Result<(), AppError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "only administrators can {action}"
        )))
    }
}
