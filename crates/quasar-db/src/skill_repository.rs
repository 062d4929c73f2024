use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use quasar_core::constants::messages;
use quasar_core::error::AppError;
use quasar_core::page::{Page, PageRequest};
use quasar_core::skill::{Skill, SkillLevel, UserSkill};
use quasar_core::traits::SkillStore;

use crate::support::{conflict_or_db_err, db_err, like_pattern};

/// Repository for the skill catalogue and profile skills.
#[derive(Clone)]
pub struct SkillRepository {
    pool: Pool<Postgres>,
}

impl SkillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn skill_page(
        &self,
        filter: Option<&str>,
        order: &str,
        page: PageRequest,
    ) -> Result<Page<Skill>, AppError> {
        let pattern = filter.map(like_pattern);
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM skills WHERE ($1::TEXT IS NULL OR name ILIKE $1)")
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;

        let sql = format!(
            "SELECT * FROM skills WHERE ($1::TEXT IS NULL OR name ILIKE $1) \
             ORDER BY {order} LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, SkillRow>(&sql)
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }
}

const BY_NAME: &str = "normalized_name";
const BY_POPULARITY: &str = "users_count DESC, projects_count DESC, normalized_name";

const USER_SKILL_SELECT: &str = r#"
    SELECT us.id, us.user_id, us.skill_id, s.name AS skill_name, s.category AS skill_category,
           us.level, us.experience, us.created_at
    FROM user_skills us
    JOIN skills s ON s.id = us.skill_id
"#;

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct SkillRow {
    id: i64,
    name: String,
    normalized_name: String,
    category: String,
    description: Option<String>,
    is_predefined: bool,
    users_count: i32,
    projects_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SkillRow> for Skill {
    fn from(row: SkillRow) -> Self {
        Skill {
            id: row.id,
            name: row.name,
            normalized_name: row.normalized_name,
            category: row.category,
            description: row.description,
            is_predefined: row.is_predefined,
            users_count: row.users_count,
            projects_count: row.projects_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserSkillRow {
    id: i64,
    user_id: Uuid,
    skill_id: i64,
    skill_name: String,
    skill_category: String,
    level: String,
    experience: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserSkillRow> for UserSkill {
    fn from(row: UserSkillRow) -> Self {
        UserSkill {
            id: row.id,
            user_id: row.user_id,
            skill_id: row.skill_id,
            skill_name: row.skill_name,
            skill_category: row.skill_category,
            level: row.level.parse().unwrap_or(SkillLevel::Beginner),
            experience: row.experience,
            created_at: row.created_at,
        }
    }
}

impl SkillStore for SkillRepository {
    async fn find_skill(&self, id: i64) -> Result<Option<Skill>, AppError> {
        let row = sqlx::query_as::<_, SkillRow>("SELECT * FROM skills WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_skill_by_name(&self, name: &str) -> Result<Option<Skill>, AppError> {
        let normalized = quasar_core::util::normalize_name(name);
        let row = sqlx::query_as::<_, SkillRow>("SELECT * FROM skills WHERE normalized_name = $1")
            .bind(normalized)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn insert_skill(&self, skill: &Skill) -> Result<Skill, AppError> {
        sqlx::query(
            r#"
            INSERT INTO skills (id, name, normalized_name, category, description, is_predefined)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(skill.id)
        .bind(&skill.name)
        .bind(&skill.normalized_name)
        .bind(&skill.category)
        .bind(&skill.description)
        .bind(skill.is_predefined)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        // A renamed skill may hold this normalized name under another id.
        let row = sqlx::query_as::<_, SkillRow>(
            "SELECT * FROM skills WHERE id = $1 OR normalized_name = $2 ORDER BY (id = $1) DESC LIMIT 1",
        )
        .bind(skill.id)
        .bind(&skill.normalized_name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }

    async fn update_skill(&self, skill: &Skill) -> Result<Skill, AppError> {
        let row = sqlx::query_as::<_, SkillRow>(
            r#"
            UPDATE skills
            SET name = $2, normalized_name = $3, category = $4, description = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(skill.id)
        .bind(&skill.name)
        .bind(&skill.normalized_name)
        .bind(&skill.category)
        .bind(&skill.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_or_db_err(e, &format!("Skill already exists: {}", skill.name)))?;

        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(messages::SKILL_NOT_FOUND.into()))
    }

    async fn delete_skill(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_skills(&self, page: PageRequest) -> Result<Page<Skill>, AppError> {
        self.skill_page(None, BY_NAME, page).await
    }

    async fn search_skills(&self, query: &str, page: PageRequest) -> Result<Page<Skill>, AppError> {
        self.skill_page(Some(query), BY_NAME, page).await
    }

    async fn skill_categories(&self) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT category FROM skills ORDER BY category")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    async fn skills_by_category(&self, category: &str) -> Result<Vec<Skill>, AppError> {
        let rows = sqlx::query_as::<_, SkillRow>(
            "SELECT * FROM skills WHERE LOWER(category) = LOWER($1) ORDER BY normalized_name",
        )
        .bind(category.trim())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn popular_skills(&self, page: PageRequest) -> Result<Page<Skill>, AppError> {
        self.skill_page(None, BY_POPULARITY, page).await
    }

    async fn adjust_skill_usage(
        &self,
        id: i64,
        users_delta: i32,
        projects_delta: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE skills
            SET users_count = GREATEST(users_count + $2, 0),
                projects_count = GREATEST(projects_count + $3, 0)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(users_delta)
        .bind(projects_delta)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn add_user_skill(
        &self,
        user_id: Uuid,
        skill_id: i64,
        level: SkillLevel,
        experience: Option<&str>,
    ) -> Result<UserSkill, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO user_skills (user_id, skill_id, level, experience)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(skill_id)
        .bind(level.as_str())
        .bind(experience)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_db_err(e, "You already have this skill"))?;

        self.find_user_skill(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::USER_SKILL_NOT_FOUND.into()))
    }

    async fn find_user_skill(&self, id: i64) -> Result<Option<UserSkill>, AppError> {
        let sql = format!("{USER_SKILL_SELECT} WHERE us.id = $1");
        let row = sqlx::query_as::<_, UserSkillRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_user_skill_by_skill(
        &self,
        user_id: Uuid,
        skill_id: i64,
    ) -> Result<Option<UserSkill>, AppError> {
        let sql = format!("{USER_SKILL_SELECT} WHERE us.user_id = $1 AND us.skill_id = $2");
        let row = sqlx::query_as::<_, UserSkillRow>(&sql)
            .bind(user_id)
            .bind(skill_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkill>, AppError> {
        let sql = format!("{USER_SKILL_SELECT} WHERE us.user_id = $1 ORDER BY s.normalized_name");
        let rows = sqlx::query_as::<_, UserSkillRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_user_skill(
        &self,
        id: i64,
        level: SkillLevel,
        experience: Option<&str>,
    ) -> Result<UserSkill, AppError> {
        let result = sqlx::query("UPDATE user_skills SET level = $2, experience = $3 WHERE id = $1")
            .bind(id)
            .bind(level.as_str())
            .bind(experience)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::USER_SKILL_NOT_FOUND.into()));
        }
        self.find_user_skill(id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::USER_SKILL_NOT_FOUND.into()))
    }

    async fn delete_user_skill(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_skills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
