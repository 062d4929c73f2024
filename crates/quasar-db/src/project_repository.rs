use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Pool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use quasar_core::constants::messages;
use quasar_core::error::AppError;
use quasar_core::page::{Page, PageRequest};
use quasar_core::project::{
    Project, ProjectCategory, ProjectMember, ProjectRole, ProjectSearch, ProjectSkill,
    ProjectStatus,
};
use quasar_core::traits::ProjectStore;

use crate::support::{conflict_or_db_err, db_err, like_pattern};

/// Repository for projects, categories and memberships.
#[derive(Clone)]
pub struct ProjectRepository {
    pool: Pool<Postgres>,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach skill lists to a batch of project rows, keeping row order.
    async fn hydrate(&self, rows: Vec<ProjectRow>) -> Result<Vec<Project>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let skill_rows = sqlx::query_as::<_, ProjectSkillRow>(
            r#"
            SELECT ps.project_id, ps.skill_id, s.name, s.category, ps.required
            FROM project_skills ps
            JOIN skills s ON s.id = ps.skill_id
            WHERE ps.project_id = ANY($1)
            ORDER BY s.normalized_name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut skills: HashMap<Uuid, Vec<ProjectSkill>> = HashMap::new();
        for row in skill_rows {
            skills.entry(row.project_id).or_default().push(ProjectSkill {
                skill_id: row.skill_id,
                name: row.name,
                category: row.category,
                required: row.required,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let project_skills = skills.remove(&row.id).unwrap_or_default();
                row.into_project(project_skills)
            })
            .collect())
    }

    async fn fetch_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let sql = format!("{PROJECT_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

/// Load a membership that must exist.
pub(crate) async fn fetch_member(pool: &PgPool, member_id: i64) -> Result<ProjectMember, AppError> {
    let sql = format!("{MEMBER_SELECT} WHERE m.id = $1");
    let row = sqlx::query_as::<_, MemberRow>(&sql)
        .bind(member_id)
        .fetch_optional(pool)
        .await
        .map_err(db_err)?;
    row.map(Into::into)
        .ok_or_else(|| AppError::NotFound(messages::MEMBER_NOT_FOUND.into()))
}

const PROJECT_SELECT: &str = r#"
    SELECT p.id, p.title, p.description, p.status, p.lead_id,
           u.first_name || ' ' || u.last_name AS lead_name,
           p.max_team_size,
           (SELECT COUNT(*) FROM project_members pm WHERE pm.project_id = p.id)::INT
               AS current_team_size,
           p.tech_stack, p.problem_statement, p.goals, p.objectives,
           p.expected_start_date, p.expected_end_date, p.github_repo, p.demo_url,
           p.created_at, p.updated_at,
           c.id AS category_id, c.name AS category_name,
           c.description AS category_description, c.created_at AS category_created_at
    FROM projects p
    JOIN users u ON u.id = p.lead_id
    LEFT JOIN project_categories c ON c.id = p.category_id
"#;

const MEMBER_SELECT: &str = r#"
    SELECT m.id, m.project_id, m.user_id, m.role, u.first_name, u.last_name, u.email, m.joined_at
    FROM project_members m
    JOIN users u ON u.id = m.user_id
"#;

/// `p` is led by or has the bound user as a member.
fn push_involves(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid) {
    qb.push("(p.lead_id = ")
        .push_bind(user_id)
        .push(
            " OR EXISTS (SELECT 1 FROM project_members im \
             WHERE im.project_id = p.id AND im.user_id = ",
        )
        .push_bind(user_id)
        .push("))");
}

fn push_search_filters(qb: &mut QueryBuilder<'_, Postgres>, search: &ProjectSearch) {
    qb.push(" WHERE TRUE");
    if let Some(query) = search.query.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = like_pattern(query);
        qb.push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = search.category.as_deref().filter(|c| !c.trim().is_empty()) {
        qb.push(" AND LOWER(c.name) = LOWER(")
            .push_bind(category.trim().to_string())
            .push(")");
    }
    if let Some(status) = search.status {
        qb.push(" AND p.status = ").push_bind(status.as_str());
    }
    if search.available_only {
        qb.push(
            " AND p.status = 'RECRUITING' AND (SELECT COUNT(*) FROM project_members am \
             WHERE am.project_id = p.id) < p.max_team_size",
        );
    }
    if let Some(lead_id) = search.lead_id {
        qb.push(" AND p.lead_id = ").push_bind(lead_id);
    }
    if let Some(user_id) = search.exclude_user {
        qb.push(" AND NOT ");
        push_involves(qb, user_id);
    }
    if let Some(user_id) = search.involving_user {
        qb.push(" AND ");
        push_involves(qb, user_id);
    }
}

async fn insert_skills(
    tx: &mut Transaction<'_, Postgres>,
    project_id: Uuid,
    skills: &[ProjectSkill],
) -> Result<(), AppError> {
    for skill in skills {
        sqlx::query(
            "INSERT INTO project_skills (project_id, skill_id, required) VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(skill.skill_id)
        .bind(skill.required)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    }
    sqlx::query("UPDATE skills SET projects_count = projects_count + 1 WHERE id = ANY($1)")
        .bind(skills.iter().map(|s| s.skill_id).collect::<Vec<_>>())
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    Ok(())
}

async fn release_skills(tx: &mut Transaction<'_, Postgres>, project_id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE skills SET projects_count = GREATEST(projects_count - 1, 0)
        WHERE id IN (SELECT skill_id FROM project_skills WHERE project_id = $1)
        "#,
    )
    .bind(project_id)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    sqlx::query("DELETE FROM project_skills WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    Ok(())
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    title: String,
    description: String,
    status: String,
    lead_id: Uuid,
    lead_name: String,
    max_team_size: i32,
    current_team_size: i32,
    tech_stack: Vec<String>,
    problem_statement: Option<String>,
    goals: Option<String>,
    objectives: Option<String>,
    expected_start_date: Option<NaiveDate>,
    expected_end_date: Option<NaiveDate>,
    github_repo: Option<String>,
    demo_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_description: Option<String>,
    category_created_at: Option<DateTime<Utc>>,
}

impl ProjectRow {
    fn into_project(self, skills: Vec<ProjectSkill>) -> Project {
        let category = match (self.category_id, self.category_name, self.category_created_at) {
            (Some(id), Some(name), Some(created_at)) => Some(ProjectCategory {
                id,
                name,
                description: self.category_description,
                created_at,
            }),
            _ => None,
        };
        Project {
            id: self.id,
            title: self.title,
            description: self.description,
            category,
            status: self.status.parse().unwrap_or(ProjectStatus::Recruiting),
            lead_id: self.lead_id,
            lead_name: self.lead_name,
            max_team_size: self.max_team_size,
            current_team_size: self.current_team_size,
            skills,
            tech_stack: self.tech_stack,
            problem_statement: self.problem_statement,
            goals: self.goals,
            objectives: self.objectives,
            expected_start_date: self.expected_start_date,
            expected_end_date: self.expected_end_date,
            github_repo: self.github_repo,
            demo_url: self.demo_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProjectSkillRow {
    project_id: Uuid,
    skill_id: i64,
    name: String,
    category: String,
    required: bool,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for ProjectCategory {
    fn from(row: CategoryRow) -> Self {
        ProjectCategory {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: i64,
    project_id: Uuid,
    user_id: Uuid,
    role: String,
    first_name: String,
    last_name: String,
    email: String,
    joined_at: DateTime<Utc>,
}

impl From<MemberRow> for ProjectMember {
    fn from(row: MemberRow) -> Self {
        ProjectMember {
            id: row.id,
            project_id: row.project_id,
            user_id: row.user_id,
            role: row.role.parse().unwrap_or(ProjectRole::Member),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            joined_at: row.joined_at,
        }
    }
}

/// Lock the project row inside `tx` and make sure it still has a free seat.
/// Concurrent joins for the same project serialize on this lock.
pub(crate) async fn claim_seat(
    tx: &mut Transaction<'_, Postgres>,
    project_id: Uuid,
) -> Result<(), AppError> {
    let locked: Option<(String, i32)> =
        sqlx::query_as("SELECT status, max_team_size FROM projects WHERE id = $1 FOR UPDATE")
            .bind(project_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_err)?;
    let Some((status, max_team_size)) = locked else {
        return Err(AppError::NotFound(messages::PROJECT_NOT_FOUND.into()));
    };
    if !status
        .parse::<ProjectStatus>()
        .is_ok_and(|s| s.can_accept_members())
    {
        return Err(AppError::BadRequest(messages::NOT_RECRUITING.into()));
    }

    let (members,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(db_err)?;
    if members >= i64::from(max_team_size) {
        return Err(AppError::Conflict(messages::PROJECT_FULL.into()));
    }
    Ok(())
}

/// Insert a membership inside `tx` and return its id.
pub(crate) async fn insert_member(
    tx: &mut Transaction<'_, Postgres>,
    project_id: Uuid,
    user_id: Uuid,
    role: ProjectRole,
) -> Result<i64, AppError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(role.as_str())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| conflict_or_db_err(e, messages::ALREADY_MEMBER))?;
    Ok(id)
}

impl ProjectStore for ProjectRepository {
    async fn list_categories(&self) -> Result<Vec<ProjectCategory>, AppError> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM project_categories ORDER BY LOWER(name)")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_categories(&self, query: &str) -> Result<Vec<ProjectCategory>, AppError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM project_categories WHERE name ILIKE $1 ORDER BY LOWER(name)",
        )
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_category(&self, id: i64) -> Result<Option<ProjectCategory>, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT * FROM project_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<ProjectCategory>, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM project_categories WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ProjectCategory, AppError> {
        sqlx::query(
            "INSERT INTO project_categories (name, description) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(name.trim())
        .bind(description)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.find_category_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::CATEGORY_NOT_FOUND.into()))
    }

    async fn insert_project(&self, project: &Project) -> Result<Project, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO projects (
                id, title, description, category_id, status, lead_id, max_team_size, tech_stack,
                problem_statement, goals, objectives, expected_start_date, expected_end_date,
                github_repo, demo_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.category.as_ref().map(|c| c.id))
        .bind(project.status.as_str())
        .bind(project.lead_id)
        .bind(project.max_team_size)
        .bind(&project.tech_stack)
        .bind(&project.problem_statement)
        .bind(&project.goals)
        .bind(&project.objectives)
        .bind(project.expected_start_date)
        .bind(project.expected_end_date)
        .bind(&project.github_repo)
        .bind(&project.demo_url)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        insert_skills(&mut tx, project.id, &project.skills).await?;
        insert_member(&mut tx, project.id, project.lead_id, ProjectRole::Lead).await?;
        tx.commit().await.map_err(db_err)?;

        self.fetch_project(project.id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::PROJECT_NOT_FOUND.into()))
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        self.fetch_project(id).await
    }

    async fn update_project(&self, project: &Project) -> Result<Project, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET title = $2, description = $3, category_id = $4, status = $5, max_team_size = $6,
                tech_stack = $7, problem_statement = $8, goals = $9, objectives = $10,
                expected_start_date = $11, expected_end_date = $12, github_repo = $13,
                demo_url = $14, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.category.as_ref().map(|c| c.id))
        .bind(project.status.as_str())
        .bind(project.max_team_size)
        .bind(&project.tech_stack)
        .bind(&project.problem_statement)
        .bind(&project.goals)
        .bind(&project.objectives)
        .bind(project.expected_start_date)
        .bind(project.expected_end_date)
        .bind(&project.github_repo)
        .bind(&project.demo_url)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::PROJECT_NOT_FOUND.into()));
        }

        release_skills(&mut tx, project.id).await?;
        insert_skills(&mut tx, project.id, &project.skills).await?;
        tx.commit().await.map_err(db_err)?;

        self.fetch_project(project.id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::PROJECT_NOT_FOUND.into()))
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        release_skills(&mut tx, id).await?;
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn search_projects(
        &self,
        search: &ProjectSearch,
        page: PageRequest,
    ) -> Result<Page<Project>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM projects p LEFT JOIN project_categories c ON c.id = p.category_id",
        );
        push_search_filters(&mut count, search);
        let (total,): (i64,) = count
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let mut select = QueryBuilder::<Postgres>::new(PROJECT_SELECT);
        push_search_filters(&mut select, search);
        select
            .push(" ORDER BY p.created_at DESC, p.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ProjectRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(Page::new(self.hydrate(rows).await?, page, total))
    }

    async fn recent_projects(&self, limit: i64) -> Result<Vec<Project>, AppError> {
        let sql = format!("{PROJECT_SELECT} ORDER BY p.created_at DESC LIMIT $1");
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        self.hydrate(rows).await
    }

    async fn count_projects(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count)
    }

    async fn count_projects_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM projects p
            WHERE p.lead_id = $1
               OR EXISTS (SELECT 1 FROM project_members m WHERE m.project_id = p.id AND m.user_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(count)
    }

    async fn project_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError> {
        let sql = format!(
            "{MEMBER_SELECT} WHERE m.project_id = $1 ORDER BY (m.role = 'LEAD') DESC, m.joined_at, m.id"
        );
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_member(&self, member_id: i64) -> Result<Option<ProjectMember>, AppError> {
        let sql = format!("{MEMBER_SELECT} WHERE m.id = $1");
        let row = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn find_membership(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>, AppError> {
        let sql = format!("{MEMBER_SELECT} WHERE m.project_id = $1 AND m.user_id = $2");
        let row = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn add_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        role: ProjectRole,
    ) -> Result<ProjectMember, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        claim_seat(&mut tx, project_id).await?;
        let id = insert_member(&mut tx, project_id, user_id, role).await?;
        tx.commit().await.map_err(db_err)?;
        fetch_member(&self.pool, id).await
    }

    async fn update_member_role(
        &self,
        member_id: i64,
        role: ProjectRole,
    ) -> Result<ProjectMember, AppError> {
        let result = sqlx::query("UPDATE project_members SET role = $2 WHERE id = $1")
            .bind(member_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(messages::MEMBER_NOT_FOUND.into()));
        }
        fetch_member(&self.pool, member_id).await
    }

    async fn remove_member(&self, member_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM project_members WHERE id = $1")
            .bind(member_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
