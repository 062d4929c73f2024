use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use quasar_core::constants::messages;
use quasar_core::error::AppError;
use quasar_core::page::{Page, PageRequest};
use quasar_core::traits::UserStore;
use quasar_core::user::{AvailabilityStatus, NewUser, User, UserRole, UserSearch};

use crate::support::{conflict_or_db_err, db_err, like_pattern};

/// Repository for user accounts.
#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    first_name: String,
    last_name: String,
    role: String,
    branch: Option<String>,
    graduation_year: Option<i32>,
    bio: Option<String>,
    availability_status: String,
    profile_picture_url: Option<String>,
    github_url: Option<String>,
    linkedin_url: Option<String>,
    portfolio_url: Option<String>,
    github_id: Option<String>,
    github_username: Option<String>,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role.parse().unwrap_or(UserRole::Student),
            branch: row.branch,
            graduation_year: row.graduation_year,
            bio: row.bio,
            availability_status: row
                .availability_status
                .parse()
                .unwrap_or(AvailabilityStatus::Available),
            profile_picture_url: row.profile_picture_url,
            github_url: row.github_url,
            linkedin_url: row.linkedin_url,
            portfolio_url: row.portfolio_url,
            github_id: row.github_id,
            github_username: row.github_username,
            is_verified: row.is_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_search_filters(qb: &mut QueryBuilder<'_, Postgres>, search: &UserSearch) {
    qb.push(" WHERE TRUE");
    if let Some(query) = search.query.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = like_pattern(query);
        qb.push(" AND (u.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR (u.first_name || ' ' || u.last_name) ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(branch) = search.branch.as_deref().filter(|b| !b.trim().is_empty()) {
        qb.push(" AND LOWER(u.branch) = LOWER(")
            .push_bind(branch.trim().to_string())
            .push(")");
    }
    if let Some(year) = search.graduation_year {
        qb.push(" AND u.graduation_year = ").push_bind(year);
    }
    if let Some(status) = search.availability {
        qb.push(" AND u.availability_status = ")
            .push_bind(status.as_str());
    }
    if let Some(skill) = search.skill.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(
            " AND EXISTS (SELECT 1 FROM user_skills us JOIN skills s ON s.id = us.skill_id \
             WHERE us.user_id = u.id AND s.name ILIKE ",
        )
        .push_bind(like_pattern(skill))
        .push(")");
    }
    if let Some(excluded) = search.exclude_user {
        qb.push(" AND u.id <> ").push_bind(excluded);
    }
}

impl UserStore for UserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                id, email, password_hash, first_name, last_name, role, branch, graduation_year,
                bio, availability_status, profile_picture_url, github_url, github_id,
                github_username, is_verified
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.email.trim().to_lowercase())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(&user.branch)
        .bind(user.graduation_year)
        .bind(&user.bio)
        .bind(user.availability_status.as_str())
        .bind(&user.profile_picture_url)
        .bind(&user.github_url)
        .bind(&user.github_id)
        .bind(&user.github_username)
        .bind(user.is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_db_err(e, messages::EMAIL_ALREADY_EXISTS))?;

        Ok(row.into())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    async fn find_user_by_github_id(&self, github_id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE github_id = $1")
            .bind(github_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    async fn update_user(&self, user: &User) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, first_name = $4, last_name = $5, role = $6,
                branch = $7, graduation_year = $8, bio = $9, availability_status = $10,
                profile_picture_url = $11, github_url = $12, linkedin_url = $13,
                portfolio_url = $14, github_id = $15, github_username = $16, is_verified = $17,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(&user.branch)
        .bind(user.graduation_year)
        .bind(&user.bio)
        .bind(user.availability_status.as_str())
        .bind(&user.profile_picture_url)
        .bind(&user.github_url)
        .bind(&user.linkedin_url)
        .bind(&user.portfolio_url)
        .bind(&user.github_id)
        .bind(&user.github_username)
        .bind(user.is_verified)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_or_db_err(e, messages::EMAIL_ALREADY_EXISTS))?;

        row.map(Into::into)
            .ok_or_else(|| AppError::NotFound(messages::USER_NOT_FOUND.into()))
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count)
    }

    async fn search_users(
        &self,
        search: &UserSearch,
        page: PageRequest,
    ) -> Result<Page<User>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u");
        push_search_filters(&mut count, search);
        let (total,): (i64,) = count
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT u.* FROM users u");
        push_search_filters(&mut select, search);
        select
            .push(" ORDER BY u.first_name, u.last_name, u.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<UserRow> = select
            .build_query_as()
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
