//! Error mapping and query helpers shared by the repositories.

use quasar_core::AppError;

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn db_err(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(e.to_string())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

/// Map a unique violation to `Conflict(message)`, anything else to a
/// database error.
pub(crate) fn conflict_or_db_err(e: sqlx::Error, message: &str) -> AppError {
    if is_unique_violation(&e) {
        AppError::Conflict(message.to_string())
    } else {
        db_err(e)
    }
}

/// `%query%` for ILIKE with the wildcard characters escaped.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
