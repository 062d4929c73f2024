use thiserror::Error;

use crate::validation::FieldErrors;

/// Application-wide error types for Quasar.
#[derive(Error, Debug)]
pub enum AppError {
    /// One or more request fields failed validation.
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// The request is well-formed but not acceptable in the current state.
    #[error("{0}")]
    BadRequest(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request collides with existing data (duplicates, full teams).
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to perform the action.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// OAuth2 login failed. `code` follows the OAuth2 error vocabulary.
    #[error("OAuth2 error ({code}): {message}")]
    OAuth { code: &'static str, message: String },

    /// Outbound HTTP request failed.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Outbound request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Too many requests from one client.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        AppError::Validation(errors)
    }

    /// Returns true for errors caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::BadRequest(_)
                | AppError::NotFound(_)
                | AppError::Conflict(_)
                | AppError::Unauthorized(_)
                | AppError::Forbidden(_)
                | AppError::OAuth { .. }
                | AppError::RateLimitExceeded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_message_prefix() {
        let err = AppError::Forbidden("only the project lead can update".into());
        assert_eq!(
            err.to_string(),
            "Access denied: only the project lead can update"
        );
    }

    #[test]
    fn test_invalid_field_carries_field_map() {
        match AppError::invalid_field("email", "Invalid email format") {
            AppError::Validation(errors) => {
                assert_eq!(errors.get("email"), Some("Invalid email format"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AppError::NotFound("User not found".into()).is_client_error());
        assert!(AppError::Conflict("dup".into()).is_client_error());
        assert!(!AppError::DatabaseError("down".into()).is_client_error());
        assert!(!AppError::Generic("boom".into()).is_client_error());
    }
}
