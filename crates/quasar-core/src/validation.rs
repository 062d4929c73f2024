//! Field validation helpers.
//!
//! Request types collect their problems into a [`FieldErrors`] map keyed by
//! the camelCase field name clients send, so the server can echo them back
//! verbatim in the `validationErrors` object.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::constants::{BRANCHES, PROJECT_CATEGORIES};
use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

static PASSWORD_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\d@$!%*?&]+$").expect("password pattern"));

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 100;

/// Field name → first error message for that field.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }

    /// `Ok(())` when nothing was recorded, otherwise `AppError::Validation`.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }

    /// Required text with a trimmed length range.
    pub fn require_length(&mut self, field: &str, value: &str, min: usize, max: usize, label: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{label} is required"));
        } else if !is_valid_length(value, min, max) {
            self.add(
                field,
                format!("{label} must be between {min} and {max} characters"),
            );
        }
    }

    /// Optional text with a trimmed length range, skipped when absent.
    pub fn optional_length(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
        label: &str,
    ) {
        if let Some(value) = value
            && !is_valid_length(value, min, max)
        {
            if min == 0 {
                self.add(field, format!("{label} must not exceed {max} characters"));
            } else {
                self.add(
                    field,
                    format!("{label} must be between {min} and {max} characters"),
                );
            }
        }
    }

    /// Optional absolute http(s) URL. Blank strings pass (they clear the field).
    pub fn optional_url(&mut self, field: &str, value: Option<&str>, label: &str) {
        if let Some(value) = value
            && !value.trim().is_empty()
            && !is_valid_url(value)
        {
            self.add(field, format!("{label} must be a valid http(s) URL"));
        }
    }

    pub fn range_i32(&mut self, field: &str, value: i32, min: i32, max: i32, label: &str) {
        if value < min {
            self.add(field, format!("{label} must be at least {min}"));
        } else if value > max {
            self.add(field, format!("{label} must not exceed {max}"));
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// 8..=100 characters with a lowercase letter, an uppercase letter and a
/// digit, drawn from letters, digits and `@$!%*?&`.
pub fn is_valid_password(password: &str) -> bool {
    let len = password.chars().count();
    (PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&len)
        && PASSWORD_CHARSET_RE.is_match(password)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Character length of the trimmed value within `min..=max`.
pub fn is_valid_length(value: &str, min: usize, max: usize) -> bool {
    let len = value.trim().chars().count();
    len >= min && len <= max
}

pub fn is_valid_branch(branch: &str) -> bool {
    let branch = branch.trim();
    BRANCHES.iter().any(|b| b.eq_ignore_ascii_case(branch))
}

pub fn is_valid_project_category(category: &str) -> bool {
    let category = category.trim();
    PROJECT_CATEGORIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(category))
}

pub fn is_valid_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Trim, and map blank strings to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
