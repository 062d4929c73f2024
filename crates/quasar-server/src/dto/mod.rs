//! Request and response bodies. JSON field names are camelCase; enums travel
//! as SCREAMING_SNAKE_CASE strings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use quasar_core::page::{Page, PageRequest};

mod messaging;
mod projects;
mod tasks;
mod team;
mod users;

pub use messaging::*;
pub use projects::*;
pub use tasks::*;
pub use team::*;
pub use users::*;

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Zero-based page number.
    pub page: Option<i64>,
    /// Page size, 1 to 100.
    pub size: Option<i64>,
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }

    pub fn request_with_default(&self, default_size: u32) -> PageRequest {
        PageRequest::with_default_size(self.page, self.size, default_size)
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: i64,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
    pub number_of_elements: usize,
}

impl<T, U: From<T>> From<Page<T>> for PageResponse<U> {
    fn from(page: Page<T>) -> Self {
        Self {
            content: page.content.into_iter().map(U::from).collect(),
            page_number: page.page_number,
            page_size: page.page_size,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            first: page.first,
            last: page.last,
            number_of_elements: page.number_of_elements,
        }
    }
}

/// Map a list of domain values to response bodies.
pub fn list_of<T, U: From<T>>(items: Vec<T>) -> Vec<U> {
    items.into_iter().map(U::from).collect()
}

// ---------------------------------------------------------------------------
// Common
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CountResponse {
    pub count: i64,
}

/// Landing page figures.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LandingCountsResponse {
    pub users: i64,
    pub projects: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    /// HTTP reason phrase.
    pub error: String,
    pub message: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<BTreeMap<String, String>>,
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_response_is_camel_case() {
        let page = Page::new(vec![1_i64, 2], PageRequest::new(Some(0), Some(2)), 5);
        let body: PageResponse<i64> = page.into();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["pageNumber"], 0);
        assert_eq!(json["pageSize"], 2);
        assert_eq!(json["totalElements"], 5);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["numberOfElements"], 2);
        assert_eq!(json["first"], true);
        assert_eq!(json["last"], false);
    }

    #[test]
    fn test_error_response_omits_empty_validation_errors() {
        let body = ErrorResponse {
            timestamp: Utc::now(),
            status: 404,
            error: "Not Found".into(),
            message: "Project not found".into(),
            path: "/api/projects/x".into(),
            validation_errors: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("validationErrors").is_none());
        assert_eq!(json["path"], "/api/projects/x");
    }
}
