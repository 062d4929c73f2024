use axum::extract::Request;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use quasar_core::error::AppError;

use crate::dto::ErrorResponse;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Wrapper so we can implement `IntoResponse` for `AppError`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::BadRequest(format!(
            "Malformed JSON request: {}",
            rejection.body_text()
        )))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(AppError::BadRequest(format!(
            "Invalid path parameter: {}",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::BadRequest(format!(
            "Invalid query parameter: {}",
            rejection.body_text()
        )))
    }
}

/// HTTP status for an application error.
pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) | AppError::BadRequest(_) | AppError::SerializationError(_) => {
            StatusCode::BAD_REQUEST
        }
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Unauthorized(_) | AppError::OAuth { .. } => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        AppError::HttpError(_)
        | AppError::Timeout(_)
        | AppError::NetworkError(_)
        | AppError::DatabaseError(_)
        | AppError::ConfigError(_)
        | AppError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The uniform error body, without the request path.
pub fn error_body(err: AppError) -> (StatusCode, ErrorResponse) {
    let status = status_for(&err);
    let message = if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
        UNEXPECTED_ERROR.to_string()
    } else {
        err.to_string()
    };
    let validation_errors = match err {
        AppError::Validation(errors) => Some(errors.into_map()),
        _ => None,
    };

    let body = ErrorResponse {
        timestamp: Utc::now(),
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Error").to_string(),
        message,
        path: String::new(),
        validation_errors,
    };
    (status, body)
}

/// Marks a response rendered from an `ApiError` so `stamp_error_path` can
/// fill in the request path.
#[derive(Debug, Clone)]
struct RenderedError(ErrorResponse);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = error_body(self.0);
        let mut response = (status, axum::Json(&body)).into_response();
        response.extensions_mut().insert(RenderedError(body));
        response
    }
}

/// Outermost middleware: writes the request path into error bodies and gives
/// rate-limiter rejections the same shape.
pub async fn stamp_error_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    let rendered = response.extensions_mut().remove::<RenderedError>();
    let body = match rendered {
        Some(RenderedError(body)) => body,
        None if response.status() == StatusCode::TOO_MANY_REQUESTS => {
            error_body(AppError::RateLimitExceeded).1
        }
        None => return response,
    };

    let status = response.status();
    let mut headers = response.headers().clone();
    headers.remove(axum::http::header::CONTENT_LENGTH);
    let mut stamped = (status, axum::Json(ErrorResponse { path, ..body })).into_response();
    for (name, value) in &headers {
        if name != axum::http::header::CONTENT_TYPE {
            stamped.headers_mut().insert(name.clone(), value.clone());
        }
    }
    stamped
}

/// Fallback for unknown routes.
pub async fn not_found(request: Request) -> ApiError {
    ApiError(AppError::NotFound(format!(
        "No endpoint {} {}",
        request.method(),
        request.uri().path()
    )))
}
