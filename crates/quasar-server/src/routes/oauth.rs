//! GitHub login: redirect out, take the code back, hand the frontend a token.
//!
//! The random `state` travels both in the authorize URL and in an HttpOnly
//! cookie; the callback only proceeds when the two agree.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use url::Url;
use uuid::Uuid;

use quasar_core::error::AppError;
use quasar_core::oauth::{GITHUB_PROVIDER, INVALID_REQUEST};

use super::ApiRouter;
use crate::error::ApiError;
use crate::extract::{Path, Query};
use crate::state::AppState;

const STATE_COOKIE: &str = "quasar_oauth_state";
/// Seconds the browser keeps the state cookie.
const STATE_COOKIE_MAX_AGE: u32 = 600;

pub fn routes() -> ApiRouter {
    ApiRouter::new()
        .route("/oauth2/authorization/{provider}", get(authorize))
        .route("/login/oauth2/code/{provider}", get(callback))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by GitHub when the user declines.
    pub error: Option<String>,
}

fn require_github(provider: &str) -> Result<(), AppError> {
    if provider.eq_ignore_ascii_case(GITHUB_PROVIDER) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Unsupported OAuth2 provider: {provider}"
        )))
    }
}

fn redirect(location: &str, cookie: Option<String>) -> Result<Response, AppError> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| AppError::Generic(format!("Invalid redirect location: {e}")))?;
    let mut response = (StatusCode::FOUND, [(LOCATION, location)]).into_response();
    if let Some(cookie) = cookie {
        let cookie = HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::Generic(format!("Invalid cookie: {e}")))?;
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    Ok(response)
}

fn state_cookie(value: &str, max_age: u32) -> String {
    format!(
        "{STATE_COOKIE}={value}; Path=/login/oauth2; Max-Age={max_age}; HttpOnly; SameSite=Lax"
    )
}

/// Value of cookie `name` from the request's `Cookie` headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn states_match(expected: Option<&str>, received: Option<&str>) -> bool {
    match (expected, received) {
        (Some(expected), Some(received)) if !expected.is_empty() => {
            bool::from(expected.as_bytes().ct_eq(received.as_bytes()))
        }
        _ => false,
    }
}

#[utoipa::path(
    get,
    path = "/oauth2/authorization/{provider}",
    params(("provider" = String, Path, description = "Only `github`")),
    responses(
        (status = 302, description = "Redirect to the provider's consent page"),
        (status = 400, description = "Unknown provider or GitHub login not configured", body = crate::dto::ErrorResponse),
    ),
    tag = "oauth2"
)]
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Response, ApiError> {
    require_github(&provider)?;
    let github = state
        .github
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("GitHub login is not configured".into()))?;

    let csrf = Uuid::new_v4().simple().to_string();
    let location = github.authorize_url(&csrf)?;
    Ok(redirect(
        &location,
        Some(state_cookie(&csrf, STATE_COOKIE_MAX_AGE)),
    )?)
}

#[utoipa::path(
    get,
    path = "/login/oauth2/code/{provider}",
    params(("provider" = String, Path, description = "Only `github`"), CallbackParams),
    responses(
        (status = 302, description = "Redirect to the frontend with a token or an error"),
    ),
    tag = "oauth2"
)]
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let frontend = state.config.frontend_url();
    let expected = cookie_value(&headers, STATE_COOKIE);
    let clear_cookie = Some(state_cookie("", 0));

    let location = match complete_login(&state, &provider, &params, expected).await {
        Ok(token) => Url::parse_with_params(
            &format!("{frontend}/auth/oauth2/redirect"),
            &[("token", token)],
        ),
        Err(e) => {
            let message = match e {
                AppError::OAuth { message, .. } => message,
                other => other.to_string(),
            };
            tracing::warn!(%provider, error = %message, "OAuth2 login failed");
            Url::parse_with_params(&format!("{frontend}/login"), &[("error", message)])
        }
    }
    .map_err(|e| AppError::ConfigError(format!("Invalid frontend URL: {e}")))?;

    Ok(redirect(location.as_str(), clear_cookie)?)
}

async fn complete_login(
    state: &AppState,
    provider: &str,
    params: &CallbackParams,
    expected_state: Option<&str>,
) -> Result<String, AppError> {
    require_github(provider)?;
    if let Some(error) = &params.error {
        return Err(AppError::OAuth {
            code: INVALID_REQUEST,
            message: error.clone(),
        });
    }
    if !states_match(expected_state, params.state.as_deref()) {
        return Err(AppError::OAuth {
            code: INVALID_REQUEST,
            message: "OAuth2 state mismatch".into(),
        });
    }
    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::OAuth {
            code: INVALID_REQUEST,
            message: "Missing authorization code".into(),
        })?;

    let (Some(github), Some(oauth)) = (&state.github, &state.oauth) else {
        return Err(AppError::BadRequest("GitHub login is not configured".into()));
    };
    let access_token = github.exchange_code(code).await?;
    let user = oauth.provision(provider, &access_token).await?;
    tracing::info!(user_id = %user.id, "Signed in with GitHub");
    state.tokens.issue(&user)
}
