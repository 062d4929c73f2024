use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use quasar_server::config::{RateLimit, ServerConfig};

use super::common::{TEST_JWT_SECRET, TEST_PASSWORD, TestApp, setup_test_app, setup_test_app_with};

/// Login attempt claiming to come from `forwarded_for`.
async fn login_from(app: &TestApp, forwarded_for: &str) -> StatusCode {
    let body = json!({"email": "nobody@college.edu", "password": TEST_PASSWORD});
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap().status()
}

fn tight_limit(trusted_proxy: bool) -> ServerConfig {
    let mut config = ServerConfig::new(TEST_JWT_SECRET);
    config.auth_rate_limit = RateLimit {
        burst: 2,
        replenish_secs: 60,
    };
    config.trusted_proxy = trusted_proxy;
    config
}

#[tokio::test]
async fn test_register_returns_bearer_token() {
    let app = setup_test_app().await;

    let (status, json) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "ada@college.edu",
                "password": TEST_PASSWORD,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "branch": "Computer Science",
                "graduationYear": 2026,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["tokenType"], "Bearer");
    assert!(json["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(json["expiresIn"].as_i64().is_some_and(|s| s > 0));
    assert_eq!(json["user"]["email"], "ada@college.edu");
    assert_eq!(json["user"]["fullName"], "Ada Lovelace");
    assert_eq!(json["user"]["role"], "STUDENT");
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = setup_test_app().await;
    app.register("grace@college.edu", "Grace").await;

    let (status, json) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "Grace@College.edu",
                "password": TEST_PASSWORD,
                "firstName": "Grace",
                "lastName": "Hopper",
                "branch": "Computer Science",
                "graduationYear": 2025,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Email already exists");
    assert_eq!(json["path"], "/api/auth/register");
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = setup_test_app().await;
    app.register("linus@college.edu", "Linus").await;

    let (status, json) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "linus@college.edu", "password": "WrongPass1"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid credentials");

    let (status, json) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "linus@college.edu", "password": TEST_PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["firstName"], "Linus");
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = setup_test_app().await;
    let (token, user_id) = app.register("barbara@college.edu", "Barbara").await;

    let (status, json) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        json["message"],
        "Full authentication is required to access this resource"
    );

    let (status, json) = app.get("/api/auth/me", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["message"].is_string());

    let (status, json) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], user_id);
    assert_eq!(json["email"], "barbara@college.edu");
}

#[tokio::test]
async fn test_register_validation_lists_fields() {
    let app = setup_test_app().await;

    let (status, json) = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "not-an-email",
                "password": "short",
                "firstName": "",
                "lastName": "Tester",
                "branch": "Computer Science",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Validation failed");
    let errors = json["validationErrors"]
        .as_object()
        .expect("validationErrors map");
    assert!(errors.contains_key("email"));
    assert!(errors.contains_key("password"));
    assert!(errors.contains_key("firstName"));
}

#[tokio::test]
async fn test_logout_acknowledges() {
    let app = setup_test_app().await;
    let (token, _) = app.register("ken@college.edu", "Ken").await;

    let (status, json) = app
        .request(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Logged out successfully");
}

#[tokio::test]
async fn test_forwarded_header_does_not_reset_login_limit() {
    let app = setup_test_app_with(tight_limit(false)).await;

    assert_eq!(login_from(&app, "203.0.113.1").await, StatusCode::UNAUTHORIZED);
    assert_eq!(login_from(&app, "203.0.113.2").await, StatusCode::UNAUTHORIZED);
    assert_eq!(
        login_from(&app, "203.0.113.3").await,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_trusted_proxy_limits_each_forwarded_client() {
    let app = setup_test_app_with(tight_limit(true)).await;

    assert_eq!(login_from(&app, "203.0.113.1").await, StatusCode::UNAUTHORIZED);
    assert_eq!(login_from(&app, "203.0.113.1").await, StatusCode::UNAUTHORIZED);
    assert_eq!(
        login_from(&app, "203.0.113.1").await,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(login_from(&app, "203.0.113.2").await, StatusCode::UNAUTHORIZED);
}
