use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tower::ServiceExt;

use quasar_db::Database;
use quasar_server::config::ServerConfig;
use quasar_server::routes;
use quasar_server::state::AppState;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "Password123";

/// A router over a fresh migrated database. Keep the whole struct alive for
/// the test: dropping `_container` stops PostgreSQL.
pub struct TestApp {
    pub router: Router,
    _container: ContainerAsync<GenericImage>,
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(ServerConfig::new(TEST_JWT_SECRET)).await
}

pub async fn setup_test_app_with(config: ServerConfig) -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "quasar_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/quasar_test");
    let db = Database::from_pool(retry_connect(&url).await);
    db.migrate().await.expect("Failed to run migrations");

    let state = Arc::new(AppState::new(db, config, None));
    // The rate limiter keys on the peer address.
    let router = routes::router(state).layer(MockConnectInfo(SocketAddr::from((
        [127, 0, 0, 1],
        40_000,
    ))));

    TestApp {
        router,
        _container: container,
    }
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}

impl TestApp {
    /// Send one request and decode the JSON body (`Null` when empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), body).await
    }

    /// Register a student and return `(token, user id)`.
    pub async fn register(&self, email: &str, first_name: &str) -> (String, String) {
        let (status, json) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": TEST_PASSWORD,
                    "firstName": first_name,
                    "lastName": "Tester",
                    "branch": "Computer Science",
                    "graduationYear": 2026,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {json}");
        (
            json["token"].as_str().unwrap().to_string(),
            json["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Create a recruiting project led by the token's owner; returns its id.
    pub async fn create_project(&self, token: &str, title: &str, max_team_size: i32) -> String {
        let (status, json) = self
            .post(
                "/api/projects",
                token,
                serde_json::json!({
                    "title": title,
                    "description": "Students building something useful together",
                    "maxTeamSize": max_team_size,
                    "skills": [{"skillName": "Rust"}],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {json}");
        json["id"].as_str().unwrap().to_string()
    }
}
