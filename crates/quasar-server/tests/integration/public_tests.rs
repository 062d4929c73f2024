use axum::http::{Method, StatusCode};

use super::common::setup_test_app;

#[tokio::test]
async fn test_health_reports_database_up() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "UP");
    assert_eq!(json["database"], "UP");
}

#[tokio::test]
async fn test_static_data_is_public() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/api/static-data/branches", None).await;
    assert_eq!(status, StatusCode::OK);
    let branches = json.as_array().expect("branch list");
    assert!(branches.iter().any(|b| b == "Computer Science"));

    let (status, json) = app.get("/api/static-data/skill-levels", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!(["VIBE_CODING", "BEGINNER", "INTERMEDIATE", "ADVANCED"])
    );

    let (status, json) = app.get("/api/static-data/graduation-years", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0], 2020);
}

#[tokio::test]
async fn test_landing_counts_and_recent_projects() {
    let app = setup_test_app().await;
    let (token, _) = app.register("lead@college.edu", "Lena").await;
    app.create_project(&token, "Canteen Queue Tracker", 4).await;

    let (status, json) = app.get("/api/data/counts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["users"], 1);
    assert_eq!(json["projects"], 1);

    let (status, json) = app.get("/api/data/recent-projects?limit=3", None).await;
    assert_eq!(status, StatusCode::OK);
    let projects = json.as_array().expect("project list");
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["title"], "Canteen Queue Tracker");
}

#[tokio::test]
async fn test_unknown_route_is_uniform_404() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/api/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
    assert_eq!(json["error"], "Not Found");
    assert_eq!(json["message"], "No endpoint GET /api/does-not-exist");
    assert_eq!(json["path"], "/api/does-not-exist");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_malformed_ids_are_bad_requests() {
    let app = setup_test_app().await;
    let (token, _) = app.register("lead@college.edu", "Lena").await;

    let (status, json) = app.get("/api/projects/not-a-uuid", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Invalid path parameter"))
    );
    assert_eq!(json["path"], "/api/projects/not-a-uuid");

    let (status, json) = app
        .request(
            Method::POST,
            "/api/projects",
            Some(&token),
            Some(serde_json::json!("just a string")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Malformed JSON request"))
    );
}
