use axum::http::StatusCode;

use super::common::setup_test_app;

#[tokio::test]
async fn test_user_search_pages_and_skips_caller() {
    let app = setup_test_app().await;
    let (token, _) = app.register("ada@college.edu", "Ada").await;
    let (_, grace_id) = app.register("grace@college.edu", "Grace").await;
    app.register("linus@college.edu", "Linus").await;

    let (status, json) = app.get("/api/users/search?size=10", Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["totalElements"], 2);
    assert_eq!(json["pageSize"], 10);
    assert!(
        json["content"]
            .as_array()
            .expect("user list")
            .iter()
            .all(|u| u["email"] != "ada@college.edu")
    );

    let (status, json) = app.get("/api/users/search?query=grace", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["content"][0]["id"], grace_id);
    assert_eq!(json["numberOfElements"], 1);

    let (status, json) = app
        .get("/api/users/search?page=9999999999&size=20", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["pageNumber"], u32::MAX);
    assert_eq!(json["numberOfElements"], 0);
    assert_eq!(json["last"], true);
}
