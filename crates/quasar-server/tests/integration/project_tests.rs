use axum::http::{Method, StatusCode};
use serde_json::json;

use super::common::setup_test_app;

#[tokio::test]
async fn test_create_and_fetch_project() {
    let app = setup_test_app().await;
    let (token, lead_id) = app.register("lead@college.edu", "Lena").await;

    let id = app.create_project(&token, "Campus Ride Share", 4).await;

    let (status, json) = app.get(&format!("/api/projects/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Campus Ride Share");
    assert_eq!(json["status"], "RECRUITING");
    assert_eq!(json["leadId"], lead_id);
    assert_eq!(json["currentTeamSize"], 1);
    assert_eq!(json["availableSpots"], 3);
    assert_eq!(json["isFull"], false);
    assert_eq!(json["requiredSkills"][0]["skillName"], "Rust");

    let (status, json) = app
        .get(&format!("/api/projects/{id}/members"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let members = json.as_array().expect("member list");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["role"], "LEAD");
}

#[tokio::test]
async fn test_project_without_skills_is_rejected() {
    let app = setup_test_app().await;
    let (token, _) = app.register("lead@college.edu", "Lena").await;

    let (status, json) = app
        .post(
            "/api/projects",
            &token,
            json!({
                "title": "No Skills Needed",
                "description": "Students building something useful together",
                "skills": [],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Project must have at least one skill");
}

#[tokio::test]
async fn test_only_lead_updates_project() {
    let app = setup_test_app().await;
    let (lead, _) = app.register("lead@college.edu", "Lena").await;
    let (other, _) = app.register("other@college.edu", "Omar").await;
    let id = app.create_project(&lead, "Library Seat Finder", 3).await;

    let (status, _) = app
        .put(
            &format!("/api/projects/{id}"),
            &other,
            Some(json!({"title": "Hijacked Project"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .put(
            &format!("/api/projects/{id}"),
            &lead,
            Some(json!({"title": "Library Seat Finder v2"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Library Seat Finder v2");
}

#[tokio::test]
async fn test_invitation_accepted_adds_member() {
    let app = setup_test_app().await;
    let (lead, _) = app.register("lead@college.edu", "Lena").await;
    let (invitee, invitee_id) = app.register("ivy@college.edu", "Ivy").await;
    let id = app.create_project(&lead, "Study Group Planner", 3).await;

    let (status, json) = app
        .post(
            &format!("/api/teams/{id}/invitations"),
            &lead,
            json!({"invitedUserId": invitee_id, "message": "Join us"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["role"], "MEMBER");
    let invitation_id = json["id"].as_i64().expect("invitation id");

    let (status, json) = app.get("/api/notifications/unread-count", Some(&invitee)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["count"].as_i64().is_some_and(|c| c >= 1));

    let (status, _) = app
        .post(
            &format!("/api/teams/{id}/invitations"),
            &lead,
            json!({"invitedUserId": invitee_id}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = app
        .put(
            &format!("/api/invitations/{invitation_id}/respond?response=accepted"),
            &invitee,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["status"], "ACCEPTED");

    let (_, json) = app
        .get(&format!("/api/projects/{id}/members"), Some(&lead))
        .await;
    let members = json.as_array().expect("member list");
    assert_eq!(members.len(), 2);
    assert!(members.iter().any(|m| m["userId"] == invitee_id));

    let (_, json) = app.get(&format!("/api/projects/{id}"), Some(&lead)).await;
    assert_eq!(json["currentTeamSize"], 2);
}

#[tokio::test]
async fn test_join_request_accepted_by_lead() {
    let app = setup_test_app().await;
    let (lead, _) = app.register("lead@college.edu", "Lena").await;
    let (student, student_id) = app.register("sam@college.edu", "Sam").await;
    let id = app.create_project(&lead, "Hostel Mess Feedback", 3).await;

    let (status, json) = app
        .post(
            &format!("/api/projects/{id}/join-requests"),
            &student,
            json!({"message": "I know Rust"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    let request_id = json["id"].as_i64().expect("request id");

    // Only the lead may decide.
    let (status, _) = app
        .put(&format!("/api/join-requests/{request_id}/accept"), &student, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .get(&format!("/api/projects/{id}/join-requests"), Some(&lead))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.to_string().contains("I know Rust"));

    let (status, json) = app
        .put(&format!("/api/join-requests/{request_id}/accept"), &lead, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["userId"], student_id);
    assert_eq!(json["role"], "MEMBER");

    let (status, _) = app
        .post(
            &format!("/api/projects/{id}/join-requests"),
            &student,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_tasks_and_chat_for_team_members() {
    let app = setup_test_app().await;
    let (lead, _) = app.register("lead@college.edu", "Lena").await;
    let (outsider, _) = app.register("out@college.edu", "Otto").await;
    let id = app.create_project(&lead, "Lab Equipment Tracker", 3).await;

    let (status, json) = app
        .post(
            &format!("/api/projects/{id}/tasks"),
            &lead,
            json!({"title": "Design the schema", "priority": "high"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["status"], "TODO");
    assert_eq!(json["priority"], "HIGH");
    let task_id = json["id"].as_i64().expect("task id");

    let (status, json) = app
        .put(&format!("/api/tasks/{task_id}/complete"), &lead, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "COMPLETED");

    let (status, json) = app
        .get(&format!("/api/projects/{id}/tasks/statistics"), Some(&lead))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
    assert_eq!(json["completed"], 1);

    let (status, _) = app
        .get(&format!("/api/projects/{id}/tasks"), Some(&outsider))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .post(
            &format!("/api/chat/projects/{id}/messages"),
            &lead,
            json!({"content": "Kickoff at 5pm"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["content"], "Kickoff at 5pm");
    assert_eq!(json["type"], "TEXT");

    let (status, _) = app
        .post(
            &format!("/api/chat/projects/{id}/messages"),
            &outsider,
            json!({"content": "Let me in"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .post(
            &format!("/api/chat/projects/{id}/messages"),
            &lead,
            json!({"content": "   "}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["validationErrors"]["content"].is_string());
}
