// ABOUTME: End-to-end tests for the REST surface via tower::oneshot
// ABOUTME: Registration, login, project membership and task workflows

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use taskhive_api::{create_router, AppState};
use taskhive_auth::TokenService;
use taskhive_core::time::now_local;
use taskhive_storage::DbState;

const PASSWORD: &str = "StrongPass123";

async fn test_app() -> (Router, AppState) {
    let db = DbState::init_in_memory().await.unwrap();
    let state = AppState::new(db, TokenService::new(b"endpoint-test-secret", 30));
    (create_router(state.clone()), state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str, role: Option<&str>) -> i64 {
    let mut payload = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": PASSWORD,
    });
    if let Some(role) = role {
        payload["role"] = json!(role);
    }
    let (status, body) = send(app, Method::POST, "/api/v1/register/", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

async fn login(app: &Router, username: &str) -> String {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/login/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={username}&password={PASSWORD}"
        )))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["data"]["access_token"].as_str().unwrap().to_string()
}

fn naive(ts: chrono::NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[tokio::test]
async fn root_returns_a_welcome_message() {
    let (app, _state) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["message"],
        json!("Welcome to the Taskhive API")
    );
}

#[tokio::test]
async fn registration_defaults_to_the_user_role() {
    let (app, _state) = test_app().await;
    register(&app, "alice", None).await;
    let token = login(&app, "alice").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], json!("alice"));
    assert_eq!(body["data"]["role"], json!("user"));
    // The password hash never leaves the server.
    assert!(body["data"].get("hashed_password").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (app, _state) = test_app().await;
    register(&app, "alice", None).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/register/",
        None,
        Some(json!({
            "username": "alice",
            "email": "other@example.com",
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_with_bad_credentials_is_unauthorized() {
    let (app, _state) = test_app().await;
    register(&app, "alice", None).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/login/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=alice&password=wrong"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn requests_without_a_valid_token_are_unauthorized() {
    let (app, _state) = test_app().await;

    let (status, _) = send(&app, Method::GET, "/api/v1/me/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/v1/me/", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_accounts_resolve_to_not_found() {
    let (app, state) = test_app().await;
    let alice_id = register(&app, "alice", None).await;
    let token = login(&app, "alice").await;

    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(alice_id)
        .execute(&state.db.pool)
        .await
        .unwrap();

    // Indistinguishable from a deleted account.
    let (status, _) = send(&app, Method::GET, "/api/v1/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn plain_users_cannot_create_projects() {
    let (app, _state) = test_app().await;
    register(&app, "alice", None).await;
    let token = login(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/projects/",
        Some(&token),
        Some(json!({"name": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn managers_create_projects_with_member_batches() {
    let (app, _state) = test_app().await;
    let alice_id = register(&app, "alice", None).await;
    register(&app, "bob", Some("manager")).await;
    let bob = login(&app, "bob").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/projects/",
        Some(&bob),
        Some(json!({"name": "X", "member_ids": [alice_id]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let memberships = body["data"]["memberships"].as_array().unwrap();
    assert_eq!(memberships.len(), 2);
    let roles: Vec<(&str, &str)> = memberships
        .iter()
        .map(|m| {
            (
                m["user"]["username"].as_str().unwrap(),
                m["role"].as_str().unwrap(),
            )
        })
        .collect();
    assert!(roles.contains(&("bob", "owner")));
    assert!(roles.contains(&("alice", "member")));
}

#[tokio::test]
async fn assignees_may_only_flip_status() {
    let (app, _state) = test_app().await;
    let alice_id = register(&app, "alice", None).await;
    register(&app, "bob", Some("manager")).await;
    let bob = login(&app, "bob").await;
    let alice = login(&app, "alice").await;

    let (_, project) = send(
        &app,
        Method::POST,
        "/api/v1/projects/",
        Some(&bob),
        Some(json!({"name": "X", "member_ids": [alice_id]})),
    )
    .await;
    let project_id = project["data"]["id"].as_i64().unwrap();

    let tomorrow = naive(now_local() + Duration::days(1));
    let (status, task) = send(
        &app,
        Method::POST,
        "/api/v1/tasks/",
        Some(&bob),
        Some(json!({
            "title": "Design schema",
            "project_id": project_id,
            "assignee_id": alice_id,
            "due_date": tomorrow,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = task["data"]["id"].as_i64().unwrap();

    // Status-only update from the assignee succeeds.
    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/tasks/{task_id}"),
        Some(&alice),
        Some(json!({"status": "done"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["completed"], json!(true));
    assert!(!updated["data"]["end_date"].is_null());

    // A second task where alice is only the assignee: mixing in another
    // field fails wholesale.
    let (_, other) = send(
        &app,
        Method::POST,
        "/api/v1/tasks/",
        Some(&bob),
        Some(json!({
            "title": "Write docs",
            "project_id": project_id,
            "assignee_id": alice_id,
        })),
    )
    .await;
    let other_id = other["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/tasks/{other_id}"),
        Some(&alice),
        Some(json!({"status": "done", "title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn overdue_completion_needs_a_new_deadline_first() {
    let (app, _state) = test_app().await;
    register(&app, "bob", Some("manager")).await;
    let bob = login(&app, "bob").await;

    let (_, project) = send(
        &app,
        Method::POST,
        "/api/v1/projects/",
        Some(&bob),
        Some(json!({"name": "X"})),
    )
    .await;
    let project_id = project["data"]["id"].as_i64().unwrap();

    let yesterday = naive(now_local() - Duration::days(1));
    let (_, task) = send(
        &app,
        Method::POST,
        "/api/v1/tasks/",
        Some(&bob),
        Some(json!({
            "title": "Late task",
            "project_id": project_id,
            "due_date": yesterday,
        })),
    )
    .await;
    let task_id = task["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/tasks/{task_id}"),
        Some(&bob),
        Some(json!({"status": "done"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let tomorrow = naive(now_local() + Duration::days(1));
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/tasks/{task_id}"),
        Some(&bob),
        Some(json!({"due_date": tomorrow})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/tasks/{task_id}"),
        Some(&bob),
        Some(json!({"status": "done"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completed"], json!(true));
}

#[tokio::test]
async fn project_listing_supports_archive_and_search_filters() {
    let (app, _state) = test_app().await;
    register(&app, "bob", Some("manager")).await;
    let bob = login(&app, "bob").await;

    let (_, backend) = send(
        &app,
        Method::POST,
        "/api/v1/projects/",
        Some(&bob),
        Some(json!({"name": "Backend"})),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/api/v1/projects/",
        Some(&bob),
        Some(json!({"name": "Frontend"})),
    )
    .await;
    let backend_id = backend["data"]["id"].as_i64().unwrap();
    send(
        &app,
        Method::POST,
        &format!("/api/v1/projects/{backend_id}/archive/"),
        Some(&bob),
        None,
    )
    .await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/projects/?archived=true",
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], json!("Backend"));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/projects/?search=front",
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], json!("Frontend"));
}

#[tokio::test]
async fn unknown_tasks_are_not_found() {
    let (app, _state) = test_app().await;
    register(&app, "alice", None).await;
    let token = login(&app, "alice").await;

    let (status, _) = send(&app, Method::GET, "/api/v1/tasks/999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_endpoints_are_gated_by_the_system_role() {
    let (app, _state) = test_app().await;
    let alice_id = register(&app, "alice", None).await;
    register(&app, "root", Some("admin")).await;
    let alice = login(&app, "alice").await;
    let root = login(&app, "root").await;

    let (status, _) = send(&app, Method::GET, "/api/v1/users/", Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/api/v1/users/", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Role promotion by the admin.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/users/{alice_id}/role/"),
        Some(&root),
        Some(json!({"role": "manager"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], json!("manager"));
}

#[tokio::test]
async fn team_management_is_admin_only_but_summaries_are_public() {
    let (app, _state) = test_app().await;
    register(&app, "alice", None).await;
    register(&app, "root", Some("admin")).await;
    let alice = login(&app, "alice").await;
    let root = login(&app, "root").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/teams/",
        Some(&alice),
        Some(json!({"name": "Platform"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/teams/",
        Some(&root),
        Some(json!({"name": "Platform"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Duplicate names are rejected case-insensitively.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/teams/",
        Some(&root),
        Some(json!({"name": "platform"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/api/v1/teams/public/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], json!("Platform"));
}

#[tokio::test]
async fn personal_tasks_stay_private() {
    let (app, _state) = test_app().await;
    register(&app, "alice", None).await;
    register(&app, "bob", None).await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    let (status, task) = send(
        &app,
        Method::POST,
        "/api/v1/tasks/",
        Some(&alice),
        Some(json!({"title": "Groceries", "is_personal": true})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = task["data"]["id"].as_i64().unwrap();
    assert_eq!(task["data"]["assignee"]["username"], json!("alice"));

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/tasks/{task_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/tasks/personal/",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/tasks/personal/",
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn password_change_requires_the_current_password() {
    let (app, _state) = test_app().await;
    register(&app, "alice", None).await;
    let token = login(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/me/password/",
        Some(&token),
        Some(json!({"current_password": "wrong", "new_password": "NewPass456"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/me/password/",
        Some(&token),
        Some(json!({"current_password": PASSWORD, "new_password": "NewPass456"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The old password no longer works.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/login/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username=alice&password={PASSWORD}")))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
