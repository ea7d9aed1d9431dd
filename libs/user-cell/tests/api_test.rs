use std::sync::Arc;

use axum::{http::StatusCode, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use shared_database::AppState;
use shared_utils::test_utils::{json_request, read_json, TestConfig};
use user_cell::user_api;

fn create_test_app(state: Arc<AppState>) -> Router {
    let (api, _) = user_api().split_for_parts();
    Router::new().nest("/api", api).with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(json_request(method, uri, body)).await.unwrap();
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return (status, Value::Null);
    }
    (status, read_json(response).await)
}

#[tokio::test]
async fn user_lifecycle() {
    let app = create_test_app(TestConfig::default().to_state());

    let (status, user) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "username": "reception.desk", "email": "desk@clinic.cl", "first_name": "Front" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["is_active"], true);
    assert!(user["date_joined"].is_string());

    let uri = format!("/api/users/{}", user["id"]);
    let (status, updated) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({ "username": "reception.desk", "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_active"], false);
    assert_eq!(updated["date_joined"], user["date_joined"]);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn usernames_are_unique_and_restricted() {
    let app = create_test_app(TestConfig::default().to_state());
    send(&app, "POST", "/api/users", Some(json!({ "username": "admin" }))).await;

    let (status, body) = send(&app, "POST", "/api/users", Some(json!({ "username": "admin" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["username"][0], "A user with that username already exists.");

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "username": "dr house", "email": "house@" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["username"][0].as_str().unwrap().starts_with("Enter a valid username."));
    assert_eq!(body["fields"]["email"][0], "Enter a valid email address.");
}

#[tokio::test]
async fn users_filter_and_order() {
    let app = create_test_app(TestConfig::default().to_state());
    for (username, active) in [("nurse.b", true), ("nurse.a", false), ("admin", true)] {
        send(&app, "POST", "/api/users", Some(json!({ "username": username, "is_active": active }))).await;
    }

    let (_, body) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(body["results"][0]["username"], "admin");

    let (_, body) = send(&app, "GET", "/api/users?username=NURSE&ordering=-username", None).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["username"], "nurse.b");

    let (_, body) = send(&app, "GET", "/api/users?is_active=false", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "nurse.a");
}
