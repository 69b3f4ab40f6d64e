mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn register_then_login_returns_same_user_id() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "s3cret-pass",
                "full_name": "Alice Example",
            })),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let registered_id = body["user"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["username"], "alice");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "alice", "password": "s3cret-pass"})),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["id"].as_str().unwrap(), registered_id);
}

#[tokio::test]
async fn duplicate_username_is_rejected_regardless_of_other_fields() {
    let app = TestApp::new().await;
    app.register_user("bob").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(json!({
                "username": "bob",
                "email": "different@example.com",
                "password": "another-pass",
            })),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::new().await;
    app.register_user("carol").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(json!({
                "username": "carol2",
                "email": "carol@example.com",
                "password": "pass",
            })),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn missing_fields_fail_with_400() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(json!({"username": "dave", "email": "dave@example.com"})),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "password is required");
}

#[tokio::test]
async fn login_failure_does_not_reveal_which_credential_was_wrong() {
    let app = TestApp::new().await;
    app.register_user("erin").await;

    let (status, wrong_password) = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "erin", "password": "wrong"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, no_such_user) = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({"username": "nobody", "password": "wrong"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_password["message"], no_such_user["message"]);
}

#[tokio::test]
async fn current_user_requires_a_session() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::GET, "/api/auth/current-user", None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn current_user_returns_the_session_owner() {
    let app = TestApp::new().await;
    let cookie = app.register_user("frank").await;

    let (status, body) = app
        .request(Method::GET, "/api/auth/current-user", None, Some(&cookie))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "frank");
}

#[tokio::test]
async fn profile_update_rejects_email_owned_by_another_user() {
    let app = TestApp::new().await;
    app.register_user("grace").await;
    let cookie = app.register_user("heidi").await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/auth/update-profile",
            Some(json!({"email": "grace@example.com"})),
            Some(&cookie),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already in use");
}

#[tokio::test]
async fn profile_update_applies_partial_changes() {
    let app = TestApp::new().await;
    let cookie = app.register_user("ivan").await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/auth/update-profile",
            Some(json!({"phone": "+1-555-123-4567", "address": "1 Main St"})),
            Some(&cookie),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["phone"], "+1-555-123-4567");
    assert_eq!(body["user"]["address"], "1 Main St");
    assert_eq!(body["user"]["username"], "ivan");
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let app = TestApp::new().await;
    let cookie = app.register_user("judy").await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/logout")
        .header(axum::http::header::COOKIE, &cookie)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Max-Age=0"));
}
