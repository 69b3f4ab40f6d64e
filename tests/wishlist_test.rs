mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn duplicate_wishlist_add_is_rejected_not_merged() {
    let app = TestApp::new().await;
    let cookie = app.register_user("alice").await;
    let product_id = app.create_product("Smart Watch", dec!(199.99), 35).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/wishlist/add",
            Some(json!({"product_id": product_id})),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/wishlist/add",
            Some(json!({"product_id": product_id})),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Item already in wishlist");

    let (_, body) = app
        .request(Method::GET, "/api/wishlist", None, Some(&cookie))
        .await;
    assert_eq!(body["item_count"], 1);
}

#[tokio::test]
async fn add_fails_for_unknown_product() {
    let app = TestApp::new().await;
    let cookie = app.register_user("bob").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/wishlist/add",
            Some(json!({"product_id": uuid::Uuid::new_v4()})),
            Some(&cookie),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn wishlist_rows_are_scoped_to_their_owner() {
    let app = TestApp::new().await;
    let owner_cookie = app.register_user("carol").await;
    let other_cookie = app.register_user("dave").await;
    let product_id = app.create_product("USB-C Hub", dec!(49.99), 75).await;

    let (_, added) = app
        .request(
            Method::POST,
            "/api/wishlist/add",
            Some(json!({"product_id": product_id})),
            Some(&owner_cookie),
        )
        .await;
    let item_id = added["wishlist_item"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/wishlist/remove/{}", item_id),
            None,
            Some(&other_cookie),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/wishlist/remove/{}", item_id),
            None,
            Some(&owner_cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn clear_is_idempotent() {
    let app = TestApp::new().await;
    let cookie = app.register_user("erin").await;
    let product_id = app.create_product("Desk Lamp LED", dec!(39.99), 80).await;

    app.request(
        Method::POST,
        "/api/wishlist/add",
        Some(json!({"product_id": product_id})),
        Some(&cookie),
    )
    .await;

    for _ in 0..2 {
        let (status, _) = app
            .request(Method::DELETE, "/api/wishlist/clear", None, Some(&cookie))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = app
        .request(Method::GET, "/api/wishlist", None, Some(&cookie))
        .await;
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
async fn wishlist_requires_authentication() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/wishlist", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
