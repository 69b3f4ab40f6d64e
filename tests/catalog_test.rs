mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use eshop_api::services::catalog::CreateProductInput;
use rust_decimal_macros::dec;
use serde_json::json;

async fn seed_catalog(app: &TestApp) {
    let items = [
        ("Laptop Pro 15", "1299.99", "Electronics", 25),
        ("Wireless Mouse", "29.99", "Electronics", 100),
        ("Desk Lamp LED", "39.99", "Office", 80),
        ("Bluetooth Speaker", "69.99", "Audio", 65),
        ("Gaming Mouse Pad", "19.99", "Gaming", 85),
    ];
    for (name, price, category, stock) in items {
        app.state
            .services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                price: price.parse().unwrap(),
                description: Some(format!("{} description", name)),
                category: Some(category.to_string()),
                image_url: None,
                stock_quantity: Some(stock),
            })
            .await
            .expect("seed product");
    }
}

#[tokio::test]
async fn listing_is_public_and_enveloped() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let (status, body) = app.request(Method::GET, "/api/products/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 5);
    assert_eq!(body["pages"], 1);
    assert_eq!(body["current_page"], 1);
    assert_eq!(body["products"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn search_is_case_insensitive_over_name_and_description() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let (_, by_name) = app
        .request(Method::GET, "/api/products/?search=LAPTOP", None, None)
        .await;
    assert_eq!(by_name["total"], 1);
    assert_eq!(by_name["products"][0]["name"], "Laptop Pro 15");

    // "mouse" appears in two product names and their descriptions.
    let (_, by_substring) = app
        .request(Method::GET, "/api/products/?search=Mouse", None, None)
        .await;
    assert_eq!(by_substring["total"], 2);
}

#[tokio::test]
async fn filters_compose_with_and() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let (_, body) = app
        .request(
            Method::GET,
            "/api/products/?category=Electronics&max_price=100",
            None,
            None,
        )
        .await;

    assert_eq!(body["total"], 1);
    assert_eq!(body["products"][0]["name"], "Wireless Mouse");
}

#[tokio::test]
async fn price_bounds_are_inclusive() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let (_, body) = app
        .request(
            Method::GET,
            "/api/products/?min_price=29.99&max_price=39.99",
            None,
            None,
        )
        .await;

    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn out_of_range_page_returns_empty_list_with_accurate_totals() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let (_, first) = app
        .request(Method::GET, "/api/products/?page=1&per_page=2", None, None)
        .await;
    assert_eq!(first["total"], 5);
    assert_eq!(first["pages"], 3);
    assert_eq!(first["products"].as_array().unwrap().len(), 2);

    let (status, beyond) = app
        .request(Method::GET, "/api/products/?page=9&per_page=2", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(beyond["success"], true);
    assert_eq!(beyond["products"].as_array().unwrap().len(), 0);
    assert_eq!(beyond["total"], first["total"]);
    assert_eq!(beyond["pages"], first["pages"]);
}

#[tokio::test]
async fn get_product_returns_404_for_unknown_id() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/products/{}", uuid::Uuid::new_v4()),
            None,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn categories_are_distinct_and_non_empty() {
    let app = TestApp::new().await;
    seed_catalog(&app).await;

    let (status, body) = app
        .request(Method::GET, "/api/products/categories", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let mut categories: Vec<String> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap().to_string())
        .collect();
    categories.sort();
    assert_eq!(categories, ["Audio", "Electronics", "Gaming", "Office"]);
}

#[tokio::test]
async fn create_product_requires_authentication() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/products/create",
            Some(json!({"name": "Widget", "price": "9.99"})),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_product_applies_defaults() {
    let app = TestApp::new().await;
    let cookie = app.register_user("merchant").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/products/create",
            Some(json!({"name": "Widget", "price": "9.99"})),
            Some(&cookie),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["product"]["category"], "General");
    assert_eq!(body["product"]["stock_quantity"], 0);
    assert_eq!(body["product"]["in_stock"], false);
    assert_eq!(
        body["product"]["image_url"],
        "/static/images/default-product.jpg"
    );
}

#[tokio::test]
async fn create_product_requires_name_and_price() {
    let app = TestApp::new().await;
    let cookie = app.register_user("merchant2").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/products/create",
            Some(json!({"price": "9.99"})),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "name is required");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/products/create",
            Some(json!({"name": "Widget"})),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "price is required");
}

#[tokio::test]
async fn negative_price_is_rejected() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .catalog
        .create_product(CreateProductInput {
            name: "Broken".to_string(),
            price: dec!(-1.00),
            description: None,
            category: None,
            image_url: None,
            stock_quantity: None,
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::BAD_REQUEST
    );
}
