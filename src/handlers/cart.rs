use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{auth::CurrentUser, errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_to_cart))
        .route("/update/{item_id}", put(update_cart_item))
        .route("/remove/{item_id}", delete(remove_from_cart))
        .route("/clear", delete(clear_cart))
}

/// Get the caller's cart with a freshly computed total
async fn get_cart(State(state): State<AppState>, user: CurrentUser) -> Result<Response, ApiError> {
    let cart = state
        .services
        .cart
        .get_cart(user.user_id)
        .await
        .map_err(map_service_error)?;

    let item_count = cart.item_count();
    Ok(success_response(json!({
        "cart_items": cart.items,
        "total": cart.total,
        "item_count": item_count,
    })))
}

/// Add a product to the cart, merging into an existing row
async fn add_to_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AddToCartRequest>,
) -> Result<Response, ApiError> {
    let product_id = payload
        .product_id
        .ok_or_else(|| ApiError::ValidationError("Product ID is required".to_string()))?;

    validate_input(&payload)?;

    let line = state
        .services
        .cart
        .add_item(user.user_id, product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Item added to cart",
        "cart_item": line,
    })))
}

/// Set the quantity of one of the caller's cart rows
async fn update_cart_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;

    let line = state
        .services
        .cart
        .update_quantity(user.user_id, item_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Cart item updated",
        "cart_item": line,
    })))
}

/// Remove one of the caller's cart rows
async fn remove_from_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .cart
        .remove_item(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Item removed from cart",
    })))
}

/// Remove every cart row belonging to the caller
async fn clear_cart(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ApiError> {
    state
        .services
        .cart
        .clear(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Cart cleared",
    })))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Option<Uuid>,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1))]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1))]
    pub quantity: i32,
}
