use crate::handlers::common::{map_service_error, success_response};
use crate::{auth::CurrentUser, errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Creates the router for wishlist endpoints
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_wishlist))
        .route("/add", post(add_to_wishlist))
        .route("/remove/{item_id}", delete(remove_from_wishlist))
        .route("/clear", delete(clear_wishlist))
}

/// Get the caller's wishlist
async fn get_wishlist(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ApiError> {
    let items = state
        .services
        .wishlist
        .get_wishlist(user.user_id)
        .await
        .map_err(map_service_error)?;

    let item_count = items.len();
    Ok(success_response(json!({
        "wishlist_items": items,
        "item_count": item_count,
    })))
}

/// Add a product to the wishlist; duplicates are rejected
async fn add_to_wishlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AddToWishlistRequest>,
) -> Result<Response, ApiError> {
    let product_id = payload
        .product_id
        .ok_or_else(|| ApiError::ValidationError("Product ID is required".to_string()))?;

    let item = state
        .services
        .wishlist
        .add_item(user.user_id, product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Item added to wishlist",
        "wishlist_item": item,
    })))
}

/// Remove one of the caller's wishlist rows
async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state
        .services
        .wishlist
        .remove_item(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Item removed from wishlist",
    })))
}

/// Remove every wishlist row belonging to the caller
async fn clear_wishlist(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ApiError> {
    state
        .services
        .wishlist
        .clear(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "message": "Wishlist cleared",
    })))
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: Option<Uuid>,
}
