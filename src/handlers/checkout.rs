use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::{
    auth::CurrentUser,
    errors::ApiError,
    services::checkout::{payment_methods, CheckoutInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/process", post(process_checkout))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/payment-methods", get(list_payment_methods))
}

/// Convert the caller's cart into an order
async fn process_checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Response, ApiError> {
    let account = state
        .services
        .accounts
        .get_user(user.user_id)
        .await
        .map_err(map_service_error)?;

    let order = state
        .services
        .checkout
        .process_checkout(
            &account,
            CheckoutInput {
                shipping_address: payload.shipping_address,
                payment_method: payload.payment_method,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(json!({
        "message": "Order placed successfully",
        "order": order,
    })))
}

/// List the caller's orders, newest first
async fn list_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ApiError> {
    let orders = state
        .services
        .checkout
        .list_orders(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "orders": orders,
    })))
}

/// Get one of the caller's orders
async fn get_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = state
        .services
        .checkout
        .get_order(user.user_id, order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "order": order,
    })))
}

/// The fixed payment-method enumeration; no gateway behind it
async fn list_payment_methods() -> Result<Response, ApiError> {
    Ok(success_response(json!({
        "payment_methods": payment_methods(),
    })))
}

// Request DTOs

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: Option<String>,
    pub payment_method: Option<String>,
}
