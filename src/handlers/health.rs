use crate::{db, AppState};
use axum::{extract::State, response::Response, routing::get, Router};
use serde_json::json;

use super::common::success_response;

/// Creates the router for health endpoints
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// Liveness plus a database ping
async fn health(State(state): State<AppState>) -> Response {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => "up",
        Err(_) => "down",
    };

    success_response(json!({
        "status": "ok",
        "database": database,
    }))
}
