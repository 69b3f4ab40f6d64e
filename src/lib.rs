//! E-Shop API Library
//!
//! Storefront backend: catalog, cart, wishlist, checkout, and a live
//! support chat channel over one websocket per client.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod message_queue;
pub mod migrator;
pub mod services;

use axum::{routing::get, Extension, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
    pub sessions: Arc<auth::SessionService>,
    pub chat_hub: Arc<chat::ChatHub>,
}

/// API routes nested under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/products", handlers::products::products_routes())
        .nest("/cart", handlers::cart::cart_routes())
        .nest("/wishlist", handlers::wishlist::wishlist_routes())
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest("/chat", handlers::chat::chat_routes())
}

/// The full application router: root, health, and the `/api` surface,
/// with the session service injected for the auth extractor. Transport
/// middleware (tracing, CORS, compression) is layered on by the binary.
pub fn app_router(state: AppState) -> Router {
    let sessions = state.sessions.clone();

    Router::new()
        .route("/", get(|| async { "eshop-api up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api", api_routes())
        .layer(Extension(sessions))
        .with_state(state)
}
