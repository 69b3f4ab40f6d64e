pub mod auth;
pub mod cart;
pub mod chat;
pub mod checkout;
pub mod common;
pub mod health;
pub mod products;
pub mod wishlist;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
