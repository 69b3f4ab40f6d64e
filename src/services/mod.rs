pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod chat;
pub mod checkout;
pub mod wishlist;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP and
/// websocket handlers.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<accounts::AccountService>,
    pub catalog: Arc<catalog::CatalogService>,
    pub cart: Arc<cart::CartService>,
    pub wishlist: Arc<wishlist::WishlistService>,
    pub checkout: Arc<checkout::CheckoutService>,
    pub chat: Arc<chat::ChatService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let accounts = Arc::new(accounts::AccountService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let catalog = Arc::new(catalog::CatalogService::new(
            db.clone(),
            event_sender.clone(),
            config.api_default_per_page,
            config.api_max_per_page,
        ));
        let cart = Arc::new(cart::CartService::new(db.clone(), event_sender.clone()));
        let wishlist = Arc::new(wishlist::WishlistService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let checkout = Arc::new(checkout::CheckoutService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let chat = Arc::new(chat::ChatService::new(db, event_sender));

        Self {
            accounts,
            catalog,
            cart,
            wishlist,
            checkout,
            chat,
        }
    }
}
