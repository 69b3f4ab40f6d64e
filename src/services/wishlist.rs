use crate::{
    entities::{product, wishlist_item, Product, WishlistItem},
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::ProductView,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Wishlist service: a quantity-less per-user product collection where
/// duplicate adds are rejected rather than merged.
#[derive(Clone)]
pub struct WishlistService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl WishlistService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    pub async fn get_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistLine>, ServiceError> {
        let rows = WishlistItem::find()
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .order_by_asc(wishlist_item::Column::AddedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for (item, product) in rows {
            let product = product.ok_or_else(|| {
                ServiceError::InternalError("Wishlist row without product".to_string())
            })?;
            items.push(WishlistLine::new(item, product));
        }
        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<WishlistLine, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let existing = WishlistItem::find()
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Item already in wishlist".to_string(),
            ));
        }

        let item = wishlist_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product_id),
            added_at: Set(Utc::now()),
        };
        let item = item.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::WishlistItemAdded {
                user_id,
                product_id,
            })
            .await;

        info!("Added to wishlist for user {}: product {}", user_id, product_id);
        Ok(WishlistLine::new(item, product))
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let result = WishlistItem::delete_many()
            .filter(wishlist_item::Column::Id.eq(item_id))
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(
                "Wishlist item not found".to_string(),
            ));
        }

        self.event_sender
            .send_or_log(Event::WishlistItemRemoved { user_id, item_id })
            .await;

        Ok(())
    }

    /// Removes every wishlist row belonging to the caller. Idempotent.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<(), ServiceError> {
        WishlistItem::delete_many()
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::WishlistCleared(user_id))
            .await;

        Ok(())
    }
}

/// One wishlist row joined with its product
#[derive(Debug, Serialize)]
pub struct WishlistLine {
    pub id: Uuid,
    pub product: ProductView,
}

impl WishlistLine {
    pub fn new(item: wishlist_item::Model, product: product::Model) -> Self {
        Self {
            id: item.id,
            product: ProductView::from(product),
        }
    }
}
