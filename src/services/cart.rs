use crate::{
    entities::{cart_item, product, CartItem, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::ProductView,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Cart service. Totals are recomputed from product prices on every
/// read, never stored.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Loads the caller's cart with product rows joined in explicitly.
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartContents, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::AddedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        CartContents::from_rows(rows)
    }

    /// Adds a product to the cart. An existing (user, product) row is
    /// merged into by incrementing its quantity. The stock check covers
    /// the requested add amount against current stock.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, ServiceError> {
        let txn = self.db.begin().await?;

        let product = Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        if product.stock_quantity < quantity {
            return Err(ServiceError::InsufficientStock(
                "Insufficient stock".to_string(),
            ));
        }

        let existing = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        let item = match existing {
            Some(item) => {
                let merged = item.quantity + quantity;
                let mut active: cart_item::ActiveModel = item.into();
                active.quantity = Set(merged);
                active.update(&txn).await?
            }
            None => {
                let item = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    added_at: Set(Utc::now()),
                };
                item.insert(&txn).await?
            }
        };

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                user_id,
                product_id,
            })
            .await;

        info!(
            "Added to cart for user {}: product {} x{}",
            user_id, product_id, quantity
        );
        Ok(CartLine::new(item, product))
    }

    /// Sets (not adds) the quantity of one of the caller's cart rows.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, ServiceError> {
        let txn = self.db.begin().await?;

        let (item, product) = CartItem::find_by_id(item_id)
            .filter(cart_item::Column::UserId.eq(user_id))
            .find_also_related(Product)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart item not found".to_string()))?;

        let product = product
            .ok_or_else(|| ServiceError::InternalError("Cart row without product".to_string()))?;

        if product.stock_quantity < quantity {
            return Err(ServiceError::InsufficientStock(
                "Insufficient stock".to_string(),
            ));
        }

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        let item = active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated { user_id, item_id })
            .await;

        Ok(CartLine::new(item, product))
    }

    /// Removes one of the caller's cart rows.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::Id.eq(item_id))
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Cart item not found".to_string()));
        }

        self.event_sender
            .send_or_log(Event::CartItemRemoved { user_id, item_id })
            .await;

        Ok(())
    }

    /// Removes every cart row belonging to the caller. Idempotent.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<(), ServiceError> {
        CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::CartCleared(user_id))
            .await;

        info!("Cleared cart for user {}", user_id);
        Ok(())
    }
}

/// One cart row joined with its product
#[derive(Debug, Serialize)]
pub struct CartLine {
    pub id: Uuid,
    pub product: ProductView,
    pub quantity: i32,
    pub subtotal: Decimal,
}

impl CartLine {
    pub fn new(item: cart_item::Model, product: product::Model) -> Self {
        let subtotal = product.price * Decimal::from(item.quantity);
        Self {
            id: item.id,
            product: ProductView::from(product),
            quantity: item.quantity,
            subtotal,
        }
    }
}

/// The caller's full cart with a freshly computed total
#[derive(Debug, Serialize)]
pub struct CartContents {
    pub items: Vec<CartLine>,
    pub total: Decimal,
}

impl CartContents {
    fn from_rows(
        rows: Vec<(cart_item::Model, Option<product::Model>)>,
    ) -> Result<Self, ServiceError> {
        let mut items = Vec::with_capacity(rows.len());
        for (item, product) in rows {
            let product = product.ok_or_else(|| {
                ServiceError::InternalError("Cart row without product".to_string())
            })?;
            items.push(CartLine::new(item, product));
        }

        let total = items.iter().map(|line| line.subtotal).sum();
        Ok(Self { items, total })
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product_row(price: Decimal, stock: i32) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            name: "Wireless Mouse".to_string(),
            description: None,
            price,
            category: Some("Electronics".to_string()),
            image_url: None,
            stock_quantity: stock,
            created_at: Utc::now(),
        }
    }

    fn cart_row(product_id: Uuid, quantity: i32) -> cart_item::Model {
        cart_item::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id,
            quantity,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn line_subtotal_is_price_times_quantity() {
        let product = product_row(dec!(29.99), 10);
        let line = CartLine::new(cart_row(product.id, 3), product);

        assert_eq!(line.subtotal, dec!(89.97));
    }

    #[test]
    fn cart_total_sums_line_subtotals() {
        let p1 = product_row(dec!(10.00), 5);
        let p2 = product_row(dec!(2.50), 5);
        let rows = vec![
            (cart_row(p1.id, 2), Some(p1)),
            (cart_row(p2.id, 4), Some(p2)),
        ];

        let contents = CartContents::from_rows(rows).unwrap();
        assert_eq!(contents.total, dec!(30.00));
        assert_eq!(contents.item_count(), 2);
    }

    #[test]
    fn empty_cart_totals_zero() {
        let contents = CartContents::from_rows(vec![]).unwrap();
        assert_eq!(contents.total, Decimal::ZERO);
        assert_eq!(contents.item_count(), 0);
    }
}
