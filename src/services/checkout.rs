use crate::{
    entities::{
        cart_item, order, order_item, product, user, CartItem, Order, OrderItem, Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::ProductView,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const DEFAULT_PAYMENT_METHOD: &str = "Credit Card";

/// Checkout service: the transactional conversion of cart lines into a
/// persisted order with stock adjustment, plus the read-only order
/// history.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Converts the caller's cart into an order.
    ///
    /// Runs as a single transaction: the order and its items are
    /// inserted, each product's stock is decremented through a guarded
    /// conditional update, and the cart is emptied. Any stock shortfall
    /// aborts before commit, so no partial order is ever visible. Line
    /// prices are frozen from the product rows read in the same
    /// transaction.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn process_checkout(
        &self,
        user: &user::Model,
        input: CheckoutInput,
    ) -> Result<OrderDetails, ServiceError> {
        let txn = self.db.begin().await?;

        let lines = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user.id))
            .find_also_related(Product)
            .all(&txn)
            .await?;

        if lines.is_empty() {
            return Err(ServiceError::ValidationError("Cart is empty".to_string()));
        }

        let shipping_address = input
            .shipping_address
            .filter(|a| !a.trim().is_empty())
            .or_else(|| user.address.clone().filter(|a| !a.trim().is_empty()))
            .ok_or_else(|| {
                ServiceError::ValidationError("Shipping address is required".to_string())
            })?;

        let payment_method = input
            .payment_method
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

        let mut resolved = Vec::with_capacity(lines.len());
        let mut total_amount = Decimal::ZERO;
        for (item, product) in lines {
            let product = product.ok_or_else(|| {
                ServiceError::InternalError("Cart row without product".to_string())
            })?;
            total_amount += product.price * Decimal::from(item.quantity);
            resolved.push((item, product));
        }

        let order_id = Uuid::new_v4();
        let order = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user.id),
            total_amount: Set(total_amount),
            status: Set(order::OrderStatus::Pending),
            shipping_address: Set(shipping_address),
            payment_method: Set(Some(payment_method)),
            created_at: Set(Utc::now()),
        };
        let order = order.insert(&txn).await?;

        for (item, product) in &resolved {
            // Guarded decrement: zero affected rows means another
            // checkout took the stock first, and the whole transaction
            // unwinds without committing.
            let decremented = Product::update_many()
                .col_expr(
                    product::Column::StockQuantity,
                    Expr::col(product::Column::StockQuantity).sub(item.quantity),
                )
                .filter(product::Column::Id.eq(product.id))
                .filter(product::Column::StockQuantity.gte(item.quantity))
                .exec(&txn)
                .await?;

            if decremented.rows_affected == 0 {
                return Err(ServiceError::InsufficientStock(format!(
                    "Insufficient stock for {}",
                    product.name
                )));
            }

            let order_item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                quantity: Set(item.quantity),
                price: Set(product.price),
            };
            order_item.insert(&txn).await?;
        }

        CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user.id))
            .exec(&txn)
            .await?;

        let details = self.load_order_details(&txn, order).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        info!("Order {} placed by user {}", order_id, user.id);
        Ok(details)
    }

    /// Lists the caller's orders, newest first, with items embedded.
    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderDetails>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            details.push(self.load_order_details(&*self.db, order).await?);
        }
        Ok(details)
    }

    /// Fetches one of the caller's orders. Another user's order id
    /// resolves to NotFound, never a permission error.
    pub async fn get_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderDetails, ServiceError> {
        let order = Order::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        self.load_order_details(&*self.db, order).await
    }

    async fn load_order_details<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: order::Model,
    ) -> Result<OrderDetails, ServiceError> {
        let rows = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .find_also_related(Product)
            .all(conn)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for (item, product) in rows {
            let product = product.ok_or_else(|| {
                ServiceError::InternalError("Order line without product".to_string())
            })?;
            items.push(OrderLine::new(item, product));
        }

        Ok(OrderDetails::new(order, items))
    }
}

/// The decorative fixed payment-method enumeration.
pub fn payment_methods() -> Vec<PaymentMethod> {
    vec![
        PaymentMethod::new("credit_card", "Credit Card", "credit-card"),
        PaymentMethod::new("debit_card", "Debit Card", "credit-card"),
        PaymentMethod::new("paypal", "PayPal", "paypal"),
        PaymentMethod::new("upi", "UPI", "mobile"),
        PaymentMethod::new("cod", "Cash on Delivery", "money-bill"),
    ]
}

#[derive(Debug, Serialize)]
pub struct PaymentMethod {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

impl PaymentMethod {
    fn new(id: &'static str, name: &'static str, icon: &'static str) -> Self {
        Self { id, name, icon }
    }
}

/// Checkout request parameters
#[derive(Debug, Default)]
pub struct CheckoutInput {
    pub shipping_address: Option<String>,
    pub payment_method: Option<String>,
}

/// One order line joined with its product; `price` and `subtotal` use
/// the frozen purchase-time price.
#[derive(Debug, Serialize)]
pub struct OrderLine {
    pub id: Uuid,
    pub product: ProductView,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

impl OrderLine {
    pub fn new(item: order_item::Model, product: product::Model) -> Self {
        let subtotal = item.price * Decimal::from(item.quantity);
        Self {
            id: item.id,
            product: ProductView::from(product),
            quantity: item.quantity,
            price: item.price,
            subtotal,
        }
    }
}

/// A full order with items embedded
#[derive(Debug, Serialize)]
pub struct OrderDetails {
    pub id: Uuid,
    pub total_amount: Decimal,
    pub status: order::OrderStatus,
    pub shipping_address: String,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLine>,
}

impl OrderDetails {
    pub fn new(order: order::Model, items: Vec<OrderLine>) -> Self {
        Self {
            id: order.id,
            total_amount: order.total_amount,
            status: order.status,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            created_at: order.created_at,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn payment_methods_are_fixed() {
        let methods = payment_methods();
        assert_eq!(methods.len(), 5);
        assert_eq!(methods[0].id, "credit_card");
        assert_eq!(methods[4].name, "Cash on Delivery");
    }

    #[test]
    fn order_line_subtotal_uses_frozen_price() {
        let product = product::Model {
            id: Uuid::new_v4(),
            name: "Laptop Pro 15".to_string(),
            description: None,
            price: dec!(1499.99), // current catalog price
            category: None,
            image_url: None,
            stock_quantity: 5,
            created_at: Utc::now(),
        };
        let item = order_item::Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: product.id,
            quantity: 2,
            price: dec!(1299.99), // price at purchase time
        };

        let line = OrderLine::new(item, product);
        assert_eq!(line.price, dec!(1299.99));
        assert_eq!(line.subtotal, dec!(2599.98));
    }

    #[test]
    fn order_status_serializes_lowercase() {
        let json = serde_json::to_string(&order::OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
