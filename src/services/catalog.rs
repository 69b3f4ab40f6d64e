use crate::{
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const DEFAULT_CATEGORY: &str = "General";
const DEFAULT_IMAGE_URL: &str = "/static/images/default-product.jpg";

/// Catalog service: filtered product search, categories, and product
/// creation.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_per_page: u64,
    max_per_page: u64,
}

impl CatalogService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        default_per_page: u64,
        max_per_page: u64,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_per_page,
            max_per_page,
        }
    }

    /// Searches the catalog. Filters compose with AND; the search term
    /// is a case-insensitive substring match over name or description;
    /// price bounds are inclusive. Pagination is 1-indexed and an
    /// out-of-range page yields an empty list with accurate totals.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: ProductQuery) -> Result<ProductPage, ServiceError> {
        let mut db_query = Product::find();

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            db_query = db_query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(product::Column::Description)))
                            .like(pattern),
                    ),
            );
        }

        if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
            db_query = db_query.filter(product::Column::Category.eq(category));
        }

        if let Some(min_price) = query.min_price {
            db_query = db_query.filter(product::Column::Price.gte(min_price));
        }

        if let Some(max_price) = query.max_price {
            db_query = db_query.filter(product::Column::Price.lte(max_price));
        }

        let page = query.page.max(1);
        let per_page = query
            .per_page
            .unwrap_or(self.default_per_page)
            .clamp(1, self.max_per_page);

        let paginator = db_query
            .order_by_asc(product::Column::Name)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let pages = total.div_ceil(per_page);
        let products = paginator.fetch_page(page - 1).await?;

        Ok(ProductPage {
            products,
            total,
            pages,
            page,
        })
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    /// Returns the distinct non-empty category names in the catalog.
    pub async fn list_categories(&self) -> Result<Vec<String>, ServiceError> {
        let categories: Vec<Option<String>> = Product::find()
            .select_only()
            .column(product::Column::Category)
            .distinct()
            .into_tuple()
            .all(&*self.db)
            .await?;

        Ok(categories
            .into_iter()
            .flatten()
            .filter(|c| !c.is_empty())
            .collect())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must not be negative".to_string(),
            ));
        }

        let product_id = Uuid::new_v4();
        let product = product::ActiveModel {
            id: Set(product_id),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            category: Set(Some(
                input
                    .category
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            )),
            image_url: Set(Some(
                input
                    .image_url
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            )),
            stock_quantity: Set(input.stock_quantity.unwrap_or(0).max(0)),
            created_at: Set(Utc::now()),
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!("Created product: {}", product_id);
        Ok(product)
    }
}

/// Catalog search parameters
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub page: u64,
    pub per_page: Option<u64>,
}

/// One page of catalog results
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<product::Model>,
    pub total: u64,
    pub pages: u64,
    pub page: u64,
}

/// Input for product creation
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock_quantity: Option<i32>,
}

/// Serialized product shape, including the derived `in_stock` flag
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub in_stock: bool,
}

impl From<product::Model> for ProductView {
    fn from(product: product::Model) -> Self {
        Self {
            in_stock: product.stock_quantity > 0,
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            image_url: product.image_url,
            stock_quantity: product.stock_quantity,
        }
    }
}
