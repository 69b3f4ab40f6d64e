use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::{
    auth::CurrentUser,
    errors::ApiError,
    services::catalog::{CreateProductInput, ProductQuery, ProductView},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Creates the router for catalog endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product))
        .route("/categories", get(list_categories))
        .route("/create", post(create_product))
}

/// List products with optional filtering, search, and pagination
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListQuery>,
) -> Result<Response, ApiError> {
    let page = state
        .services
        .catalog
        .search_products(ProductQuery {
            search: params.search,
            category: params.category,
            min_price: params.min_price,
            max_price: params.max_price,
            page: params.page,
            per_page: params.per_page,
        })
        .await
        .map_err(map_service_error)?;

    let products: Vec<ProductView> = page.products.into_iter().map(ProductView::from).collect();

    Ok(success_response(json!({
        "products": products,
        "total": page.total,
        "pages": page.pages,
        "current_page": page.page,
    })))
}

/// Get a single product by id
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let product = state
        .services
        .catalog
        .get_product(product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "product": ProductView::from(product),
    })))
}

/// List the distinct non-empty categories
async fn list_categories(State(state): State<AppState>) -> Result<Response, ApiError> {
    let categories = state
        .services
        .catalog
        .list_categories()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({
        "categories": categories,
    })))
}

/// Create a product. Requires only an authenticated caller; there is no
/// admin gate on this surface.
async fn create_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Response, ApiError> {
    let name = payload
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::ValidationError("name is required".to_string()))?;
    let price = payload
        .price
        .ok_or_else(|| ApiError::ValidationError("price is required".to_string()))?;

    let product = state
        .services
        .catalog
        .create_product(CreateProductInput {
            name,
            price,
            description: payload.description,
            category: payload.category,
            image_url: payload.image_url,
            stock_quantity: payload.stock_quantity,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(json!({
        "message": "Product created successfully",
        "product": ProductView::from(product),
    })))
}

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
}

fn default_page() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock_quantity: Option<i32>,
}
