//! Product API endpoints
//!
//! Handles HTTP requests for the product catalogue:
//! - GET /api/v1/products - List published products
//! - GET /api/v1/products/:slug - Get published product by slug
//! - GET /api/v1/admin/products - List products of any status
//! - POST /api/v1/admin/products - Create product
//! - GET /api/v1/admin/products/:id - Get product by ID
//! - PUT /api/v1/admin/products/:id - Update product
//! - DELETE /api/v1/admin/products/:id - Delete product

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::common::{default_page, default_per_page};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{ContentStatus, CreateProductInput, ListParams, UpdateProductInput};
use crate::services::product::ProductServiceError;

/// Query parameters for listing products
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Filter by status (draft, published, archived); admin listing only
    pub status: Option<String>,
}

/// Response for product list
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Response for a single product
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub summary: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    pub sort_order: i32,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::models::Product> for ProductResponse {
    fn from(product: crate::models::Product) -> Self {
        Self {
            id: product.id,
            slug: product.slug,
            name: product.name,
            summary: product.summary,
            description: product.description,
            image: product.image,
            price_cents: product.price_cents,
            sort_order: product.sort_order,
            status: product.status.to_string(),
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
    pub price_cents: Option<i64>,
    pub sort_order: Option<i32>,
    pub status: Option<String>,
}

/// Request body for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price_cents: Option<i64>,
    pub sort_order: Option<i32>,
    pub status: Option<String>,
}

/// Build the public products router (read-only)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin products router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/{id}", get(get_product))
        .route("/{id}", put(update_product))
        .route("/{id}", delete(delete_product))
}

fn map_product_error(err: ProductServiceError) -> ApiError {
    match err {
        ProductServiceError::NotFound(msg) => ApiError::not_found(msg),
        ProductServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ProductServiceError::DuplicateSlug(slug) => ApiError::with_details(
            "CONFLICT",
            format!("Product slug already exists: {}", slug),
            serde_json::json!({"field": "slug", "value": slug}),
        ),
        ProductServiceError::InternalError(e) => ApiError::internal(e),
    }
}

fn parse_status(status: Option<&str>) -> Result<Option<ContentStatus>, ApiError> {
    status
        .map(|s| ContentStatus::from_str(s).map_err(|e| ApiError::validation_error(e.to_string())))
        .transpose()
}

/// GET /api/v1/products - List published products by sort order
async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);

    let result = state
        .product_service
        .list_published(&params)
        .await
        .map_err(map_product_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/products/:slug - Get published product by slug
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .product_service
        .get_published_by_slug(&slug)
        .await
        .map_err(map_product_error)?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", slug)))?;

    Ok(Json(product.into()))
}

/// GET /api/v1/admin/products - List products of any status
///
/// Requires editor authentication.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let status = parse_status(query.status.as_deref())?;

    let result = state
        .product_service
        .list(status, &params)
        .await
        .map_err(map_product_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/admin/products/:id - Get product by ID, any status
///
/// Requires editor authentication.
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .product_service
        .get_by_id(id)
        .await
        .map_err(map_product_error)?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", id)))?;

    Ok(Json(product.into()))
}

/// POST /api/v1/admin/products - Create product
///
/// Requires editor authentication.
async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = CreateProductInput {
        name: body.name,
        slug: body.slug,
        summary: body.summary,
        description: body.description,
        image: body.image,
        price_cents: body.price_cents,
        sort_order: body.sort_order,
        status,
    };

    let product = state
        .product_service
        .create(input)
        .await
        .map_err(map_product_error)?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /api/v1/admin/products/:id - Update product
///
/// Requires editor authentication.
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = UpdateProductInput {
        name: body.name,
        slug: body.slug,
        summary: body.summary,
        description: body.description,
        image: body.image,
        price_cents: body.price_cents,
        sort_order: body.sort_order,
        status,
    };

    let product = state
        .product_service
        .update(id, input)
        .await
        .map_err(map_product_error)?;

    Ok(Json(product.into()))
}

/// DELETE /api/v1/admin/products/:id - Delete product
///
/// Requires editor authentication.
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .product_service
        .delete(id)
        .await
        .map_err(map_product_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_list_response(
    result: crate::models::PagedResult<crate::models::Product>,
) -> ProductListResponse {
    let total = result.total;
    let page = result.page;
    let per_page = result.per_page;
    let total_pages = result.total_pages();
    let products: Vec<ProductResponse> = result.items.into_iter().map(Into::into).collect();

    ProductListResponse {
        products,
        total,
        page,
        per_page,
        total_pages,
    }
}
