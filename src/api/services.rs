//! Service-catalog API endpoints
//!
//! Handles HTTP requests for the services the company offers:
//! - GET /api/v1/services - List published services in display order
//! - GET /api/v1/services/:slug - Get published service by slug
//! - GET /api/v1/admin/services - List services of any status
//! - POST /api/v1/admin/services - Create service
//! - GET /api/v1/admin/services/:id - Get service by ID
//! - PUT /api/v1/admin/services/:id - Update service
//! - DELETE /api/v1/admin/services/:id - Delete service

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
use crate::models::{ContentStatus, CreateServiceItemInput, ListParams, UpdateServiceItemInput};
use crate::services::service_item::ServiceItemError;

/// Query parameters for listing services
#[derive(Debug, Deserialize)]
pub struct ListServicesQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Filter by status (draft, published, archived); admin listing only
    pub status: Option<String>,
}

/// Response for service list
#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub services: Vec<ServiceResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Response for a single service
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub summary: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub sort_order: i32,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::models::ServiceItem> for ServiceResponse {
    fn from(item: crate::models::ServiceItem) -> Self {
        Self {
            id: item.id,
            slug: item.slug,
            name: item.name,
            summary: item.summary,
            description: item.description,
            icon: item.icon,
            sort_order: item.sort_order,
            status: item.status.to_string(),
            created_at: item.created_at.to_rfc3339(),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for creating a service
#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub icon: Option<String>,
    pub sort_order: Option<i32>,
    pub status: Option<String>,
}

/// Request body for updating a service
#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub sort_order: Option<i32>,
    pub status: Option<String>,
}

/// Build the public services router (read-only)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin services router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services))
        .route("/", post(create_service))
        .route("/{id}", get(get_service))
        .route("/{id}", put(update_service))
        .route("/{id}", delete(delete_service))
}

fn map_service_error(err: ServiceItemError) -> ApiError {
    match err {
        ServiceItemError::NotFound(msg) => ApiError::not_found(msg),
        ServiceItemError::ValidationError(msg) => ApiError::validation_error(msg),
        ServiceItemError::DuplicateSlug(slug) => ApiError::with_details(
            "CONFLICT",
            format!("Service slug already exists: {}", slug),
            serde_json::json!({"field": "slug", "value": slug}),
        ),
        ServiceItemError::InternalError(e) => ApiError::internal(e),
    }
}

fn parse_status(status: Option<&str>) -> Result<Option<ContentStatus>, ApiError> {
    status
        .map(|s| ContentStatus::from_str(s).map_err(|e| ApiError::validation_error(e.to_string())))
        .transpose()
}

/// GET /api/v1/services - List published services by sort order
async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<ListServicesQuery>,
) -> Result<Json<ServiceListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);

    let result = state
        .service_item_service
        .list_published(&params)
        .await
        .map_err(map_service_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/services/:slug - Get published service by slug
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let item = state
        .service_item_service
        .get_published_by_slug(&slug)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::not_found(format!("Service not found: {}", slug)))?;

    Ok(Json(item.into()))
}

/// GET /api/v1/admin/services - List services of any status
///
/// Requires editor authentication.
async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ListServicesQuery>,
) -> Result<Json<ServiceListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let status = parse_status(query.status.as_deref())?;

    let result = state
        .service_item_service
        .list(status, &params)
        .await
        .map_err(map_service_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/admin/services/:id - Get service by ID, any status
///
/// Requires editor authentication.
async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let item = state
        .service_item_service
        .get_by_id(id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::not_found(format!("Service not found: {}", id)))?;

    Ok(Json(item.into()))
}

/// POST /api/v1/admin/services - Create service
///
/// Requires editor authentication.
async fn create_service(
    State(state): State<AppState>,
    Json(body): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = CreateServiceItemInput {
        name: body.name,
        slug: body.slug,
        summary: body.summary,
        description: body.description,
        icon: body.icon,
        sort_order: body.sort_order,
        status,
    };

    let item = state
        .service_item_service
        .create(input)
        .await
        .map_err(map_service_error)?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// PUT /api/v1/admin/services/:id - Update service
///
/// Requires editor authentication.
async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateServiceRequest>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = UpdateServiceItemInput {
        name: body.name,
        slug: body.slug,
        summary: body.summary,
        description: body.description,
        icon: body.icon,
        sort_order: body.sort_order,
        status,
    };

    let item = state
        .service_item_service
        .update(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(Json(item.into()))
}

/// DELETE /api/v1/admin/services/:id - Delete service
///
/// Requires editor authentication.
async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service_item_service
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_list_response(
    result: crate::models::PagedResult<crate::models::ServiceItem>,
) -> ServiceListResponse {
    let total = result.total;
    let page = result.page;
    let per_page = result.per_page;
    let total_pages = result.total_pages();
    let services: Vec<ServiceResponse> = result.items.into_iter().map(Into::into).collect();

    ServiceListResponse {
        services,
        total,
        page,
        per_page,
        total_pages,
    }
}
