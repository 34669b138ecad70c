//! Event API endpoints
//!
//! Handles HTTP requests for company events:
//! - GET /api/v1/events - List published events (optionally upcoming only)
//! - GET /api/v1/events/:slug - Get published event by slug
//! - GET /api/v1/admin/events - List events of any status
//! - POST /api/v1/admin/events - Create event
//! - GET /api/v1/admin/events/:id - Get event by ID
//! - PUT /api/v1/admin/events/:id - Update event
//! - DELETE /api/v1/admin/events/:id - Delete event

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::common::{default_page, default_per_page};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{ContentStatus, CreateEventInput, ListParams, UpdateEventInput};
use crate::services::event::EventServiceError;

/// Query parameters for listing events
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Restrict the public listing to events that have not started yet
    #[serde(default)]
    pub upcoming: bool,
    /// Filter by status (draft, published, archived); admin listing only
    pub status: Option<String>,
}

/// Response for event list
#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Response for a single event
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub starts_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::models::Event> for EventResponse {
    fn from(event: crate::models::Event) -> Self {
        Self {
            id: event.id,
            slug: event.slug,
            title: event.title,
            summary: event.summary,
            description: event.description,
            location: event.location,
            starts_at: event.starts_at.to_rfc3339(),
            ends_at: event.ends_at.map(|dt| dt.to_rfc3339()),
            status: event.status.to_string(),
            created_at: event.created_at.to_rfc3339(),
            updated_at: event.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for creating an event
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

/// Request body for updating an event
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

/// Build the public events router (read-only)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin events router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events))
        .route("/", post(create_event))
        .route("/{id}", get(get_event))
        .route("/{id}", put(update_event))
        .route("/{id}", delete(delete_event))
}

fn map_event_error(err: EventServiceError) -> ApiError {
    match err {
        EventServiceError::NotFound(msg) => ApiError::not_found(msg),
        EventServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        EventServiceError::DuplicateSlug(slug) => ApiError::with_details(
            "CONFLICT",
            format!("Event slug already exists: {}", slug),
            serde_json::json!({"field": "slug", "value": slug}),
        ),
        EventServiceError::InternalError(e) => ApiError::internal(e),
    }
}

fn parse_status(status: Option<&str>) -> Result<Option<ContentStatus>, ApiError> {
    status
        .map(|s| ContentStatus::from_str(s).map_err(|e| ApiError::validation_error(e.to_string())))
        .transpose()
}

/// GET /api/v1/events - List published events
///
/// Latest start first; `?upcoming=true` restricts to events that have
/// not started yet, soonest first.
async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<EventListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);

    let result = if query.upcoming {
        state.event_service.list_upcoming(&params).await
    } else {
        state.event_service.list_published(&params).await
    }
    .map_err(map_event_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/events/:slug - Get published event by slug
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state
        .event_service
        .get_published_by_slug(&slug)
        .await
        .map_err(map_event_error)?
        .ok_or_else(|| ApiError::not_found(format!("Event not found: {}", slug)))?;

    Ok(Json(event.into()))
}

/// GET /api/v1/admin/events - List events of any status
///
/// Requires editor authentication.
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<EventListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let status = parse_status(query.status.as_deref())?;

    let result = state
        .event_service
        .list(status, &params)
        .await
        .map_err(map_event_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/admin/events/:id - Get event by ID, any status
///
/// Requires editor authentication.
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state
        .event_service
        .get_by_id(id)
        .await
        .map_err(map_event_error)?
        .ok_or_else(|| ApiError::not_found(format!("Event not found: {}", id)))?;

    Ok(Json(event.into()))
}

/// POST /api/v1/admin/events - Create event
///
/// Requires editor authentication.
async fn create_event(
    State(state): State<AppState>,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = CreateEventInput {
        title: body.title,
        slug: body.slug,
        summary: body.summary,
        description: body.description,
        location: body.location,
        starts_at: body.starts_at,
        ends_at: body.ends_at,
        status,
    };

    let event = state
        .event_service
        .create(input)
        .await
        .map_err(map_event_error)?;

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// PUT /api/v1/admin/events/:id - Update event
///
/// Requires editor authentication.
async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = UpdateEventInput {
        title: body.title,
        slug: body.slug,
        summary: body.summary,
        description: body.description,
        location: body.location,
        starts_at: body.starts_at,
        ends_at: body.ends_at,
        status,
    };

    let event = state
        .event_service
        .update(id, input)
        .await
        .map_err(map_event_error)?;

    Ok(Json(event.into()))
}

/// DELETE /api/v1/admin/events/:id - Delete event
///
/// Requires editor authentication.
async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .event_service
        .delete(id)
        .await
        .map_err(map_event_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_list_response(result: crate::models::PagedResult<crate::models::Event>) -> EventListResponse {
    let total = result.total;
    let page = result.page;
    let per_page = result.per_page;
    let total_pages = result.total_pages();
    let events: Vec<EventResponse> = result.items.into_iter().map(Into::into).collect();

    EventListResponse {
        events,
        total,
        page,
        per_page,
        total_pages,
    }
}
