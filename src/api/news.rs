//! News API endpoints
//!
//! Handles HTTP requests for news posts:
//! - GET /api/v1/news - List published posts
//! - GET /api/v1/news/:slug - Get published post by slug
//! - GET /api/v1/admin/news - List posts of any status
//! - POST /api/v1/admin/news - Create post
//! - GET /api/v1/admin/news/:id - Get post by ID
//! - PUT /api/v1/admin/news/:id - Update post
//! - DELETE /api/v1/admin/news/:id - Delete post

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::common::{default_page, default_per_page};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{ContentStatus, CreateNewsInput, ListParams, UpdateNewsInput};
use crate::services::news::NewsServiceError;

/// Query parameters for listing news posts
#[derive(Debug, Deserialize)]
pub struct ListNewsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Filter by status (draft, published, archived); admin listing only
    pub status: Option<String>,
}

/// Response for news list
#[derive(Debug, Serialize)]
pub struct NewsListResponse {
    pub posts: Vec<NewsResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Response for a single news post
#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub author_id: i64,
    pub status: String,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::models::NewsPost> for NewsResponse {
    fn from(post: crate::models::NewsPost) -> Self {
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            summary: post.summary,
            body: post.body,
            cover_image: post.cover_image,
            author_id: post.author_id,
            status: post.status.to_string(),
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for creating a news post
#[derive(Debug, Deserialize)]
pub struct CreateNewsRequest {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    pub body: String,
    pub cover_image: Option<String>,
    pub status: Option<String>,
}

/// Request body for updating a news post
#[derive(Debug, Deserialize)]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub cover_image: Option<String>,
    pub status: Option<String>,
}

/// Build the public news router (read-only)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin news router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news))
        .route("/", post(create_news))
        .route("/{id}", get(get_news))
        .route("/{id}", put(update_news))
        .route("/{id}", delete(delete_news))
}

fn map_news_error(err: NewsServiceError) -> ApiError {
    match err {
        NewsServiceError::NotFound(msg) => ApiError::not_found(msg),
        NewsServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        NewsServiceError::DuplicateSlug(slug) => ApiError::with_details(
            "CONFLICT",
            format!("News slug already exists: {}", slug),
            serde_json::json!({"field": "slug", "value": slug}),
        ),
        NewsServiceError::InternalError(e) => ApiError::internal(e),
    }
}

fn parse_status(status: Option<&str>) -> Result<Option<ContentStatus>, ApiError> {
    status
        .map(|s| ContentStatus::from_str(s).map_err(|e| ApiError::validation_error(e.to_string())))
        .transpose()
}

/// GET /api/v1/news - List published posts, newest first
async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<ListNewsQuery>,
) -> Result<Json<NewsListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);

    let result = state
        .news_service
        .list_published(&params)
        .await
        .map_err(map_news_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/news/:slug - Get published post by slug
///
/// Drafts and archived posts return 404.
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<NewsResponse>, ApiError> {
    let post = state
        .news_service
        .get_published_by_slug(&slug)
        .await
        .map_err(map_news_error)?
        .ok_or_else(|| ApiError::not_found(format!("News post not found: {}", slug)))?;

    Ok(Json(post.into()))
}

/// GET /api/v1/admin/news - List posts of any status
///
/// Requires editor authentication.
async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<ListNewsQuery>,
) -> Result<Json<NewsListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let status = parse_status(query.status.as_deref())?;

    let result = state
        .news_service
        .list(status, &params)
        .await
        .map_err(map_news_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/admin/news/:id - Get post by ID, any status
///
/// Requires editor authentication.
async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NewsResponse>, ApiError> {
    let post = state
        .news_service
        .get_by_id(id)
        .await
        .map_err(map_news_error)?
        .ok_or_else(|| ApiError::not_found(format!("News post not found: {}", id)))?;

    Ok(Json(post.into()))
}

/// POST /api/v1/admin/news - Create post
///
/// Requires editor authentication. The caller becomes the author.
async fn create_news(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateNewsRequest>,
) -> Result<(StatusCode, Json<NewsResponse>), ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = CreateNewsInput {
        title: body.title,
        slug: body.slug,
        summary: body.summary,
        body: body.body,
        cover_image: body.cover_image,
        author_id: user.0.id,
        status,
    };

    let post = state
        .news_service
        .create(input)
        .await
        .map_err(map_news_error)?;

    Ok((StatusCode::CREATED, Json(post.into())))
}

/// PUT /api/v1/admin/news/:id - Update post
///
/// Requires editor authentication.
async fn update_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateNewsRequest>,
) -> Result<Json<NewsResponse>, ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = UpdateNewsInput {
        title: body.title,
        slug: body.slug,
        summary: body.summary,
        body: body.body,
        cover_image: body.cover_image,
        status,
    };

    let post = state
        .news_service
        .update(id, input)
        .await
        .map_err(map_news_error)?;

    Ok(Json(post.into()))
}

/// DELETE /api/v1/admin/news/:id - Delete post
///
/// Requires editor authentication. Comments on the post are deleted
/// with it.
async fn delete_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .news_service
        .delete(id)
        .await
        .map_err(map_news_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_list_response(result: crate::models::PagedResult<crate::models::NewsPost>) -> NewsListResponse {
    let total = result.total;
    let page = result.page;
    let per_page = result.per_page;
    let total_pages = result.total_pages();
    let posts: Vec<NewsResponse> = result.items.into_iter().map(Into::into).collect();

    NewsListResponse {
        posts,
        total,
        page,
        per_page,
        total_pages,
    }
}
