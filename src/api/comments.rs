//! Comment API endpoints
//!
//! Handles HTTP requests for comments on news posts:
//! - GET /api/v1/news/:id/comments - Approved comments on a post
//! - POST /api/v1/news/:id/comments - Submit a comment
//! - GET /api/v1/admin/comments - Moderation queue listing
//! - PUT /api/v1/admin/comments/:id/status - Approve or reject
//! - DELETE /api/v1/admin/comments/:id - Delete a comment

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::auth::client_info;
use crate::api::common::{default_page, default_per_page};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CommentStatus, User};
use crate::services::comment::CommentServiceError;
use crate::services::SubmitCommentInput;

/// Query parameters for listing comments
#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Filter by status (pending, approved, rejected); moderation only
    pub status: Option<String>,
}

/// Request body for submitting a comment
#[derive(Debug, Deserialize)]
pub struct SubmitCommentRequest {
    pub body: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

/// Request body for a moderation decision
#[derive(Debug, Deserialize)]
pub struct ModerateCommentRequest {
    /// Target status: approved or rejected
    pub status: String,
}

/// Response for a single comment
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub news_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub body: String,
    pub status: String,
    pub created_at: String,
}

impl From<crate::models::Comment> for CommentResponse {
    fn from(comment: crate::models::Comment) -> Self {
        Self {
            id: comment.id,
            news_id: comment.news_id,
            user_id: comment.user_id,
            author_name: comment.author_name,
            body: comment.body,
            status: comment.status.to_string(),
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// Response for comment list
#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Caller identity when authentication is optional.
///
/// Reads the user injected by `optional_auth`; absent for guests.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> axum::extract::FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|u| u.0.clone()),
        ))
    }
}

/// Build the public comments router, nested under /news/:id/comments
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_comments))
        .route("/", post(submit_comment))
}

/// Build the moderation router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all_comments))
        .route("/{id}/status", put(moderate_comment))
        .route("/{id}", delete(delete_comment))
}

fn map_comment_error(err: CommentServiceError) -> ApiError {
    match err {
        CommentServiceError::NotFound(msg) => ApiError::not_found(msg),
        CommentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        CommentServiceError::InternalError(e) => ApiError::internal(e),
    }
}

/// GET /api/v1/news/:id/comments - Approved comments, oldest first
async fn list_comments(
    State(state): State<AppState>,
    Path(news_id): Path<i64>,
    Query(query): Query<ListCommentsQuery>,
) -> Result<Json<CommentListResponse>, ApiError> {
    let params = crate::models::ListParams::new(query.page, query.per_page);

    let result = state
        .comment_service
        .list_public(news_id, &params)
        .await
        .map_err(map_comment_error)?;

    Ok(Json(to_list_response(result)))
}

/// POST /api/v1/news/:id/comments - Submit a comment
///
/// Guests must supply a name and land in the moderation queue; comments
/// from signed-in users are published immediately.
async fn submit_comment(
    State(state): State<AppState>,
    Path(news_id): Path<i64>,
    maybe_user: MaybeUser,
    headers: HeaderMap,
    Json(body): Json<SubmitCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let client = client_info(&headers);

    let input = SubmitCommentInput {
        body: body.body,
        author_name: body.author_name,
        author_email: body.author_email,
    };

    let comment = state
        .comment_service
        .submit(news_id, input, maybe_user.0.as_ref(), client.ip_address)
        .await
        .map_err(map_comment_error)?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// GET /api/v1/admin/comments - List comments across posts
///
/// Requires editor authentication. Optional `?status=` filter; the
/// default shows every status, newest first.
async fn list_all_comments(
    State(state): State<AppState>,
    Query(query): Query<ListCommentsQuery>,
) -> Result<Json<CommentListResponse>, ApiError> {
    let params = crate::models::ListParams::new(query.page, query.per_page);
    let status = query
        .status
        .as_deref()
        .map(|s| CommentStatus::from_str(s).map_err(|e| ApiError::validation_error(e.to_string())))
        .transpose()?;

    let result = state
        .comment_service
        .list(status, &params)
        .await
        .map_err(map_comment_error)?;

    Ok(Json(to_list_response(result)))
}

/// PUT /api/v1/admin/comments/:id/status - Approve or reject a comment
///
/// Requires editor authentication.
async fn moderate_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ModerateCommentRequest>,
) -> Result<StatusCode, ApiError> {
    match CommentStatus::from_str(&body.status) {
        Ok(CommentStatus::Approved) => state.comment_service.approve(id).await,
        Ok(CommentStatus::Rejected) => state.comment_service.reject(id).await,
        _ => {
            return Err(ApiError::validation_error(
                "Moderation status must be 'approved' or 'rejected'",
            ))
        }
    }
    .map_err(map_comment_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/comments/:id - Delete a comment
///
/// Requires editor authentication.
async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .comment_service
        .delete(id)
        .await
        .map_err(map_comment_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_list_response(
    result: crate::models::PagedResult<crate::models::Comment>,
) -> CommentListResponse {
    let total = result.total;
    let page = result.page;
    let per_page = result.per_page;
    let total_pages = result.total_pages();
    let comments: Vec<CommentResponse> = result.items.into_iter().map(Into::into).collect();

    CommentListResponse {
        comments,
        total,
        page,
        per_page,
        total_pages,
    }
}
