//! User management API endpoints (admin only)
//!
//! Handles HTTP requests for account management:
//! - GET /api/v1/users - List users with pagination
//! - POST /api/v1/users - Create user
//! - GET /api/v1/users/:id - Get user
//! - PUT /api/v1/users/:id - Update user
//! - DELETE /api/v1/users/:id - Delete user

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::auth::UserResponse;
use crate::api::common::PaginationQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{UserRole, UserStatus};
use crate::services::user::{CreateUserInput, UpdateUserInput, UserServiceError};

/// Request body for creating a user
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Request body for updating a user
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub password: Option<String>,
}

/// Response for user list
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Build the users router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/", post(create_user))
        .route("/{id}", get(get_user))
        .route("/{id}", put(update_user))
        .route("/{id}", delete(delete_user))
}

fn map_user_error(err: UserServiceError) -> ApiError {
    match err {
        UserServiceError::NotFound(msg) => ApiError::not_found(msg),
        UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        UserServiceError::UserExists(msg) => ApiError::conflict(msg),
        UserServiceError::InternalError(e) => ApiError::internal(e),
    }
}

/// GET /api/v1/users - List users with pagination
///
/// Requires admin authentication.
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let params = query.params();

    let result = state
        .user_service
        .list(&params)
        .await
        .map_err(map_user_error)?;

    let total = result.total;
    let page = result.page;
    let per_page = result.per_page;
    let total_pages = result.total_pages();
    let users: Vec<UserResponse> = result.items.into_iter().map(Into::into).collect();

    Ok(Json(UserListResponse {
        users,
        total,
        page,
        per_page,
        total_pages,
    }))
}

/// POST /api/v1/users - Create user
///
/// Requires admin authentication.
async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let role = match body.role.as_deref() {
        Some(s) => Some(
            UserRole::from_str(s).map_err(|e| ApiError::validation_error(e.to_string()))?,
        ),
        None => None,
    };

    let input = CreateUserInput {
        username: body.username,
        email: body.email,
        password: body.password,
        role,
    };

    let user = state
        .user_service
        .create(input)
        .await
        .map_err(map_user_error)?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/:id - Get user
///
/// Requires admin authentication.
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .get_by_id(id)
        .await
        .map_err(map_user_error)?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", id)))?;

    Ok(Json(user.into()))
}

/// PUT /api/v1/users/:id - Update user
///
/// Requires admin authentication. Demoting or disabling the last
/// administrator is refused.
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let role = match body.role.as_deref() {
        Some(s) => Some(
            UserRole::from_str(s).map_err(|e| ApiError::validation_error(e.to_string()))?,
        ),
        None => None,
    };
    let status = match body.status.as_deref() {
        Some(s) => Some(
            UserStatus::from_str(s).map_err(|e| ApiError::validation_error(e.to_string()))?,
        ),
        None => None,
    };

    let input = UpdateUserInput {
        email: body.email,
        role,
        status,
        password: body.password,
    };

    let user = state
        .user_service
        .update(id, input)
        .await
        .map_err(map_user_error)?;

    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/:id - Delete user
///
/// Requires admin authentication. Deleting the own account, the last
/// administrator, or an account that still owns news posts is refused.
async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .user_service
        .delete(id, &user.0)
        .await
        .map_err(map_user_error)?;

    Ok(StatusCode::NO_CONTENT)
}
