//! Authentication API endpoints
//!
//! Handles HTTP requests for authentication:
//! - POST /api/v1/auth/login - Credential login
//! - POST /api/v1/auth/refresh-token - Rotate a refresh token
//! - POST /api/v1/auth/logout - Revoke one session
//! - POST /api/v1/auth/logout-all - Revoke all sessions
//! - POST /api/v1/auth/forgot-password - Start password reset
//! - POST /api/v1/auth/reset-password - Complete password reset
//! - POST /api/v1/auth/change-password - Change own password
//! - GET /api/v1/auth/me - Get current user

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{map_auth_error, ApiError, AppState, AuthenticatedUser};
use crate::services::auth::{ClientInfo, LoginInput};

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Request body carrying a refresh token
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Request body for starting a password reset
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for completing a password reset
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Request body for changing the own password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Response for user info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            status: user.status.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
        .route("/change-password", post(change_password))
        .route("/me", get(get_current_user))
}

/// POST /api/v1/auth/login - Credential login
///
/// Issues an access/refresh token pair. Failures are rate limited per
/// username and per client IP; bad credentials produce a generic 401.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let client = client_info(&headers);
    let input = LoginInput {
        username_or_email: body.username_or_email,
        password: body.password,
    };

    let (user, tokens) = state
        .auth_service
        .login(input, &client)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(AuthResponse {
        user: user.into(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    }))
}

/// POST /api/v1/auth/refresh-token - Rotate a refresh token
///
/// The presented token is revoked and a fresh pair is issued. A token
/// that was already revoked triggers reuse detection: every session of
/// the user is revoked and the request fails with 401.
async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let client = client_info(&headers);

    let (user, tokens) = state
        .auth_service
        .refresh(&body.refresh_token, &client)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(AuthResponse {
        user: user.into(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    }))
}

/// POST /api/v1/auth/logout - Revoke one session
///
/// Requires authentication. The refresh token must belong to the caller.
async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<StatusCode, ApiError> {
    let client = client_info(&headers);

    state
        .auth_service
        .logout(&user.0, &body.refresh_token, &client)
        .await
        .map_err(map_auth_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Response for logout-all
#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub revoked_sessions: u64,
}

/// POST /api/v1/auth/logout-all - Revoke all sessions of the caller
///
/// Requires authentication.
async fn logout_all(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<Json<LogoutAllResponse>, ApiError> {
    let client = client_info(&headers);

    let revoked_sessions = state
        .auth_service
        .logout_all(&user.0, &client)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(LogoutAllResponse { revoked_sessions }))
}

/// POST /api/v1/auth/forgot-password - Start password reset
///
/// Always returns 200 so the response does not reveal whether the
/// address belongs to an account.
async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let client = client_info(&headers);

    state
        .auth_service
        .forgot_password(&body.email, &client)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(serde_json::json!({
        "message": "If the address belongs to an account, a reset email has been sent"
    })))
}

/// POST /api/v1/auth/reset-password - Complete password reset
///
/// Consumes the single-use token and revokes all sessions of the user.
async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let client = client_info(&headers);

    state
        .auth_service
        .reset_password(&body.token, &body.new_password, &client)
        .await
        .map_err(map_auth_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/change-password - Change own password
///
/// Requires authentication. Revokes all sessions of the caller.
async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let client = client_info(&headers);

    state
        .auth_service
        .change_password(&user.0, &body.current_password, &body.new_password, &client)
        .await
        .map_err(map_auth_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me - Get current user
///
/// Requires authentication.
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}

/// Build client metadata from request headers
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    ClientInfo {
        ip_address: extract_ip_address(headers),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(String::from),
    }
}

/// Extract IP address from request headers
/// Checks X-Forwarded-For first, then X-Real-IP
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return Some(ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}
