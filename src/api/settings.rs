//! Settings API endpoints
//!
//! Handles HTTP requests for site settings:
//! - GET /api/v1/settings - Whitelisted public settings
//! - GET /api/v1/admin/settings - All settings
//! - PUT /api/v1/admin/settings - Bulk upsert
//! - POST /api/v1/admin/settings/test-email - Verify SMTP delivery

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashMap;

use crate::api::middleware::{ApiError, AppState};
use crate::services::settings::SettingsServiceError;

/// Request body for sending a test email
#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub email: String,
}

/// Build the public settings router
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(get_public_settings))
}

/// Build the admin settings router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_settings))
        .route("/", put(update_settings))
        .route("/test-email", post(send_test_email))
}

fn map_settings_error(err: SettingsServiceError) -> ApiError {
    match err {
        SettingsServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        SettingsServiceError::InternalError(e) => ApiError::internal(e),
    }
}

/// GET /api/v1/settings - Whitelisted public settings
async fn get_public_settings(
    State(state): State<AppState>,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    let settings = state
        .settings_service
        .get_public()
        .await
        .map_err(map_settings_error)?;

    Ok(Json(settings))
}

/// GET /api/v1/admin/settings - All settings
///
/// Requires admin authentication. SMTP credentials are included here,
/// so this route must never be opened below admin.
async fn get_all_settings(
    State(state): State<AppState>,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    let settings = state
        .settings_service
        .get_all()
        .await
        .map_err(map_settings_error)?;

    Ok(Json(settings))
}

/// PUT /api/v1/admin/settings - Bulk upsert of key/value pairs
///
/// Requires admin authentication.
async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<HashMap<String, String>>,
) -> Result<StatusCode, ApiError> {
    state
        .settings_service
        .update(&body)
        .await
        .map_err(map_settings_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/settings/test-email - Send a test message
///
/// Requires admin authentication. Lets admins verify SMTP settings
/// before relying on password-reset delivery.
async fn send_test_email(
    State(state): State<AppState>,
    Json(body): Json<TestEmailRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.email.trim().is_empty() {
        return Err(ApiError::validation_error("Email address is required"));
    }

    if !state.email_service.is_configured().await {
        return Err(ApiError::validation_error(
            "SMTP is not configured; set the smtp_* settings first",
        ));
    }

    state
        .email_service
        .send_test_email(&body.email)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(serde_json::json!({
        "message": format!("Test email sent to {}", body.email)
    })))
}
