//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the Vitrine backend:
//! - Auth endpoints (login, refresh, logout, password reset)
//! - User administration endpoints
//! - Content endpoints (news, products, projects, services, events)
//! - Comment submission and moderation endpoints
//! - Settings endpoints
//!
//! Routes nest under `/api/v1`. Public content routes serve published
//! rows only; `/admin/...` routes require an editor, users and settings
//! administration require an admin.

pub mod auth;
pub mod comments;
pub mod common;
pub mod events;
pub mod middleware;
pub mod news;
pub mod products;
pub mod projects;
pub mod services;
pub mod settings;
pub mod users;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/users", users::router())
        .nest("/admin/settings", settings::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Editor routes (need editor or admin role)
    let editor_routes = Router::new()
        .nest("/admin/news", news::admin_router())
        .nest("/admin/products", products::admin_router())
        .nest("/admin/projects", projects::admin_router())
        .nest("/admin/services", services::admin_router())
        .nest("/admin/events", events::admin_router())
        .nest("/admin/comments", comments::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_editor))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but no specific role)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Comment submission distinguishes guests from signed-in users
    let comment_routes = comments::public_router().route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::optional_auth),
    );

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/news", news::public_router())
        // the {slug} segment carries the numeric news ID here; the name
        // must match the sibling /news/{slug} route
        .nest("/news/{slug}/comments", comment_routes)
        .nest("/products", products::public_router())
        .nest("/projects", projects::public_router())
        .nest("/services", services::public_router())
        .nest("/events", events::public_router())
        .nest("/settings", settings::public_router())
        .merge(admin_routes)
        .merge(editor_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) if cors_origin != "*" => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        _ => CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    };

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .route("/health", get(health))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Service and database liveness
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match state.pool.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Health check database ping failed: {}", e);
            "unreachable"
        }
    };

    Json(serde_json::json!({
        "status": "ok",
        "database": database,
    }))
}
