//! Project API endpoints
//!
//! Handles HTTP requests for the project portfolio:
//! - GET /api/v1/projects - List published projects
//! - GET /api/v1/projects/:slug - Get published project by slug
//! - GET /api/v1/admin/projects - List projects of any status
//! - POST /api/v1/admin/projects - Create project
//! - GET /api/v1/admin/projects/:id - Get project by ID
//! - PUT /api/v1/admin/projects/:id - Update project
//! - DELETE /api/v1/admin/projects/:id - Delete project

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::common::{default_page, default_per_page};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{ContentStatus, CreateProjectInput, ListParams, UpdateProjectInput};
use crate::services::project::ProjectServiceError;

/// Query parameters for listing projects
#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Filter by status (draft, published, archived); admin listing only
    pub status: Option<String>,
}

/// Response for project list
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Response for a single project
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub summary: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub started_on: Option<NaiveDate>,
    pub completed_on: Option<NaiveDate>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::models::Project> for ProjectResponse {
    fn from(project: crate::models::Project) -> Self {
        Self {
            id: project.id,
            slug: project.slug,
            name: project.name,
            summary: project.summary,
            description: project.description,
            client: project.client,
            cover_image: project.cover_image,
            started_on: project.started_on,
            completed_on: project.completed_on,
            status: project.status.to_string(),
            created_at: project.created_at.to_rfc3339(),
            updated_at: project.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for creating a project
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub client: Option<String>,
    pub cover_image: Option<String>,
    pub started_on: Option<NaiveDate>,
    pub completed_on: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Request body for updating a project
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub client: Option<String>,
    pub cover_image: Option<String>,
    pub started_on: Option<NaiveDate>,
    pub completed_on: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Build the public projects router (read-only)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_published))
        .route("/{slug}", get(get_published))
}

/// Build the admin projects router
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects))
        .route("/", post(create_project))
        .route("/{id}", get(get_project))
        .route("/{id}", put(update_project))
        .route("/{id}", delete(delete_project))
}

fn map_project_error(err: ProjectServiceError) -> ApiError {
    match err {
        ProjectServiceError::NotFound(msg) => ApiError::not_found(msg),
        ProjectServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ProjectServiceError::DuplicateSlug(slug) => ApiError::with_details(
            "CONFLICT",
            format!("Project slug already exists: {}", slug),
            serde_json::json!({"field": "slug", "value": slug}),
        ),
        ProjectServiceError::InternalError(e) => ApiError::internal(e),
    }
}

fn parse_status(status: Option<&str>) -> Result<Option<ContentStatus>, ApiError> {
    status
        .map(|s| ContentStatus::from_str(s).map_err(|e| ApiError::validation_error(e.to_string())))
        .transpose()
}

/// GET /api/v1/projects - List published projects
async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<ProjectListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);

    let result = state
        .project_service
        .list_published(&params)
        .await
        .map_err(map_project_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/projects/:slug - Get published project by slug
async fn get_published(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .project_service
        .get_published_by_slug(&slug)
        .await
        .map_err(map_project_error)?
        .ok_or_else(|| ApiError::not_found(format!("Project not found: {}", slug)))?;

    Ok(Json(project.into()))
}

/// GET /api/v1/admin/projects - List projects of any status
///
/// Requires editor authentication.
async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<ProjectListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let status = parse_status(query.status.as_deref())?;

    let result = state
        .project_service
        .list(status, &params)
        .await
        .map_err(map_project_error)?;

    Ok(Json(to_list_response(result)))
}

/// GET /api/v1/admin/projects/:id - Get project by ID, any status
///
/// Requires editor authentication.
async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .project_service
        .get_by_id(id)
        .await
        .map_err(map_project_error)?
        .ok_or_else(|| ApiError::not_found(format!("Project not found: {}", id)))?;

    Ok(Json(project.into()))
}

/// POST /api/v1/admin/projects - Create project
///
/// Requires editor authentication.
async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = CreateProjectInput {
        name: body.name,
        slug: body.slug,
        summary: body.summary,
        description: body.description,
        client: body.client,
        cover_image: body.cover_image,
        started_on: body.started_on,
        completed_on: body.completed_on,
        status,
    };

    let project = state
        .project_service
        .create(input)
        .await
        .map_err(map_project_error)?;

    Ok((StatusCode::CREATED, Json(project.into())))
}

/// PUT /api/v1/admin/projects/:id - Update project
///
/// Requires editor authentication.
async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = UpdateProjectInput {
        name: body.name,
        slug: body.slug,
        summary: body.summary,
        description: body.description,
        client: body.client,
        cover_image: body.cover_image,
        started_on: body.started_on,
        completed_on: body.completed_on,
        status,
    };

    let project = state
        .project_service
        .update(id, input)
        .await
        .map_err(map_project_error)?;

    Ok(Json(project.into()))
}

/// DELETE /api/v1/admin/projects/:id - Delete project
///
/// Requires editor authentication.
async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .project_service
        .delete(id)
        .await
        .map_err(map_project_error)?;

    Ok(StatusCode::NO_CONTENT)
}

fn to_list_response(
    result: crate::models::PagedResult<crate::models::Project>,
) -> ProjectListResponse {
    let total = result.total;
    let page = result.page;
    let per_page = result.per_page;
    let total_pages = result.total_pages();
    let projects: Vec<ProjectResponse> = result.items.into_iter().map(Into::into).collect();

    ProjectListResponse {
        projects,
        total,
        page,
        per_page,
        total_pages,
    }
}
