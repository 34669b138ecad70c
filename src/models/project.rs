//! Project model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ContentStatus;

/// A portfolio project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Project name
    pub name: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full description
    pub description: String,
    /// Client name (optional)
    pub client: Option<String>,
    /// Cover image URL (optional)
    pub cover_image: Option<String>,
    /// Start date (optional)
    pub started_on: Option<NaiveDate>,
    /// Completion date (optional)
    pub completed_on: Option<NaiveDate>,
    /// Publication status
    pub status: ContentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProjectInput {
    /// Project name
    pub name: String,
    /// URL-friendly slug (generated from the name when empty)
    pub slug: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full description
    pub description: String,
    /// Client name (optional)
    pub client: Option<String>,
    /// Cover image URL (optional)
    pub cover_image: Option<String>,
    /// Start date (optional)
    pub started_on: Option<NaiveDate>,
    /// Completion date (optional)
    pub completed_on: Option<NaiveDate>,
    /// Publication status (defaults to Draft)
    pub status: Option<ContentStatus>,
}

/// Input for updating a project
#[derive(Debug, Clone, Default)]
pub struct UpdateProjectInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New slug (optional)
    pub slug: Option<String>,
    /// New teaser (optional)
    pub summary: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
    /// New client name (optional)
    pub client: Option<String>,
    /// New cover image URL (optional)
    pub cover_image: Option<String>,
    /// New start date (optional)
    pub started_on: Option<NaiveDate>,
    /// New completion date (optional)
    pub completed_on: Option<NaiveDate>,
    /// New status (optional)
    pub status: Option<ContentStatus>,
}
