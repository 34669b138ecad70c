//! Service offering model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContentStatus;

/// A service the company offers.
///
/// Named `ServiceItem` to avoid clashing with the `services` code layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceItem {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Service name
    pub name: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full description
    pub description: String,
    /// Icon identifier for the frontend (optional)
    pub icon: Option<String>,
    /// Ordering weight for listings (lower first)
    pub sort_order: i32,
    /// Publication status
    pub status: ContentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a service
#[derive(Debug, Clone)]
pub struct CreateServiceItemInput {
    /// Service name
    pub name: String,
    /// URL-friendly slug (generated from the name when empty)
    pub slug: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full description
    pub description: String,
    /// Icon identifier (optional)
    pub icon: Option<String>,
    /// Ordering weight (optional, defaults to 0)
    pub sort_order: Option<i32>,
    /// Publication status (defaults to Draft)
    pub status: Option<ContentStatus>,
}

/// Input for updating a service
#[derive(Debug, Clone, Default)]
pub struct UpdateServiceItemInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New slug (optional)
    pub slug: Option<String>,
    /// New teaser (optional)
    pub summary: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
    /// New icon identifier (optional)
    pub icon: Option<String>,
    /// New ordering weight (optional)
    pub sort_order: Option<i32>,
    /// New status (optional)
    pub status: Option<ContentStatus>,
}
