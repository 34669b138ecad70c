//! Product model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContentStatus;

/// A product in the company catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Product name
    pub name: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full description
    pub description: String,
    /// Image URL (optional)
    pub image: Option<String>,
    /// Price in minor currency units (optional, e.g. cents)
    pub price_cents: Option<i64>,
    /// Ordering weight for listings (lower first)
    pub sort_order: i32,
    /// Publication status
    pub status: ContentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    /// Product name
    pub name: String,
    /// URL-friendly slug (generated from the name when empty)
    pub slug: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full description
    pub description: String,
    /// Image URL (optional)
    pub image: Option<String>,
    /// Price in minor currency units (optional)
    pub price_cents: Option<i64>,
    /// Ordering weight (optional, defaults to 0)
    pub sort_order: Option<i32>,
    /// Publication status (defaults to Draft)
    pub status: Option<ContentStatus>,
}

/// Input for updating a product
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New slug (optional)
    pub slug: Option<String>,
    /// New teaser (optional)
    pub summary: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
    /// New image URL (optional)
    pub image: Option<String>,
    /// New price (optional)
    pub price_cents: Option<i64>,
    /// New ordering weight (optional)
    pub sort_order: Option<i32>,
    /// New status (optional)
    pub status: Option<ContentStatus>,
}
