//! News post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContentStatus;

/// A news post on the company site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsPost {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Headline
    pub title: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full article body
    pub body: String,
    /// Cover image URL (optional)
    pub cover_image: Option<String>,
    /// Author user ID
    pub author_id: i64,
    /// Publication status
    pub status: ContentStatus,
    /// When the post was first published
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl NewsPost {
    /// Check if the post is visible on the public site
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

/// Input for creating a news post
#[derive(Debug, Clone)]
pub struct CreateNewsInput {
    /// Headline
    pub title: String,
    /// URL-friendly slug (generated from the title when empty)
    pub slug: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full article body
    pub body: String,
    /// Cover image URL (optional)
    pub cover_image: Option<String>,
    /// Author user ID
    pub author_id: i64,
    /// Publication status (defaults to Draft)
    pub status: Option<ContentStatus>,
}

/// Input for updating a news post
#[derive(Debug, Clone, Default)]
pub struct UpdateNewsInput {
    /// New headline (optional)
    pub title: Option<String>,
    /// New slug (optional)
    pub slug: Option<String>,
    /// New teaser (optional)
    pub summary: Option<String>,
    /// New body (optional)
    pub body: Option<String>,
    /// New cover image URL (optional, Some("") clears it)
    pub cover_image: Option<String>,
    /// New status (optional)
    pub status: Option<ContentStatus>,
}

impl UpdateNewsInput {
    /// Check if the update contains no changes
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.summary.is_none()
            && self.body.is_none()
            && self.cover_image.is_none()
            && self.status.is_none()
    }
}
