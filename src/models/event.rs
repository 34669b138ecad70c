//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContentStatus;

/// A company event (conference, open day, webinar).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    /// Event title
    pub title: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full description
    pub description: String,
    /// Venue or meeting link (optional)
    pub location: Option<String>,
    /// Event start
    pub starts_at: DateTime<Utc>,
    /// Event end (optional)
    pub ends_at: Option<DateTime<Utc>>,
    /// Publication status
    pub status: ContentStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Check if the event lies in the future
    pub fn is_upcoming(&self) -> bool {
        self.starts_at > Utc::now()
    }
}

/// Input for creating an event
#[derive(Debug, Clone)]
pub struct CreateEventInput {
    /// Event title
    pub title: String,
    /// URL-friendly slug (generated from the title when empty)
    pub slug: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full description
    pub description: String,
    /// Venue or meeting link (optional)
    pub location: Option<String>,
    /// Event start
    pub starts_at: DateTime<Utc>,
    /// Event end (optional)
    pub ends_at: Option<DateTime<Utc>>,
    /// Publication status (defaults to Draft)
    pub status: Option<ContentStatus>,
}

/// Input for updating an event
#[derive(Debug, Clone, Default)]
pub struct UpdateEventInput {
    /// New title (optional)
    pub title: Option<String>,
    /// New slug (optional)
    pub slug: Option<String>,
    /// New teaser (optional)
    pub summary: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
    /// New location (optional)
    pub location: Option<String>,
    /// New start (optional)
    pub starts_at: Option<DateTime<Utc>>,
    /// New end (optional)
    pub ends_at: Option<DateTime<Utc>>,
    /// New status (optional)
    pub status: Option<ContentStatus>,
}
