//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A comment on a news post.
///
/// Comments from authenticated users carry a `user_id` and are approved
/// immediately. Guest comments carry a display name and start pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: i64,
    /// News post the comment belongs to
    pub news_id: i64,
    /// Authenticated author, if any
    pub user_id: Option<i64>,
    /// Guest display name
    pub author_name: Option<String>,
    /// Guest email (never exposed publicly)
    #[serde(skip_serializing)]
    pub author_email: Option<String>,
    /// Comment text
    pub body: String,
    /// Moderation status
    pub status: CommentStatus,
    /// Client IP at submission
    pub ip_address: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Check if the comment is visible on the public site
    pub fn is_approved(&self) -> bool {
        self.status == CommentStatus::Approved
    }
}

/// Moderation status of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    /// Awaiting moderation
    Pending,
    /// Visible on the public site
    Approved,
    /// Hidden by a moderator
    Rejected,
}

impl CommentStatus {
    /// Convert status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Pending => "pending",
            CommentStatus::Approved => "approved",
            CommentStatus::Rejected => "rejected",
        }
    }
}

impl Default for CommentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(CommentStatus::Pending),
            "approved" => Ok(CommentStatus::Approved),
            "rejected" => Ok(CommentStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid comment status: {}", s)),
        }
    }
}

/// Input for creating a comment
#[derive(Debug, Clone)]
pub struct CreateCommentInput {
    /// News post the comment belongs to
    pub news_id: i64,
    /// Authenticated author, if any
    pub user_id: Option<i64>,
    /// Guest display name (required for guests)
    pub author_name: Option<String>,
    /// Guest email (optional)
    pub author_email: Option<String>,
    /// Comment text
    pub body: String,
    /// Initial moderation status; defaults to pending when omitted
    pub status: Option<CommentStatus>,
    /// Client IP at submission
    pub ip_address: Option<String>,
}
