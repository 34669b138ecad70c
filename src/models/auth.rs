//! Authentication models
//!
//! Refresh-token sessions, single-use password reset tokens, and the
//! authentication audit log. Token plaintext never reaches the database;
//! only keyed digests are stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A refresh-token session.
///
/// One row per issued refresh token. The `token_hash` column holds a
/// keyed digest of the opaque token; the plaintext is returned to the
/// client once and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Unique identifier
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Keyed digest of the token (hex)
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Set when the token is revoked (logout, rotation, password change)
    pub revoked_at: Option<DateTime<Utc>>,
    /// Client IP at issuance
    pub ip_address: Option<String>,
    /// Client user agent at issuance
    pub user_agent: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Check if the token has been revoked
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Check if the token can still be exchanged for a new pair
    pub fn is_usable(&self) -> bool {
        !self.is_expired() && !self.is_revoked()
    }
}

/// A single-use password reset token.
///
/// Issued by the forgot-password flow, consumed by reset-password.
/// `used_at` marks consumption so a token can never be replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetToken {
    /// Unique identifier
    pub id: i64,
    /// User the reset applies to
    pub user_id: i64,
    /// Keyed digest of the token (hex)
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Set when the token is consumed
    pub used_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Check if the token is still valid for a reset
    pub fn is_usable(&self) -> bool {
        !self.is_expired() && self.used_at.is_none()
    }
}

/// Input for persisting a freshly issued refresh token
#[derive(Debug, Clone)]
pub struct CreateRefreshTokenInput {
    /// Owning user
    pub user_id: i64,
    /// Keyed digest of the token (hex)
    pub token_hash: String,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Client IP at issuance
    pub ip_address: Option<String>,
    /// Client user agent at issuance
    pub user_agent: Option<String>,
}

/// Authentication event recorded in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthLog {
    /// Unique identifier
    pub id: i64,
    /// User involved, if known (NULL for unknown usernames)
    pub user_id: Option<i64>,
    /// Username as presented by the client
    pub username: String,
    /// Event kind, one of the [`AuthAction`] constants
    pub action: String,
    /// Client IP
    pub ip_address: Option<String>,
    /// Client user agent
    pub user_agent: Option<String>,
    /// Whether the attempt succeeded
    pub success: bool,
    /// Free-form context (failure reason etc.)
    pub detail: Option<String>,
    /// Event timestamp
    pub created_at: DateTime<Utc>,
}

/// Action names for the auth audit log.
///
/// Stored as strings so the log survives enum changes.
pub mod auth_action {
    pub const LOGIN: &str = "login";
    pub const LOGIN_FAILED: &str = "login_failed";
    pub const LOGOUT: &str = "logout";
    pub const LOGOUT_ALL: &str = "logout_all";
    pub const REFRESH: &str = "refresh";
    pub const REFRESH_REUSED: &str = "refresh_reused";
    pub const PASSWORD_CHANGED: &str = "password_changed";
    pub const RESET_REQUESTED: &str = "reset_requested";
    pub const RESET_COMPLETED: &str = "reset_completed";
}

/// Input for recording an auth event
#[derive(Debug, Clone)]
pub struct CreateAuthLogInput {
    /// User involved, if known
    pub user_id: Option<i64>,
    /// Username as presented
    pub username: String,
    /// Event kind
    pub action: String,
    /// Client IP
    pub ip_address: Option<String>,
    /// Client user agent
    pub user_agent: Option<String>,
    /// Whether the attempt succeeded
    pub success: bool,
    /// Free-form context
    pub detail: Option<String>,
}
