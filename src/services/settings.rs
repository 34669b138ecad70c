//! Settings service
//!
//! Site configuration as free-form string key/value rows. A small
//! whitelist is readable without authentication; everything else is
//! admin territory (SMTP credentials live here).

use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repositories::SettingsRepository;

/// Known setting keys
pub mod keys {
    pub const SITE_NAME: &str = "site_name";
    pub const SITE_DESCRIPTION: &str = "site_description";
    pub const SITE_URL: &str = "site_url";
    pub const CONTACT_EMAIL: &str = "contact_email";
    pub const SMTP_HOST: &str = "smtp_host";
    pub const SMTP_PORT: &str = "smtp_port";
    pub const SMTP_USERNAME: &str = "smtp_username";
    pub const SMTP_PASSWORD: &str = "smtp_password";
    pub const SMTP_FROM: &str = "smtp_from";
    pub const SMTP_FROM_NAME: &str = "smtp_from_name";
}

/// Keys served to unauthenticated visitors
pub const PUBLIC_KEYS: &[&str] = &[
    keys::SITE_NAME,
    keys::SITE_DESCRIPTION,
    keys::CONTACT_EMAIL,
];

/// Longest accepted setting key
const MAX_KEY_LENGTH: usize = 100;

/// Settings service errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Settings service for site configuration
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// The whitelisted settings shown on the public site
    pub async fn get_public(&self) -> Result<HashMap<String, String>, SettingsServiceError> {
        self.repo
            .get_many(PUBLIC_KEYS)
            .await
            .context("Failed to load public settings")
            .map_err(Into::into)
    }

    /// All settings as a key/value map (admin view)
    pub async fn get_all(&self) -> Result<HashMap<String, String>, SettingsServiceError> {
        let settings = self
            .repo
            .get_all()
            .await
            .context("Failed to load settings")?;
        Ok(settings.into_iter().map(|s| (s.key, s.value)).collect())
    }

    /// Get a single setting value
    pub async fn get(&self, key: &str) -> Result<Option<String>, SettingsServiceError> {
        let setting = self
            .repo
            .get(key)
            .await
            .context("Failed to load setting")?;
        Ok(setting.map(|s| s.value))
    }

    /// Bulk upsert of string key/value pairs
    pub async fn update(
        &self,
        values: &HashMap<String, String>,
    ) -> Result<(), SettingsServiceError> {
        for key in values.keys() {
            if key.trim().is_empty() {
                return Err(SettingsServiceError::ValidationError(
                    "Setting keys cannot be empty".to_string(),
                ));
            }
            if key.len() > MAX_KEY_LENGTH {
                return Err(SettingsServiceError::ValidationError(format!(
                    "Setting key '{}' exceeds {} characters",
                    key, MAX_KEY_LENGTH
                )));
            }
        }

        self.repo
            .set_many(values)
            .await
            .context("Failed to save settings")
            .map_err(Into::into)
    }
}
