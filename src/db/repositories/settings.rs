//! Settings repository
//!
//! Key-value store for site configuration (site name, contact details,
//! SMTP credentials). Writes are upserts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;

/// A setting key-value pair
#[derive(Debug, Clone)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Repository trait for settings operations
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Get a single setting by key
    async fn get(&self, key: &str) -> Result<Option<Setting>>;

    /// Get all settings
    async fn get_all(&self) -> Result<Vec<Setting>>;

    /// Get multiple settings by keys
    async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>>;

    /// Set a single setting
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Set multiple settings at once
    async fn set_many(&self, settings: &HashMap<String, String>) -> Result<()>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;
}

/// SQLx-based settings repository
pub struct SqlxSettingsRepository {
    pool: DynDatabasePool,
}

impl SqlxSettingsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SettingsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap(), key).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap(), key).await,
        }
    }

    async fn get_all(&self) -> Result<Vec<Setting>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_all_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => get_all_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_many_sqlite(self.pool.as_sqlite().unwrap(), keys).await,
            DatabaseDriver::Mysql => get_many_mysql(self.pool.as_mysql().unwrap(), keys).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => set_sqlite(self.pool.as_sqlite().unwrap(), key, value).await,
            DatabaseDriver::Mysql => set_mysql(self.pool.as_mysql().unwrap(), key, value).await,
        }
    }

    async fn set_many(&self, settings: &HashMap<String, String>) -> Result<()> {
        for (key, value) in settings {
            self.set(key, value).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), key).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), key).await,
        }
    }
}

// SQLite implementations
async fn get_sqlite(pool: &SqlitePool, key: &str) -> Result<Option<Setting>> {
    let row = sqlx::query("SELECT key, value, updated_at FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| Setting {
        key: r.get("key"),
        value: r.get("value"),
        updated_at: r.get("updated_at"),
    }))
}

async fn get_all_sqlite(pool: &SqlitePool) -> Result<Vec<Setting>> {
    let rows = sqlx::query("SELECT key, value, updated_at FROM settings ORDER BY key")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|r| Setting {
            key: r.get("key"),
            value: r.get("value"),
            updated_at: r.get("updated_at"),
        })
        .collect())
}

async fn get_many_sqlite(pool: &SqlitePool, keys: &[&str]) -> Result<HashMap<String, String>> {
    let mut result = HashMap::new();
    for key in keys {
        if let Some(setting) = get_sqlite(pool, key).await? {
            result.insert(setting.key, setting.value);
        }
    }
    Ok(result)
}

async fn set_sqlite(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

async fn delete_sqlite(pool: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

// MySQL implementations
async fn get_mysql(pool: &MySqlPool, key: &str) -> Result<Option<Setting>> {
    let row = sqlx::query("SELECT `key`, value, updated_at FROM settings WHERE `key` = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| Setting {
        key: r.get("key"),
        value: r.get("value"),
        updated_at: r.get("updated_at"),
    }))
}

async fn get_all_mysql(pool: &MySqlPool) -> Result<Vec<Setting>> {
    let rows = sqlx::query("SELECT `key`, value, updated_at FROM settings ORDER BY `key`")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|r| Setting {
            key: r.get("key"),
            value: r.get("value"),
            updated_at: r.get("updated_at"),
        })
        .collect())
}

async fn get_many_mysql(pool: &MySqlPool, keys: &[&str]) -> Result<HashMap<String, String>> {
    let mut result = HashMap::new();
    for key in keys {
        if let Some(setting) = get_mysql(pool, key).await? {
            result.insert(setting.key, setting.value);
        }
    }
    Ok(result)
}

async fn set_mysql(pool: &MySqlPool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (`key`, value) VALUES (?, ?)
         ON DUPLICATE KEY UPDATE value = VALUES(value)",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

async fn delete_mysql(pool: &MySqlPool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE `key` = ?")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxSettingsRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxSettingsRepository::new(pool)
    }

    #[tokio::test]
    async fn test_get_seeded_setting() {
        let repo = setup_test_repo().await;

        let setting = repo
            .get("site_name")
            .await
            .expect("Failed to get setting")
            .expect("Setting should be seeded");
        assert_eq!(setting.value, "Vitrine");
    }

    #[tokio::test]
    async fn test_set_is_upsert() {
        let repo = setup_test_repo().await;

        repo.set("site_name", "Acme Corp").await.expect("Failed to set");
        let setting = repo
            .get("site_name")
            .await
            .expect("Failed to get setting")
            .expect("Setting not found");
        assert_eq!(setting.value, "Acme Corp");

        repo.set("brand_color", "#ff6600").await.expect("Failed to set");
        let setting = repo
            .get("brand_color")
            .await
            .expect("Failed to get setting")
            .expect("Setting not found");
        assert_eq!(setting.value, "#ff6600");
    }

    #[tokio::test]
    async fn test_get_many() {
        let repo = setup_test_repo().await;
        repo.set("smtp_host", "smtp.example.com")
            .await
            .expect("Failed to set");

        let values = repo
            .get_many(&["site_name", "smtp_host", "missing_key"])
            .await
            .expect("Failed to get many");

        assert_eq!(values.len(), 2);
        assert_eq!(values.get("smtp_host").map(String::as_str), Some("smtp.example.com"));
        assert!(!values.contains_key("missing_key"));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_test_repo().await;
        repo.set("temp_key", "temp").await.expect("Failed to set");

        repo.delete("temp_key").await.expect("Failed to delete");

        let setting = repo.get("temp_key").await.expect("Failed to get setting");
        assert!(setting.is_none());
    }
}
