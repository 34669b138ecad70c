//! Password reset token repository
//!
//! Database operations for single-use reset tokens. Only keyed digests
//! are stored; `mark_used` enforces one-shot consumption at the SQL level.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::PasswordResetToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Password reset token repository trait
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    /// Persist a freshly issued reset token
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken>;

    /// Look up a token by its digest, including used and expired rows
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<PasswordResetToken>>;

    /// Mark a token as consumed.
    ///
    /// Guarded by `used_at IS NULL` so two concurrent resets with the
    /// same token cannot both succeed. Returns false when already used.
    async fn mark_used(&self, id: i64) -> Result<bool>;

    /// Invalidate all outstanding tokens of a user
    async fn invalidate_for_user(&self, user_id: i64) -> Result<u64>;

    /// Delete expired and used rows. Returns the number deleted.
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based password reset repository implementation
pub struct SqlxPasswordResetRepository {
    pool: DynDatabasePool,
}

impl SqlxPasswordResetRepository {
    /// Create a new SQLx password reset repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PasswordResetRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PasswordResetRepository for SqlxPasswordResetRepository {
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_sqlite(self.pool.as_sqlite().unwrap(), user_id, token_hash, expires_at).await
            }
            DatabaseDriver::Mysql => {
                create_mysql(self.pool.as_mysql().unwrap(), user_id, token_hash, expires_at).await
            }
        }
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<PasswordResetToken>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_by_token_hash_sqlite(self.pool.as_sqlite().unwrap(), token_hash).await
            }
            DatabaseDriver::Mysql => {
                find_by_token_hash_mysql(self.pool.as_mysql().unwrap(), token_hash).await
            }
        }
    }

    async fn mark_used(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => mark_used_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => mark_used_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn invalidate_for_user(&self, user_id: i64) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                invalidate_for_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                invalidate_for_user_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn delete_expired(&self) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_expired_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => delete_expired_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<PasswordResetToken> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO password_reset_tokens (user_id, token_hash, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create password reset token")?;

    Ok(PasswordResetToken {
        id: result.last_insert_rowid(),
        user_id,
        token_hash: token_hash.to_string(),
        expires_at,
        used_at: None,
        created_at: now,
    })
}

async fn find_by_token_hash_sqlite(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<Option<PasswordResetToken>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, token_hash, expires_at, used_at, created_at
        FROM password_reset_tokens
        WHERE token_hash = ?
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
    .context("Failed to find password reset token")?;

    match row {
        Some(row) => Ok(Some(row_to_reset_token_sqlite(&row))),
        None => Ok(None),
    }
}

async fn mark_used_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE password_reset_tokens SET used_at = ? WHERE id = ? AND used_at IS NULL",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to mark password reset token used")?;

    Ok(result.rows_affected() > 0)
}

async fn invalidate_for_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE password_reset_tokens SET used_at = ? WHERE user_id = ? AND used_at IS NULL",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to invalidate password reset tokens")?;

    Ok(result.rows_affected())
}

async fn delete_expired_sqlite(pool: &SqlitePool) -> Result<u64> {
    let result =
        sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at < ? OR used_at IS NOT NULL")
            .bind(Utc::now())
            .execute(pool)
            .await
            .context("Failed to delete expired password reset tokens")?;

    Ok(result.rows_affected())
}

fn row_to_reset_token_sqlite(row: &sqlx::sqlite::SqliteRow) -> PasswordResetToken {
    PasswordResetToken {
        id: row.get("id"),
        user_id: row.get("user_id"),
        token_hash: row.get("token_hash"),
        expires_at: row.get("expires_at"),
        used_at: row.get("used_at"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(
    pool: &MySqlPool,
    user_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<PasswordResetToken> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO password_reset_tokens (user_id, token_hash, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create password reset token")?;

    Ok(PasswordResetToken {
        id: result.last_insert_id() as i64,
        user_id,
        token_hash: token_hash.to_string(),
        expires_at,
        used_at: None,
        created_at: now,
    })
}

async fn find_by_token_hash_mysql(
    pool: &MySqlPool,
    token_hash: &str,
) -> Result<Option<PasswordResetToken>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, token_hash, expires_at, used_at, created_at
        FROM password_reset_tokens
        WHERE token_hash = ?
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
    .context("Failed to find password reset token")?;

    match row {
        Some(row) => Ok(Some(row_to_reset_token_mysql(&row))),
        None => Ok(None),
    }
}

async fn mark_used_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE password_reset_tokens SET used_at = ? WHERE id = ? AND used_at IS NULL",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to mark password reset token used")?;

    Ok(result.rows_affected() > 0)
}

async fn invalidate_for_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE password_reset_tokens SET used_at = ? WHERE user_id = ? AND used_at IS NULL",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to invalidate password reset tokens")?;

    Ok(result.rows_affected())
}

async fn delete_expired_mysql(pool: &MySqlPool) -> Result<u64> {
    let result =
        sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at < ? OR used_at IS NOT NULL")
            .bind(Utc::now())
            .execute(pool)
            .await
            .context("Failed to delete expired password reset tokens")?;

    Ok(result.rows_affected())
}

fn row_to_reset_token_mysql(row: &sqlx::mysql::MySqlRow) -> PasswordResetToken {
    PasswordResetToken {
        id: row.get("id"),
        user_id: row.get("user_id"),
        token_hash: row.get("token_hash"),
        expires_at: row.get("expires_at"),
        used_at: row.get("used_at"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use chrono::Duration;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxPasswordResetRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new(
                "resetuser".to_string(),
                "reset@example.com".to_string(),
                "hash".to_string(),
                UserRole::Editor,
            ))
            .await
            .expect("Failed to create user");

        let repo = SqlxPasswordResetRepository::new(pool.clone());
        (pool, repo, user.id)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (_pool, repo, user_id) = setup_test_repo().await;
        let expires_at = Utc::now() + Duration::minutes(30);

        let created = repo
            .create(user_id, "reset-digest", expires_at)
            .await
            .expect("Failed to create token");
        assert!(created.id > 0);
        assert!(created.is_usable());

        let found = repo
            .find_by_token_hash("reset-digest")
            .await
            .expect("Failed to find token")
            .expect("Token not found");
        assert_eq!(found.user_id, user_id);
        assert!(found.used_at.is_none());
    }

    #[tokio::test]
    async fn test_mark_used_is_single_shot() {
        let (_pool, repo, user_id) = setup_test_repo().await;
        let created = repo
            .create(user_id, "reset-digest", Utc::now() + Duration::minutes(30))
            .await
            .expect("Failed to create token");

        let first = repo.mark_used(created.id).await.expect("Failed to mark used");
        assert!(first);

        let second = repo.mark_used(created.id).await.expect("Failed to mark used");
        assert!(!second, "Second consumption must be rejected");

        let found = repo
            .find_by_token_hash("reset-digest")
            .await
            .expect("Failed to find token")
            .expect("Token not found");
        assert!(!found.is_usable());
    }

    #[tokio::test]
    async fn test_invalidate_for_user() {
        let (_pool, repo, user_id) = setup_test_repo().await;
        let expires_at = Utc::now() + Duration::minutes(30);

        repo.create(user_id, "digest-1", expires_at)
            .await
            .expect("Failed to create token");
        repo.create(user_id, "digest-2", expires_at)
            .await
            .expect("Failed to create token");

        let invalidated = repo
            .invalidate_for_user(user_id)
            .await
            .expect("Failed to invalidate");
        assert_eq!(invalidated, 2);

        let found = repo
            .find_by_token_hash("digest-1")
            .await
            .expect("Failed to find token")
            .expect("Token not found");
        assert!(!found.is_usable());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let (_pool, repo, user_id) = setup_test_repo().await;

        repo.create(user_id, "digest-old", Utc::now() - Duration::minutes(5))
            .await
            .expect("Failed to create token");
        repo.create(user_id, "digest-live", Utc::now() + Duration::minutes(30))
            .await
            .expect("Failed to create token");

        let deleted = repo.delete_expired().await.expect("Failed to delete expired");
        assert_eq!(deleted, 1);

        let found = repo
            .find_by_token_hash("digest-live")
            .await
            .expect("Failed to find token");
        assert!(found.is_some());
    }
}
