//! Refresh token repository
//!
//! Database operations for refresh-token sessions. Lookup is by keyed
//! digest; revoked and expired rows are still returned so the auth
//! service can detect token reuse.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateRefreshTokenInput, RefreshToken};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Refresh token repository trait
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Persist a freshly issued token
    async fn create(&self, input: &CreateRefreshTokenInput) -> Result<RefreshToken>;

    /// Look up a token by its digest.
    ///
    /// Returns revoked and expired rows too. Callers must check
    /// `is_usable()` and treat a revoked hit as reuse.
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>>;

    /// Revoke a single token. Returns false when already revoked or missing.
    async fn revoke(&self, id: i64) -> Result<bool>;

    /// Revoke every active token of a user. Returns the number revoked.
    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64>;

    /// Count active (not revoked, not expired) tokens of a user
    async fn count_active_for_user(&self, user_id: i64) -> Result<i64>;

    /// Delete rows past their expiry. Returns the number deleted.
    ///
    /// Revoked rows are kept until they expire: a replayed revoked
    /// token must still be findable for reuse detection.
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based refresh token repository implementation
pub struct SqlxRefreshTokenRepository {
    pool: DynDatabasePool,
}

impl SqlxRefreshTokenRepository {
    /// Create a new SQLx refresh token repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RefreshTokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RefreshTokenRepository for SqlxRefreshTokenRepository {
    async fn create(&self, input: &CreateRefreshTokenInput) -> Result<RefreshToken> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_by_token_hash_sqlite(self.pool.as_sqlite().unwrap(), token_hash).await
            }
            DatabaseDriver::Mysql => {
                find_by_token_hash_mysql(self.pool.as_mysql().unwrap(), token_hash).await
            }
        }
    }

    async fn revoke(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => revoke_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => revoke_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                revoke_all_for_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                revoke_all_for_user_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn count_active_for_user(&self, user_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_active_for_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                count_active_for_user_mysql(self.pool.as_mysql().unwrap(), user_id).await
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

async fn create_sqlite(pool: &SqlitePool, input: &CreateRefreshTokenInput) -> Result<RefreshToken> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, token_hash, expires_at, ip_address, user_agent, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.user_id)
    .bind(&input.token_hash)
    .bind(input.expires_at)
    .bind(&input.ip_address)
    .bind(&input.user_agent)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create refresh token")?;

    let id = result.last_insert_rowid();

    Ok(RefreshToken {
        id,
        user_id: input.user_id,
        token_hash: input.token_hash.clone(),
        expires_at: input.expires_at,
        revoked_at: None,
        ip_address: input.ip_address.clone(),
        user_agent: input.user_agent.clone(),
        created_at: now,
    })
}

async fn find_by_token_hash_sqlite(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<Option<RefreshToken>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, token_hash, expires_at, revoked_at, ip_address, user_agent, created_at
        FROM refresh_tokens
        WHERE token_hash = ?
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
    .context("Failed to find refresh token")?;

    match row {
        Some(row) => Ok(Some(row_to_refresh_token_sqlite(&row))),
        None => Ok(None),
    }
}

async fn revoke_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to revoke refresh token")?;

    Ok(result.rows_affected() > 0)
}

async fn revoke_all_for_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to revoke refresh tokens for user")?;

    Ok(result.rows_affected())
}

async fn count_active_for_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM refresh_tokens WHERE user_id = ? AND revoked_at IS NULL AND expires_at > ?",
    )
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .context("Failed to count refresh tokens")?;

    Ok(row.get("count"))
}

async fn delete_expired_sqlite(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired refresh tokens")?;

    Ok(result.rows_affected())
}

fn row_to_refresh_token_sqlite(row: &sqlx::sqlite::SqliteRow) -> RefreshToken {
    RefreshToken {
        id: row.get("id"),
        user_id: row.get("user_id"),
        token_hash: row.get("token_hash"),
        expires_at: row.get("expires_at"),
        revoked_at: row.get("revoked_at"),
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateRefreshTokenInput) -> Result<RefreshToken> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, token_hash, expires_at, ip_address, user_agent, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.user_id)
    .bind(&input.token_hash)
    .bind(input.expires_at)
    .bind(&input.ip_address)
    .bind(&input.user_agent)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create refresh token")?;

    let id = result.last_insert_id() as i64;

    Ok(RefreshToken {
        id,
        user_id: input.user_id,
        token_hash: input.token_hash.clone(),
        expires_at: input.expires_at,
        revoked_at: None,
        ip_address: input.ip_address.clone(),
        user_agent: input.user_agent.clone(),
        created_at: now,
    })
}

async fn find_by_token_hash_mysql(
    pool: &MySqlPool,
    token_hash: &str,
) -> Result<Option<RefreshToken>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, token_hash, expires_at, revoked_at, ip_address, user_agent, created_at
        FROM refresh_tokens
        WHERE token_hash = ?
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
    .context("Failed to find refresh token")?;

    match row {
        Some(row) => Ok(Some(row_to_refresh_token_mysql(&row))),
        None => Ok(None),
    }
}

async fn revoke_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to revoke refresh token")?;

    Ok(result.rows_affected() > 0)
}

async fn revoke_all_for_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL",
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to revoke refresh tokens for user")?;

    Ok(result.rows_affected())
}

async fn count_active_for_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM refresh_tokens WHERE user_id = ? AND revoked_at IS NULL AND expires_at > ?",
    )
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .context("Failed to count refresh tokens")?;

    Ok(row.get("count"))
}

async fn delete_expired_mysql(pool: &MySqlPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired refresh tokens")?;

    Ok(result.rows_affected())
}

fn row_to_refresh_token_mysql(row: &sqlx::mysql::MySqlRow) -> RefreshToken {
    RefreshToken {
        id: row.get("id"),
        user_id: row.get("user_id"),
        token_hash: row.get("token_hash"),
        expires_at: row.get("expires_at"),
        revoked_at: row.get("revoked_at"),
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
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

    async fn setup_test_repo() -> (DynDatabasePool, SqlxRefreshTokenRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new(
                "tokenuser".to_string(),
                "tokens@example.com".to_string(),
                "hash".to_string(),
                UserRole::Editor,
            ))
            .await
            .expect("Failed to create user");

        let repo = SqlxRefreshTokenRepository::new(pool.clone());
        (pool, repo, user.id)
    }

    fn token_input(user_id: i64, token_hash: &str) -> CreateRefreshTokenInput {
        CreateRefreshTokenInput {
            user_id,
            token_hash: token_hash.to_string(),
            expires_at: Utc::now() + Duration::days(30),
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: Some("test-agent".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (_pool, repo, user_id) = setup_test_repo().await;

        let created = repo
            .create(&token_input(user_id, "digest-1"))
            .await
            .expect("Failed to create token");
        assert!(created.id > 0);
        assert!(created.is_usable());

        let found = repo
            .find_by_token_hash("digest-1")
            .await
            .expect("Failed to find token")
            .expect("Token not found");
        assert_eq!(found.id, created.id);
        assert_eq!(found.user_id, user_id);
        assert_eq!(found.ip_address.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_find_unknown_digest() {
        let (_pool, repo, _user_id) = setup_test_repo().await;

        let found = repo
            .find_by_token_hash("no-such-digest")
            .await
            .expect("Failed to query");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_revoke() {
        let (_pool, repo, user_id) = setup_test_repo().await;
        let created = repo
            .create(&token_input(user_id, "digest-1"))
            .await
            .expect("Failed to create token");

        let revoked = repo.revoke(created.id).await.expect("Failed to revoke");
        assert!(revoked);

        // Revoked rows stay findable so reuse can be detected
        let found = repo
            .find_by_token_hash("digest-1")
            .await
            .expect("Failed to find token")
            .expect("Token not found");
        assert!(found.is_revoked());
        assert!(!found.is_usable());

        // Second revoke is a no-op
        let revoked = repo.revoke(created.id).await.expect("Failed to revoke");
        assert!(!revoked);
    }

    #[tokio::test]
    async fn test_revoke_all_for_user() {
        let (_pool, repo, user_id) = setup_test_repo().await;
        repo.create(&token_input(user_id, "digest-1"))
            .await
            .expect("Failed to create token");
        repo.create(&token_input(user_id, "digest-2"))
            .await
            .expect("Failed to create token");
        repo.create(&token_input(user_id, "digest-3"))
            .await
            .expect("Failed to create token");

        let count = repo.count_active_for_user(user_id).await.expect("Failed to count");
        assert_eq!(count, 3);

        let revoked = repo
            .revoke_all_for_user(user_id)
            .await
            .expect("Failed to revoke all");
        assert_eq!(revoked, 3);

        let count = repo.count_active_for_user(user_id).await.expect("Failed to count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let (_pool, repo, user_id) = setup_test_repo().await;

        let mut expired = token_input(user_id, "digest-old");
        expired.expires_at = Utc::now() - Duration::hours(1);
        repo.create(&expired).await.expect("Failed to create token");

        let live = repo
            .create(&token_input(user_id, "digest-live"))
            .await
            .expect("Failed to create token");
        let revoked = repo
            .create(&token_input(user_id, "digest-revoked"))
            .await
            .expect("Failed to create token");
        repo.revoke(revoked.id).await.expect("Failed to revoke");

        let deleted = repo.delete_expired().await.expect("Failed to delete expired");
        assert_eq!(deleted, 1);

        let found = repo
            .find_by_token_hash("digest-live")
            .await
            .expect("Failed to find token");
        assert_eq!(found.map(|t| t.id), Some(live.id));

        // The unexpired revoked row survives so a replay still hits it
        let found = repo
            .find_by_token_hash("digest-revoked")
            .await
            .expect("Failed to find token");
        assert!(found.is_some_and(|t| t.is_revoked()));
    }

    #[tokio::test]
    async fn test_duplicate_digest_rejected() {
        let (_pool, repo, user_id) = setup_test_repo().await;
        repo.create(&token_input(user_id, "digest-1"))
            .await
            .expect("Failed to create token");

        let result = repo.create(&token_input(user_id, "digest-1")).await;
        assert!(result.is_err(), "Should fail due to duplicate digest");
    }
}
