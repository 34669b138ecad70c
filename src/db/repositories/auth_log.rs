//! Auth log repository
//!
//! Append-only audit trail of authentication events.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AuthLog, CreateAuthLogInput, ListParams, PagedResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Auth log repository trait
#[async_trait]
pub trait AuthLogRepository: Send + Sync {
    /// Append an event
    async fn create(&self, input: &CreateAuthLogInput) -> Result<AuthLog>;

    /// List events, newest first, optionally filtered by user
    async fn list(&self, user_id: Option<i64>, params: &ListParams) -> Result<PagedResult<AuthLog>>;

    /// Count failed login attempts for a username since the given moment
    async fn count_recent_failures(
        &self,
        username: &str,
        since: chrono::DateTime<Utc>,
    ) -> Result<i64>;
}

/// SQLx-based auth log repository implementation
pub struct SqlxAuthLogRepository {
    pool: DynDatabasePool,
}

impl SqlxAuthLogRepository {
    /// Create a new SQLx auth log repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AuthLogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthLogRepository for SqlxAuthLogRepository {
    async fn create(&self, input: &CreateAuthLogInput) -> Result<AuthLog> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn list(&self, user_id: Option<i64>, params: &ListParams) -> Result<PagedResult<AuthLog>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), user_id, params).await
            }
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), user_id, params).await,
        }
    }

    async fn count_recent_failures(
        &self,
        username: &str,
        since: chrono::DateTime<Utc>,
    ) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_recent_failures_sqlite(self.pool.as_sqlite().unwrap(), username, since).await
            }
            DatabaseDriver::Mysql => {
                count_recent_failures_mysql(self.pool.as_mysql().unwrap(), username, since).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateAuthLogInput) -> Result<AuthLog> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO auth_logs (user_id, username, action, ip_address, user_agent, success, detail, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.user_id)
    .bind(&input.username)
    .bind(&input.action)
    .bind(&input.ip_address)
    .bind(&input.user_agent)
    .bind(input.success)
    .bind(&input.detail)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create auth log entry")?;

    Ok(AuthLog {
        id: result.last_insert_rowid(),
        user_id: input.user_id,
        username: input.username.clone(),
        action: input.action.clone(),
        ip_address: input.ip_address.clone(),
        user_agent: input.user_agent.clone(),
        success: input.success,
        detail: input.detail.clone(),
        created_at: now,
    })
}

async fn list_sqlite(
    pool: &SqlitePool,
    user_id: Option<i64>,
    params: &ListParams,
) -> Result<PagedResult<AuthLog>> {
    let (rows, total) = match user_id {
        Some(uid) => {
            let rows = sqlx::query(
                r#"
                SELECT id, user_id, username, action, ip_address, user_agent, success, detail, created_at
                FROM auth_logs
                WHERE user_id = ?
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(uid)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list auth logs")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM auth_logs WHERE user_id = ?")
                .bind(uid)
                .fetch_one(pool)
                .await
                .context("Failed to count auth logs")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(
                r#"
                SELECT id, user_id, username, action, ip_address, user_agent, success, detail, created_at
                FROM auth_logs
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list auth logs")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM auth_logs")
                .fetch_one(pool)
                .await
                .context("Failed to count auth logs")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut logs = Vec::new();
    for row in rows {
        logs.push(row_to_auth_log_sqlite(&row));
    }

    Ok(PagedResult::new(logs, total, params))
}

async fn count_recent_failures_sqlite(
    pool: &SqlitePool,
    username: &str,
    since: chrono::DateTime<Utc>,
) -> Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM auth_logs WHERE username = ? AND action = 'login_failed' AND created_at > ?",
    )
    .bind(username)
    .bind(since)
    .fetch_one(pool)
    .await
    .context("Failed to count login failures")?;

    Ok(row.get("count"))
}

fn row_to_auth_log_sqlite(row: &sqlx::sqlite::SqliteRow) -> AuthLog {
    AuthLog {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        action: row.get("action"),
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
        success: row.get("success"),
        detail: row.get("detail"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateAuthLogInput) -> Result<AuthLog> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO auth_logs (user_id, username, action, ip_address, user_agent, success, detail, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.user_id)
    .bind(&input.username)
    .bind(&input.action)
    .bind(&input.ip_address)
    .bind(&input.user_agent)
    .bind(input.success)
    .bind(&input.detail)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create auth log entry")?;

    Ok(AuthLog {
        id: result.last_insert_id() as i64,
        user_id: input.user_id,
        username: input.username.clone(),
        action: input.action.clone(),
        ip_address: input.ip_address.clone(),
        user_agent: input.user_agent.clone(),
        success: input.success,
        detail: input.detail.clone(),
        created_at: now,
    })
}

async fn list_mysql(
    pool: &MySqlPool,
    user_id: Option<i64>,
    params: &ListParams,
) -> Result<PagedResult<AuthLog>> {
    let (rows, total) = match user_id {
        Some(uid) => {
            let rows = sqlx::query(
                r#"
                SELECT id, user_id, username, action, ip_address, user_agent, success, detail, created_at
                FROM auth_logs
                WHERE user_id = ?
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(uid)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list auth logs")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM auth_logs WHERE user_id = ?")
                .bind(uid)
                .fetch_one(pool)
                .await
                .context("Failed to count auth logs")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(
                r#"
                SELECT id, user_id, username, action, ip_address, user_agent, success, detail, created_at
                FROM auth_logs
                ORDER BY created_at DESC, id DESC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list auth logs")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM auth_logs")
                .fetch_one(pool)
                .await
                .context("Failed to count auth logs")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut logs = Vec::new();
    for row in rows {
        logs.push(row_to_auth_log_mysql(&row));
    }

    Ok(PagedResult::new(logs, total, params))
}

async fn count_recent_failures_mysql(
    pool: &MySqlPool,
    username: &str,
    since: chrono::DateTime<Utc>,
) -> Result<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM auth_logs WHERE username = ? AND action = 'login_failed' AND created_at > ?",
    )
    .bind(username)
    .bind(since)
    .fetch_one(pool)
    .await
    .context("Failed to count login failures")?;

    Ok(row.get("count"))
}

fn row_to_auth_log_mysql(row: &sqlx::mysql::MySqlRow) -> AuthLog {
    AuthLog {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        action: row.get("action"),
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
        success: row.get("success"),
        detail: row.get("detail"),
        created_at: row.get("created_at"),
    }
}
