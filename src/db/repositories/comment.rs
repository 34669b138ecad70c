//! Comment repository
//!
//! Database operations for news comments and the moderation queue.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentStatus, CreateCommentInput, ListParams, PagedResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(&self, input: &CreateCommentInput) -> Result<Comment>;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Change a comment's moderation status. Returns false when the comment does not exist.
    async fn update_status(&self, id: i64, status: CommentStatus) -> Result<bool>;

    /// Delete a comment. Returns false when the comment does not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List comments on a news post, oldest first.
    /// When `only_approved` is set, pending and rejected comments are hidden.
    async fn list_for_news(
        &self,
        news_id: i64,
        only_approved: bool,
        params: &ListParams,
    ) -> Result<PagedResult<Comment>>;

    /// List comments across all posts with optional status filter, newest first
    async fn list(
        &self,
        status: Option<CommentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Comment>>;

    /// Count comments awaiting moderation
    async fn count_pending(&self) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    /// Create a new SQLx comment repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, input: &CreateCommentInput) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn update_status(&self, id: i64, status: CommentStatus) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_status_sqlite(self.pool.as_sqlite().unwrap(), id, status).await
            }
            DatabaseDriver::Mysql => {
                update_status_mysql(self.pool.as_mysql().unwrap(), id, status).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_for_news(
        &self,
        news_id: i64,
        only_approved: bool,
        params: &ListParams,
    ) -> Result<PagedResult<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_for_news_sqlite(self.pool.as_sqlite().unwrap(), news_id, only_approved, params)
                    .await
            }
            DatabaseDriver::Mysql => {
                list_for_news_mysql(self.pool.as_mysql().unwrap(), news_id, only_approved, params)
                    .await
            }
        }
    }

    async fn list(
        &self,
        status: Option<CommentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), status, params).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), status, params).await,
        }
    }

    async fn count_pending(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_pending_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_pending_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

const COLUMNS: &str =
    "id, news_id, user_id, author_name, author_email, body, status, ip_address, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateCommentInput) -> Result<Comment> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO comments (news_id, user_id, author_name, author_email, body, status, ip_address, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.news_id)
    .bind(input.user_id)
    .bind(&input.author_name)
    .bind(&input.author_email)
    .bind(&input.body)
    .bind(status.as_str())
    .bind(&input.ip_address)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        news_id: input.news_id,
        user_id: input.user_id,
        author_name: input.author_name.clone(),
        author_email: input.author_email.clone(),
        body: input.body.clone(),
        status,
        ip_address: input.ip_address.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("SELECT {} FROM comments WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_comment_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_status_sqlite(pool: &SqlitePool, id: i64, status: CommentStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE comments SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment status")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;

    Ok(result.rows_affected() > 0)
}

async fn list_for_news_sqlite(
    pool: &SqlitePool,
    news_id: i64,
    only_approved: bool,
    params: &ListParams,
) -> Result<PagedResult<Comment>> {
    let (rows, total) = if only_approved {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments WHERE news_id = ? AND status = 'approved' ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
            COLUMNS
        ))
        .bind(news_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

        let count_row = sqlx::query(
            "SELECT COUNT(*) as count FROM comments WHERE news_id = ? AND status = 'approved'",
        )
        .bind(news_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;
        (rows, count_row.get::<i64, _>("count"))
    } else {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments WHERE news_id = ? ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
            COLUMNS
        ))
        .bind(news_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

        let count_row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE news_id = ?")
            .bind(news_id)
            .fetch_one(pool)
            .await
            .context("Failed to count comments")?;
        (rows, count_row.get::<i64, _>("count"))
    };

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row_to_comment_sqlite(&row)?);
    }

    Ok(PagedResult::new(comments, total, params))
}

async fn list_sqlite(
    pool: &SqlitePool,
    status: Option<CommentStatus>,
    params: &ListParams,
) -> Result<PagedResult<Comment>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM comments WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list comments")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count comments")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM comments ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list comments")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM comments")
                .fetch_one(pool)
                .await
                .context("Failed to count comments")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row_to_comment_sqlite(&row)?);
    }

    Ok(PagedResult::new(comments, total, params))
}

async fn count_pending_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE status = 'pending'")
        .fetch_one(pool)
        .await
        .context("Failed to count pending comments")?;

    Ok(row.get("count"))
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Comment> {
    let status_str: String = row.get("status");
    let status = CommentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid comment status in database: {}", status_str))?;

    Ok(Comment {
        id: row.get("id"),
        news_id: row.get("news_id"),
        user_id: row.get("user_id"),
        author_name: row.get("author_name"),
        author_email: row.get("author_email"),
        body: row.get("body"),
        status,
        ip_address: row.get("ip_address"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateCommentInput) -> Result<Comment> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO comments (news_id, user_id, author_name, author_email, body, status, ip_address, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.news_id)
    .bind(input.user_id)
    .bind(&input.author_name)
    .bind(&input.author_email)
    .bind(&input.body)
    .bind(status.as_str())
    .bind(&input.ip_address)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        news_id: input.news_id,
        user_id: input.user_id,
        author_name: input.author_name.clone(),
        author_email: input.author_email.clone(),
        body: input.body.clone(),
        status,
        ip_address: input.ip_address.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!("SELECT {} FROM comments WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_comment_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_status_mysql(pool: &MySqlPool, id: i64, status: CommentStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE comments SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment status")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;

    Ok(result.rows_affected() > 0)
}

async fn list_for_news_mysql(
    pool: &MySqlPool,
    news_id: i64,
    only_approved: bool,
    params: &ListParams,
) -> Result<PagedResult<Comment>> {
    let (rows, total) = if only_approved {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments WHERE news_id = ? AND status = 'approved' ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
            COLUMNS
        ))
        .bind(news_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

        let count_row = sqlx::query(
            "SELECT COUNT(*) as count FROM comments WHERE news_id = ? AND status = 'approved'",
        )
        .bind(news_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;
        (rows, count_row.get::<i64, _>("count"))
    } else {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments WHERE news_id = ? ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
            COLUMNS
        ))
        .bind(news_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

        let count_row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE news_id = ?")
            .bind(news_id)
            .fetch_one(pool)
            .await
            .context("Failed to count comments")?;
        (rows, count_row.get::<i64, _>("count"))
    };

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row_to_comment_mysql(&row)?);
    }

    Ok(PagedResult::new(comments, total, params))
}

async fn list_mysql(
    pool: &MySqlPool,
    status: Option<CommentStatus>,
    params: &ListParams,
) -> Result<PagedResult<Comment>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM comments WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list comments")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count comments")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM comments ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list comments")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM comments")
                .fetch_one(pool)
                .await
                .context("Failed to count comments")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row_to_comment_mysql(&row)?);
    }

    Ok(PagedResult::new(comments, total, params))
}

async fn count_pending_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE status = 'pending'")
        .fetch_one(pool)
        .await
        .context("Failed to count pending comments")?;

    Ok(row.get("count"))
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Comment> {
    let status_str: String = row.get("status");
    let status = CommentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid comment status in database: {}", status_str))?;

    Ok(Comment {
        id: row.get("id"),
        news_id: row.get("news_id"),
        user_id: row.get("user_id"),
        author_name: row.get("author_name"),
        author_email: row.get("author_email"),
        body: row.get("body"),
        status,
        ip_address: row.get("ip_address"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::news::{NewsRepository, SqlxNewsRepository};
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{CreateNewsInput, User, UserRole};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxCommentRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new(
                "author".to_string(),
                "author@example.com".to_string(),
                "hash".to_string(),
                UserRole::Editor,
            ))
            .await
            .expect("Failed to create author");

        let news_repo = SqlxNewsRepository::new(pool.clone());
        let post = news_repo
            .create(&CreateNewsInput {
                title: "Launch".to_string(),
                slug: "launch".to_string(),
                summary: "Launch post".to_string(),
                body: "Body".to_string(),
                cover_image: None,
                author_id: author.id,
                status: None,
            })
            .await
            .expect("Failed to create news post");

        let repo = SqlxCommentRepository::new(pool.clone());
        (pool, repo, post.id)
    }

    fn comment_input(news_id: i64, body: &str) -> CreateCommentInput {
        CreateCommentInput {
            news_id,
            user_id: None,
            author_name: Some("Visitor".to_string()),
            author_email: Some("visitor@example.com".to_string()),
            body: body.to_string(),
            status: None,
            ip_address: Some("127.0.0.1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_pending() {
        let (_pool, repo, news_id) = setup_test_repo().await;

        let created = repo
            .create(&comment_input(news_id, "Nice post"))
            .await
            .expect("Failed to create comment");
        assert_eq!(created.status, CommentStatus::Pending);
        assert!(!created.is_approved());
    }

    #[tokio::test]
    async fn test_approve_then_visible_in_public_list() {
        let (_pool, repo, news_id) = setup_test_repo().await;

        let comment = repo
            .create(&comment_input(news_id, "First"))
            .await
            .expect("Failed to create comment");

        let public = repo
            .list_for_news(news_id, true, &ListParams::default())
            .await
            .expect("Failed to list");
        assert_eq!(public.total, 0);

        assert!(repo
            .update_status(comment.id, CommentStatus::Approved)
            .await
            .expect("Failed to approve"));

        let public = repo
            .list_for_news(news_id, true, &ListParams::default())
            .await
            .expect("Failed to list");
        assert_eq!(public.total, 1);
        assert!(public.items[0].is_approved());
    }

    #[tokio::test]
    async fn test_moderation_queue() {
        let (_pool, repo, news_id) = setup_test_repo().await;

        let first = repo
            .create(&comment_input(news_id, "One"))
            .await
            .expect("Failed to create comment");
        repo.create(&comment_input(news_id, "Two"))
            .await
            .expect("Failed to create comment");

        assert_eq!(repo.count_pending().await.expect("Failed to count"), 2);

        repo.update_status(first.id, CommentStatus::Rejected)
            .await
            .expect("Failed to reject");
        assert_eq!(repo.count_pending().await.expect("Failed to count"), 1);

        let rejected = repo
            .list(Some(CommentStatus::Rejected), &ListParams::default())
            .await
            .expect("Failed to list");
        assert_eq!(rejected.total, 1);
        assert_eq!(rejected.items[0].body, "One");
    }

    #[tokio::test]
    async fn test_update_status_missing_comment() {
        let (_pool, repo, _news_id) = setup_test_repo().await;

        assert!(!repo
            .update_status(9999, CommentStatus::Approved)
            .await
            .expect("Failed to update"));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_pool, repo, news_id) = setup_test_repo().await;
        let comment = repo
            .create(&comment_input(news_id, "Temp"))
            .await
            .expect("Failed to create comment");

        assert!(repo.delete(comment.id).await.expect("Failed to delete"));
        assert!(repo
            .get_by_id(comment.id)
            .await
            .expect("Failed to get")
            .is_none());
    }
}
