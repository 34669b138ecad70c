//! News repository
//!
//! Database operations for news posts.
//!
//! `published_at` is set when a post first transitions to published and
//! retained afterwards, so archived posts keep their original date.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, CreateNewsInput, ListParams, NewsPost, PagedResult, UpdateNewsInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, input: &CreateNewsInput) -> Result<NewsPost>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<NewsPost>>;

    /// Get post by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsPost>>;

    /// Check whether a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Update a post. Returns None when the post does not exist.
    async fn update(&self, id: i64, input: &UpdateNewsInput) -> Result<Option<NewsPost>>;

    /// Delete a post. Returns false when the post does not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List posts with optional status filter, newest first
    async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<NewsPost>>;

    /// List published posts ordered by publication date
    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<NewsPost>>;

    /// Count posts written by the given author
    async fn count_by_author(&self, author_id: i64) -> Result<i64>;
}

/// SQLx-based news repository implementation
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    /// Create a new SQLx news repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, input: &CreateNewsInput) -> Result<NewsPost> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<NewsPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await,
            DatabaseDriver::Mysql => get_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => exists_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateNewsInput) -> Result<Option<NewsPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), id, input).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), id, input).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<NewsPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), status, params).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), status, params).await,
        }
    }

    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<NewsPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_published_sqlite(self.pool.as_sqlite().unwrap(), params).await,
            DatabaseDriver::Mysql => list_published_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }

    async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_by_author_sqlite(self.pool.as_sqlite().unwrap(), author_id).await
            }
            DatabaseDriver::Mysql => {
                count_by_author_mysql(self.pool.as_mysql().unwrap(), author_id).await
            }
        }
    }
}

const COLUMNS: &str =
    "id, slug, title, summary, body, cover_image, author_id, status, published_at, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateNewsInput) -> Result<NewsPost> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let published_at = if status == ContentStatus::Published {
        Some(now)
    } else {
        None
    };

    let result = sqlx::query(
        r#"
        INSERT INTO news (slug, title, summary, body, cover_image, author_id, status, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.body)
    .bind(&input.cover_image)
    .bind(input.author_id)
    .bind(status.as_str())
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create news post")?;

    Ok(NewsPost {
        id: result.last_insert_rowid(),
        slug: input.slug.clone(),
        title: input.title.clone(),
        summary: input.summary.clone(),
        body: input.body.clone(),
        cover_image: input.cover_image.clone(),
        author_id: input.author_id,
        status,
        published_at,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<NewsPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM news WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news post by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_news_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<NewsPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM news WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get news post by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_news_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM news WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check news slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateNewsInput,
) -> Result<Option<NewsPost>> {
    let existing = match get_by_id_sqlite(pool, id).await? {
        Some(post) => post,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_title = input.title.clone().unwrap_or(existing.title);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_body = input.body.clone().unwrap_or(existing.body);
    let new_cover = match &input.cover_image {
        Some(url) if url.is_empty() => None,
        Some(url) => Some(url.clone()),
        None => existing.cover_image,
    };
    let new_status = input.status.unwrap_or(existing.status);

    // First transition to published stamps the date; it is kept afterwards
    let new_published_at = match (new_status, existing.published_at) {
        (ContentStatus::Published, None) => Some(now),
        (_, published_at) => published_at,
    };

    sqlx::query(
        r#"
        UPDATE news
        SET slug = ?, title = ?, summary = ?, body = ?, cover_image = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_title)
    .bind(&new_summary)
    .bind(&new_body)
    .bind(&new_cover)
    .bind(new_status.as_str())
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update news post")?;

    get_by_id_sqlite(pool, id).await
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM news WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete news post")?;

    Ok(result.rows_affected() > 0)
}

async fn list_sqlite(
    pool: &SqlitePool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<NewsPost>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM news WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list news posts")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM news WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count news posts")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM news ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list news posts")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM news")
                .fetch_one(pool)
                .await
                .context("Failed to count news posts")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row_to_news_sqlite(&row)?);
    }

    Ok(PagedResult::new(posts, total, params))
}

async fn list_published_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<PagedResult<NewsPost>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM news WHERE status = 'published' ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published news posts")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM news WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published news posts")?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row_to_news_sqlite(&row)?);
    }

    Ok(PagedResult::new(posts, count_row.get("count"), params))
}

async fn count_by_author_sqlite(pool: &SqlitePool, author_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM news WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .context("Failed to count news posts by author")?;

    Ok(row.get("count"))
}

fn row_to_news_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<NewsPost> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(NewsPost {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        summary: row.get("summary"),
        body: row.get("body"),
        cover_image: row.get("cover_image"),
        author_id: row.get("author_id"),
        status,
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateNewsInput) -> Result<NewsPost> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let published_at = if status == ContentStatus::Published {
        Some(now)
    } else {
        None
    };

    let result = sqlx::query(
        r#"
        INSERT INTO news (slug, title, summary, body, cover_image, author_id, status, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.body)
    .bind(&input.cover_image)
    .bind(input.author_id)
    .bind(status.as_str())
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create news post")?;

    Ok(NewsPost {
        id: result.last_insert_id() as i64,
        slug: input.slug.clone(),
        title: input.title.clone(),
        summary: input.summary.clone(),
        body: input.body.clone(),
        cover_image: input.cover_image.clone(),
        author_id: input.author_id,
        status,
        published_at,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<NewsPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM news WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news post by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_news_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<NewsPost>> {
    let row = sqlx::query(&format!("SELECT {} FROM news WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get news post by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_news_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM news WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check news slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateNewsInput,
) -> Result<Option<NewsPost>> {
    let existing = match get_by_id_mysql(pool, id).await? {
        Some(post) => post,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_title = input.title.clone().unwrap_or(existing.title);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_body = input.body.clone().unwrap_or(existing.body);
    let new_cover = match &input.cover_image {
        Some(url) if url.is_empty() => None,
        Some(url) => Some(url.clone()),
        None => existing.cover_image,
    };
    let new_status = input.status.unwrap_or(existing.status);

    let new_published_at = match (new_status, existing.published_at) {
        (ContentStatus::Published, None) => Some(now),
        (_, published_at) => published_at,
    };

    sqlx::query(
        r#"
        UPDATE news
        SET slug = ?, title = ?, summary = ?, body = ?, cover_image = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_title)
    .bind(&new_summary)
    .bind(&new_body)
    .bind(&new_cover)
    .bind(new_status.as_str())
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update news post")?;

    get_by_id_mysql(pool, id).await
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM news WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete news post")?;

    Ok(result.rows_affected() > 0)
}

async fn list_mysql(
    pool: &MySqlPool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<NewsPost>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM news WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list news posts")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM news WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count news posts")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM news ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list news posts")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM news")
                .fetch_one(pool)
                .await
                .context("Failed to count news posts")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row_to_news_mysql(&row)?);
    }

    Ok(PagedResult::new(posts, total, params))
}

async fn list_published_mysql(pool: &MySqlPool, params: &ListParams) -> Result<PagedResult<NewsPost>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM news WHERE status = 'published' ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published news posts")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM news WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published news posts")?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row_to_news_mysql(&row)?);
    }

    Ok(PagedResult::new(posts, count_row.get("count"), params))
}

async fn count_by_author_mysql(pool: &MySqlPool, author_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM news WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .context("Failed to count news posts by author")?;

    Ok(row.get("count"))
}

fn row_to_news_mysql(row: &sqlx::mysql::MySqlRow) -> Result<NewsPost> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(NewsPost {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        summary: row.get("summary"),
        body: row.get("body"),
        cover_image: row.get("cover_image"),
        author_id: row.get("author_id"),
        status,
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
