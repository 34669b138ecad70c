//! Service repository
//!
//! Database operations for the services offered by the company.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, CreateServiceItemInput, ListParams, PagedResult, ServiceItem, UpdateServiceItemInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Service repository trait
#[async_trait]
pub trait ServiceItemRepository: Send + Sync {
    /// Create a new service
    async fn create(&self, input: &CreateServiceItemInput) -> Result<ServiceItem>;

    /// Get service by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ServiceItem>>;

    /// Get service by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<ServiceItem>>;

    /// Check whether a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Update a service. Returns None when the service does not exist.
    async fn update(&self, id: i64, input: &UpdateServiceItemInput) -> Result<Option<ServiceItem>>;

    /// Delete a service. Returns false when the service does not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List services with optional status filter, by sort order
    async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<ServiceItem>>;

    /// List published services, by sort order
    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<ServiceItem>>;
}

/// SQLx-based service repository implementation
pub struct SqlxServiceItemRepository {
    pool: DynDatabasePool,
}

impl SqlxServiceItemRepository {
    /// Create a new SQLx service repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ServiceItemRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ServiceItemRepository for SqlxServiceItemRepository {
    async fn create(&self, input: &CreateServiceItemInput) -> Result<ServiceItem> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ServiceItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ServiceItem>> {
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

    async fn update(&self, id: i64, input: &UpdateServiceItemInput) -> Result<Option<ServiceItem>> {
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
    ) -> Result<PagedResult<ServiceItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), status, params).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), status, params).await,
        }
    }

    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<ServiceItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_published_sqlite(self.pool.as_sqlite().unwrap(), params).await,
            DatabaseDriver::Mysql => list_published_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }
}

const COLUMNS: &str =
    "id, slug, name, summary, description, icon, sort_order, status, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateServiceItemInput) -> Result<ServiceItem> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let sort_order = input.sort_order.unwrap_or(0);

    let result = sqlx::query(
        r#"
        INSERT INTO services (slug, name, summary, description, icon, sort_order, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.summary)
    .bind(&input.description)
    .bind(&input.icon)
    .bind(sort_order)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create service")?;

    Ok(ServiceItem {
        id: result.last_insert_rowid(),
        slug: input.slug.clone(),
        name: input.name.clone(),
        summary: input.summary.clone(),
        description: input.description.clone(),
        icon: input.icon.clone(),
        sort_order,
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ServiceItem>> {
    let row = sqlx::query(&format!("SELECT {} FROM services WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get service by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_service_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<ServiceItem>> {
    let row = sqlx::query(&format!("SELECT {} FROM services WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get service by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_service_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM services WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check service slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateServiceItemInput,
) -> Result<Option<ServiceItem>> {
    let existing = match get_by_id_sqlite(pool, id).await? {
        Some(service) => service,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_name = input.name.clone().unwrap_or(existing.name);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_description = input.description.clone().unwrap_or(existing.description);
    let new_icon = match &input.icon {
        Some(icon) if icon.is_empty() => None,
        Some(icon) => Some(icon.clone()),
        None => existing.icon,
    };
    let new_sort_order = input.sort_order.unwrap_or(existing.sort_order);
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE services
        SET slug = ?, name = ?, summary = ?, description = ?, icon = ?, sort_order = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_name)
    .bind(&new_summary)
    .bind(&new_description)
    .bind(&new_icon)
    .bind(new_sort_order)
    .bind(new_status.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update service")?;

    get_by_id_sqlite(pool, id).await
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete service")?;

    Ok(result.rows_affected() > 0)
}

async fn list_sqlite(
    pool: &SqlitePool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<ServiceItem>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM services WHERE status = ? ORDER BY sort_order ASC, id ASC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list services")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM services WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count services")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM services ORDER BY sort_order ASC, id ASC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list services")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM services")
                .fetch_one(pool)
                .await
                .context("Failed to count services")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut services = Vec::new();
    for row in rows {
        services.push(row_to_service_sqlite(&row)?);
    }

    Ok(PagedResult::new(services, total, params))
}

async fn list_published_sqlite(
    pool: &SqlitePool,
    params: &ListParams,
) -> Result<PagedResult<ServiceItem>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM services WHERE status = 'published' ORDER BY sort_order ASC, id ASC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published services")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM services WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published services")?;

    let mut services = Vec::new();
    for row in rows {
        services.push(row_to_service_sqlite(&row)?);
    }

    Ok(PagedResult::new(services, count_row.get("count"), params))
}

fn row_to_service_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ServiceItem> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(ServiceItem {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        summary: row.get("summary"),
        description: row.get("description"),
        icon: row.get("icon"),
        sort_order: row.get("sort_order"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateServiceItemInput) -> Result<ServiceItem> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let sort_order = input.sort_order.unwrap_or(0);

    let result = sqlx::query(
        r#"
        INSERT INTO services (slug, name, summary, description, icon, sort_order, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.summary)
    .bind(&input.description)
    .bind(&input.icon)
    .bind(sort_order)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create service")?;

    Ok(ServiceItem {
        id: result.last_insert_id() as i64,
        slug: input.slug.clone(),
        name: input.name.clone(),
        summary: input.summary.clone(),
        description: input.description.clone(),
        icon: input.icon.clone(),
        sort_order,
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ServiceItem>> {
    let row = sqlx::query(&format!("SELECT {} FROM services WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get service by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_service_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<ServiceItem>> {
    let row = sqlx::query(&format!("SELECT {} FROM services WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get service by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_service_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM services WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check service slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateServiceItemInput,
) -> Result<Option<ServiceItem>> {
    let existing = match get_by_id_mysql(pool, id).await? {
        Some(service) => service,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_name = input.name.clone().unwrap_or(existing.name);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_description = input.description.clone().unwrap_or(existing.description);
    let new_icon = match &input.icon {
        Some(icon) if icon.is_empty() => None,
        Some(icon) => Some(icon.clone()),
        None => existing.icon,
    };
    let new_sort_order = input.sort_order.unwrap_or(existing.sort_order);
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE services
        SET slug = ?, name = ?, summary = ?, description = ?, icon = ?, sort_order = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_name)
    .bind(&new_summary)
    .bind(&new_description)
    .bind(&new_icon)
    .bind(new_sort_order)
    .bind(new_status.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update service")?;

    get_by_id_mysql(pool, id).await
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete service")?;

    Ok(result.rows_affected() > 0)
}

async fn list_mysql(
    pool: &MySqlPool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<ServiceItem>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM services WHERE status = ? ORDER BY sort_order ASC, id ASC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list services")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM services WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count services")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM services ORDER BY sort_order ASC, id ASC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list services")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM services")
                .fetch_one(pool)
                .await
                .context("Failed to count services")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut services = Vec::new();
    for row in rows {
        services.push(row_to_service_mysql(&row)?);
    }

    Ok(PagedResult::new(services, total, params))
}

async fn list_published_mysql(
    pool: &MySqlPool,
    params: &ListParams,
) -> Result<PagedResult<ServiceItem>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM services WHERE status = 'published' ORDER BY sort_order ASC, id ASC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published services")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM services WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published services")?;

    let mut services = Vec::new();
    for row in rows {
        services.push(row_to_service_mysql(&row)?);
    }

    Ok(PagedResult::new(services, count_row.get("count"), params))
}

fn row_to_service_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ServiceItem> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(ServiceItem {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        summary: row.get("summary"),
        description: row.get("description"),
        icon: row.get("icon"),
        sort_order: row.get("sort_order"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
