//! Product repository
//!
//! Database operations for the product catalogue. Published listings
//! are ordered by `sort_order`, then newest first.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, CreateProductInput, ListParams, PagedResult, Product, UpdateProductInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Product repository trait
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Create a new product
    async fn create(&self, input: &CreateProductInput) -> Result<Product>;

    /// Get product by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Product>>;

    /// Get product by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>>;

    /// Check whether a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Update a product. Returns None when the product does not exist.
    async fn update(&self, id: i64, input: &UpdateProductInput) -> Result<Option<Product>>;

    /// Delete a product. Returns false when the product does not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List products with optional status filter
    async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Product>>;

    /// List published products in catalogue order
    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<Product>>;
}

/// SQLx-based product repository implementation
pub struct SqlxProductRepository {
    pool: DynDatabasePool,
}

impl SqlxProductRepository {
    /// Create a new SQLx product repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProductRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProductRepository for SqlxProductRepository {
    async fn create(&self, input: &CreateProductInput) -> Result<Product> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Product>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>> {
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

    async fn update(&self, id: i64, input: &UpdateProductInput) -> Result<Option<Product>> {
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
    ) -> Result<PagedResult<Product>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), status, params).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), status, params).await,
        }
    }

    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<Product>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_published_sqlite(self.pool.as_sqlite().unwrap(), params).await,
            DatabaseDriver::Mysql => list_published_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }
}

const COLUMNS: &str =
    "id, slug, name, summary, description, image, price_cents, sort_order, status, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateProductInput) -> Result<Product> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let sort_order = input.sort_order.unwrap_or(0);

    let result = sqlx::query(
        r#"
        INSERT INTO products (slug, name, summary, description, image, price_cents, sort_order, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.summary)
    .bind(&input.description)
    .bind(&input.image)
    .bind(input.price_cents)
    .bind(sort_order)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create product")?;

    Ok(Product {
        id: result.last_insert_rowid(),
        slug: input.slug.clone(),
        name: input.name.clone(),
        summary: input.summary.clone(),
        description: input.description.clone(),
        image: input.image.clone(),
        price_cents: input.price_cents,
        sort_order,
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Product>> {
    let row = sqlx::query(&format!("SELECT {} FROM products WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get product by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_product_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Product>> {
    let row = sqlx::query(&format!("SELECT {} FROM products WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get product by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_product_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM products WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check product slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateProductInput,
) -> Result<Option<Product>> {
    let existing = match get_by_id_sqlite(pool, id).await? {
        Some(product) => product,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_name = input.name.clone().unwrap_or(existing.name);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_description = input.description.clone().unwrap_or(existing.description);
    let new_image = match &input.image {
        Some(url) if url.is_empty() => None,
        Some(url) => Some(url.clone()),
        None => existing.image,
    };
    let new_price = input.price_cents.or(existing.price_cents);
    let new_sort = input.sort_order.unwrap_or(existing.sort_order);
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE products
        SET slug = ?, name = ?, summary = ?, description = ?, image = ?, price_cents = ?, sort_order = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_name)
    .bind(&new_summary)
    .bind(&new_description)
    .bind(&new_image)
    .bind(new_price)
    .bind(new_sort)
    .bind(new_status.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update product")?;

    get_by_id_sqlite(pool, id).await
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete product")?;

    Ok(result.rows_affected() > 0)
}

async fn list_sqlite(
    pool: &SqlitePool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<Product>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM products WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list products")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM products WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count products")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM products ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list products")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM products")
                .fetch_one(pool)
                .await
                .context("Failed to count products")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut products = Vec::new();
    for row in rows {
        products.push(row_to_product_sqlite(&row)?);
    }

    Ok(PagedResult::new(products, total, params))
}

async fn list_published_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<PagedResult<Product>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM products WHERE status = 'published' ORDER BY sort_order ASC, created_at DESC, id DESC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published products")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM products WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published products")?;

    let mut products = Vec::new();
    for row in rows {
        products.push(row_to_product_sqlite(&row)?);
    }

    Ok(PagedResult::new(products, count_row.get("count"), params))
}

fn row_to_product_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Product> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(Product {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        summary: row.get("summary"),
        description: row.get("description"),
        image: row.get("image"),
        price_cents: row.get("price_cents"),
        sort_order: row.get("sort_order"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateProductInput) -> Result<Product> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let sort_order = input.sort_order.unwrap_or(0);

    let result = sqlx::query(
        r#"
        INSERT INTO products (slug, name, summary, description, image, price_cents, sort_order, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.summary)
    .bind(&input.description)
    .bind(&input.image)
    .bind(input.price_cents)
    .bind(sort_order)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create product")?;

    Ok(Product {
        id: result.last_insert_id() as i64,
        slug: input.slug.clone(),
        name: input.name.clone(),
        summary: input.summary.clone(),
        description: input.description.clone(),
        image: input.image.clone(),
        price_cents: input.price_cents,
        sort_order,
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Product>> {
    let row = sqlx::query(&format!("SELECT {} FROM products WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get product by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_product_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Product>> {
    let row = sqlx::query(&format!("SELECT {} FROM products WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get product by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_product_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM products WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check product slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateProductInput,
) -> Result<Option<Product>> {
    let existing = match get_by_id_mysql(pool, id).await? {
        Some(product) => product,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_name = input.name.clone().unwrap_or(existing.name);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_description = input.description.clone().unwrap_or(existing.description);
    let new_image = match &input.image {
        Some(url) if url.is_empty() => None,
        Some(url) => Some(url.clone()),
        None => existing.image,
    };
    let new_price = input.price_cents.or(existing.price_cents);
    let new_sort = input.sort_order.unwrap_or(existing.sort_order);
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE products
        SET slug = ?, name = ?, summary = ?, description = ?, image = ?, price_cents = ?, sort_order = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_name)
    .bind(&new_summary)
    .bind(&new_description)
    .bind(&new_image)
    .bind(new_price)
    .bind(new_sort)
    .bind(new_status.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update product")?;

    get_by_id_mysql(pool, id).await
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete product")?;

    Ok(result.rows_affected() > 0)
}

async fn list_mysql(
    pool: &MySqlPool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<Product>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM products WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list products")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM products WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count products")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM products ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list products")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM products")
                .fetch_one(pool)
                .await
                .context("Failed to count products")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut products = Vec::new();
    for row in rows {
        products.push(row_to_product_mysql(&row)?);
    }

    Ok(PagedResult::new(products, total, params))
}

async fn list_published_mysql(pool: &MySqlPool, params: &ListParams) -> Result<PagedResult<Product>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM products WHERE status = 'published' ORDER BY sort_order ASC, created_at DESC, id DESC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published products")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM products WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published products")?;

    let mut products = Vec::new();
    for row in rows {
        products.push(row_to_product_mysql(&row)?);
    }

    Ok(PagedResult::new(products, count_row.get("count"), params))
}

fn row_to_product_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Product> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(Product {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        summary: row.get("summary"),
        description: row.get("description"),
        image: row.get("image"),
        price_cents: row.get("price_cents"),
        sort_order: row.get("sort_order"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxProductRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxProductRepository::new(pool)
    }

    fn product_input(slug: &str, name: &str) -> CreateProductInput {
        CreateProductInput {
            name: name.to_string(),
            slug: slug.to_string(),
            summary: "A product".to_string(),
            description: "Full description.".to_string(),
            image: None,
            price_cents: Some(19_900),
            sort_order: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;

        let created = repo
            .create(&product_input("widget", "Widget"))
            .await
            .expect("Failed to create product");
        assert!(created.id > 0);
        assert_eq!(created.price_cents, Some(19_900));
        assert_eq!(created.sort_order, 0);

        let found = repo
            .get_by_slug("widget")
            .await
            .expect("Failed to get product")
            .expect("Product not found");
        assert_eq!(found.name, "Widget");
    }

    #[tokio::test]
    async fn test_published_order_respects_sort_order() {
        let repo = setup_test_repo().await;

        let mut first = product_input("b-product", "B");
        first.sort_order = Some(2);
        first.status = Some(ContentStatus::Published);
        repo.create(&first).await.expect("Failed to create product");

        let mut second = product_input("a-product", "A");
        second.sort_order = Some(1);
        second.status = Some(ContentStatus::Published);
        repo.create(&second).await.expect("Failed to create product");

        let listed = repo
            .list_published(&ListParams::default())
            .await
            .expect("Failed to list");
        assert_eq!(listed.items[0].slug, "a-product");
        assert_eq!(listed.items[1].slug, "b-product");
    }

    #[tokio::test]
    async fn test_update_price_and_status() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&product_input("gadget", "Gadget"))
            .await
            .expect("Failed to create product");

        let updated = repo
            .update(
                created.id,
                &UpdateProductInput {
                    price_cents: Some(24_900),
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to update product")
            .expect("Product not found");

        assert_eq!(updated.price_cents, Some(24_900));
        assert_eq!(updated.status, ContentStatus::Published);
        assert_eq!(updated.name, "Gadget");
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&product_input("temp", "Temp"))
            .await
            .expect("Failed to create product");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        let found = repo.get_by_id(created.id).await.expect("Failed to get");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let repo = setup_test_repo().await;
        repo.create(&product_input("taken", "First"))
            .await
            .expect("Failed to create product");

        let result = repo.create(&product_input("taken", "Second")).await;
        assert!(result.is_err());
    }
}
