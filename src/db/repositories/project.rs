//! Project repository
//!
//! Database operations for the project portfolio.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, CreateProjectInput, ListParams, PagedResult, Project, UpdateProjectInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Project repository trait
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Create a new project
    async fn create(&self, input: &CreateProjectInput) -> Result<Project>;

    /// Get project by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Project>>;

    /// Get project by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>>;

    /// Check whether a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Update a project. Returns None when the project does not exist.
    async fn update(&self, id: i64, input: &UpdateProjectInput) -> Result<Option<Project>>;

    /// Delete a project. Returns false when the project does not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List projects with optional status filter, newest first
    async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Project>>;

    /// List published projects, newest first
    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<Project>>;
}

/// SQLx-based project repository implementation
pub struct SqlxProjectRepository {
    pool: DynDatabasePool,
}

impl SqlxProjectRepository {
    /// Create a new SQLx project repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProjectRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepository {
    async fn create(&self, input: &CreateProjectInput) -> Result<Project> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Project>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Project>> {
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

    async fn update(&self, id: i64, input: &UpdateProjectInput) -> Result<Option<Project>> {
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
    ) -> Result<PagedResult<Project>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), status, params).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), status, params).await,
        }
    }

    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<Project>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_published_sqlite(self.pool.as_sqlite().unwrap(), params).await,
            DatabaseDriver::Mysql => list_published_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }
}

const COLUMNS: &str =
    "id, slug, name, summary, description, client, cover_image, started_on, completed_on, status, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateProjectInput) -> Result<Project> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO projects (slug, name, summary, description, client, cover_image, started_on, completed_on, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.summary)
    .bind(&input.description)
    .bind(&input.client)
    .bind(&input.cover_image)
    .bind(input.started_on)
    .bind(input.completed_on)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create project")?;

    Ok(Project {
        id: result.last_insert_rowid(),
        slug: input.slug.clone(),
        name: input.name.clone(),
        summary: input.summary.clone(),
        description: input.description.clone(),
        client: input.client.clone(),
        cover_image: input.cover_image.clone(),
        started_on: input.started_on,
        completed_on: input.completed_on,
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get project by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_project_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get project by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_project_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM projects WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check project slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateProjectInput,
) -> Result<Option<Project>> {
    let existing = match get_by_id_sqlite(pool, id).await? {
        Some(project) => project,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_name = input.name.clone().unwrap_or(existing.name);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_description = input.description.clone().unwrap_or(existing.description);
    let new_client = match &input.client {
        Some(client) if client.is_empty() => None,
        Some(client) => Some(client.clone()),
        None => existing.client,
    };
    let new_cover = match &input.cover_image {
        Some(url) if url.is_empty() => None,
        Some(url) => Some(url.clone()),
        None => existing.cover_image,
    };
    let new_started = input.started_on.or(existing.started_on);
    let new_completed = input.completed_on.or(existing.completed_on);
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE projects
        SET slug = ?, name = ?, summary = ?, description = ?, client = ?, cover_image = ?, started_on = ?, completed_on = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_name)
    .bind(&new_summary)
    .bind(&new_description)
    .bind(&new_client)
    .bind(&new_cover)
    .bind(new_started)
    .bind(new_completed)
    .bind(new_status.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update project")?;

    get_by_id_sqlite(pool, id).await
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete project")?;

    Ok(result.rows_affected() > 0)
}

async fn list_sqlite(
    pool: &SqlitePool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<Project>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM projects WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list projects")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM projects WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count projects")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM projects ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list projects")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM projects")
                .fetch_one(pool)
                .await
                .context("Failed to count projects")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row_to_project_sqlite(&row)?);
    }

    Ok(PagedResult::new(projects, total, params))
}

async fn list_published_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<PagedResult<Project>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM projects WHERE status = 'published' ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published projects")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM projects WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published projects")?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row_to_project_sqlite(&row)?);
    }

    Ok(PagedResult::new(projects, count_row.get("count"), params))
}

fn row_to_project_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Project> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(Project {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        summary: row.get("summary"),
        description: row.get("description"),
        client: row.get("client"),
        cover_image: row.get("cover_image"),
        started_on: row.get("started_on"),
        completed_on: row.get("completed_on"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateProjectInput) -> Result<Project> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO projects (slug, name, summary, description, client, cover_image, started_on, completed_on, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.summary)
    .bind(&input.description)
    .bind(&input.client)
    .bind(&input.cover_image)
    .bind(input.started_on)
    .bind(input.completed_on)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create project")?;

    Ok(Project {
        id: result.last_insert_id() as i64,
        slug: input.slug.clone(),
        name: input.name.clone(),
        summary: input.summary.clone(),
        description: input.description.clone(),
        client: input.client.clone(),
        cover_image: input.cover_image.clone(),
        started_on: input.started_on,
        completed_on: input.completed_on,
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get project by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_project_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Project>> {
    let row = sqlx::query(&format!("SELECT {} FROM projects WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get project by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_project_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM projects WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check project slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateProjectInput,
) -> Result<Option<Project>> {
    let existing = match get_by_id_mysql(pool, id).await? {
        Some(project) => project,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_name = input.name.clone().unwrap_or(existing.name);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_description = input.description.clone().unwrap_or(existing.description);
    let new_client = match &input.client {
        Some(client) if client.is_empty() => None,
        Some(client) => Some(client.clone()),
        None => existing.client,
    };
    let new_cover = match &input.cover_image {
        Some(url) if url.is_empty() => None,
        Some(url) => Some(url.clone()),
        None => existing.cover_image,
    };
    let new_started = input.started_on.or(existing.started_on);
    let new_completed = input.completed_on.or(existing.completed_on);
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE projects
        SET slug = ?, name = ?, summary = ?, description = ?, client = ?, cover_image = ?, started_on = ?, completed_on = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_name)
    .bind(&new_summary)
    .bind(&new_description)
    .bind(&new_client)
    .bind(&new_cover)
    .bind(new_started)
    .bind(new_completed)
    .bind(new_status.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update project")?;

    get_by_id_mysql(pool, id).await
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete project")?;

    Ok(result.rows_affected() > 0)
}

async fn list_mysql(
    pool: &MySqlPool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<Project>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM projects WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list projects")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM projects WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count projects")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM projects ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list projects")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM projects")
                .fetch_one(pool)
                .await
                .context("Failed to count projects")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row_to_project_mysql(&row)?);
    }

    Ok(PagedResult::new(projects, total, params))
}

async fn list_published_mysql(pool: &MySqlPool, params: &ListParams) -> Result<PagedResult<Project>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM projects WHERE status = 'published' ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published projects")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM projects WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published projects")?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row_to_project_mysql(&row)?);
    }

    Ok(PagedResult::new(projects, count_row.get("count"), params))
}

fn row_to_project_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Project> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(Project {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        summary: row.get("summary"),
        description: row.get("description"),
        client: row.get("client"),
        cover_image: row.get("cover_image"),
        started_on: row.get("started_on"),
        completed_on: row.get("completed_on"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::NaiveDate;

    async fn setup_test_repo() -> SqlxProjectRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxProjectRepository::new(pool)
    }

    fn project_input(slug: &str, name: &str) -> CreateProjectInput {
        CreateProjectInput {
            name: name.to_string(),
            slug: slug.to_string(),
            summary: "A project".to_string(),
            description: "Full description.".to_string(),
            client: Some("Acme Corp".to_string()),
            cover_image: None,
            started_on: NaiveDate::from_ymd_opt(2024, 3, 1),
            completed_on: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;

        let created = repo
            .create(&project_input("rebrand", "Rebrand"))
            .await
            .expect("Failed to create project");
        assert!(created.id > 0);
        assert_eq!(created.client.as_deref(), Some("Acme Corp"));
        assert_eq!(created.started_on, NaiveDate::from_ymd_opt(2024, 3, 1));

        let found = repo
            .get_by_slug("rebrand")
            .await
            .expect("Failed to get project")
            .expect("Project not found");
        assert_eq!(found.name, "Rebrand");
        assert!(found.completed_on.is_none());
    }

    #[tokio::test]
    async fn test_update_completion_date() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&project_input("build", "Build"))
            .await
            .expect("Failed to create project");

        let updated = repo
            .update(
                created.id,
                &UpdateProjectInput {
                    completed_on: NaiveDate::from_ymd_opt(2024, 9, 30),
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to update project")
            .expect("Project not found");

        assert_eq!(updated.completed_on, NaiveDate::from_ymd_opt(2024, 9, 30));
        assert_eq!(updated.status, ContentStatus::Published);
    }

    #[tokio::test]
    async fn test_list_published_hides_drafts() {
        let repo = setup_test_repo().await;

        repo.create(&project_input("draft-project", "Draft"))
            .await
            .expect("Failed to create project");
        let mut input = project_input("live-project", "Live");
        input.status = Some(ContentStatus::Published);
        repo.create(&input).await.expect("Failed to create project");

        let listed = repo
            .list_published(&ListParams::default())
            .await
            .expect("Failed to list");
        assert_eq!(listed.total, 1);
        assert_eq!(listed.items[0].slug, "live-project");
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&project_input("temp", "Temp"))
            .await
            .expect("Failed to create project");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get")
            .is_none());
    }
}
