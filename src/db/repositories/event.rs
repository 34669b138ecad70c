//! Event repository
//!
//! Database operations for company events.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, CreateEventInput, Event, ListParams, PagedResult, UpdateEventInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Event repository trait
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Create a new event
    async fn create(&self, input: &CreateEventInput) -> Result<Event>;

    /// Get event by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Event>>;

    /// Get event by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>>;

    /// Check whether a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Update an event. Returns None when the event does not exist.
    async fn update(&self, id: i64, input: &UpdateEventInput) -> Result<Option<Event>>;

    /// Delete an event. Returns false when the event does not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List events with optional status filter, latest start first
    async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Event>>;

    /// List published events, latest start first
    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<Event>>;

    /// List published events starting after the given instant, soonest first
    async fn list_upcoming(
        &self,
        after: DateTime<Utc>,
        params: &ListParams,
    ) -> Result<PagedResult<Event>>;
}

/// SQLx-based event repository implementation
pub struct SqlxEventRepository {
    pool: DynDatabasePool,
}

impl SqlxEventRepository {
    /// Create a new SQLx event repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EventRepository for SqlxEventRepository {
    async fn create(&self, input: &CreateEventInput) -> Result<Event> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Event>> {
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

    async fn update(&self, id: i64, input: &UpdateEventInput) -> Result<Option<Event>> {
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
    ) -> Result<PagedResult<Event>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), status, params).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), status, params).await,
        }
    }

    async fn list_published(&self, params: &ListParams) -> Result<PagedResult<Event>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_published_sqlite(self.pool.as_sqlite().unwrap(), params).await,
            DatabaseDriver::Mysql => list_published_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }

    async fn list_upcoming(
        &self,
        after: DateTime<Utc>,
        params: &ListParams,
    ) -> Result<PagedResult<Event>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_upcoming_sqlite(self.pool.as_sqlite().unwrap(), after, params).await
            }
            DatabaseDriver::Mysql => {
                list_upcoming_mysql(self.pool.as_mysql().unwrap(), after, params).await
            }
        }
    }
}

const COLUMNS: &str =
    "id, slug, title, summary, description, location, starts_at, ends_at, status, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, input: &CreateEventInput) -> Result<Event> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO events (slug, title, summary, description, location, starts_at, ends_at, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.description)
    .bind(&input.location)
    .bind(input.starts_at)
    .bind(input.ends_at)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create event")?;

    Ok(Event {
        id: result.last_insert_rowid(),
        slug: input.slug.clone(),
        title: input.title.clone(),
        summary: input.summary.clone(),
        description: input.description.clone(),
        location: input.location.clone(),
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Event>> {
    let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get event by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_event_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Event>> {
    let row = sqlx::query(&format!("SELECT {} FROM events WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get event by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_event_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM events WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check event slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_sqlite(pool: &SqlitePool, id: i64, input: &UpdateEventInput) -> Result<Option<Event>> {
    let existing = match get_by_id_sqlite(pool, id).await? {
        Some(event) => event,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_title = input.title.clone().unwrap_or(existing.title);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_description = input.description.clone().unwrap_or(existing.description);
    let new_location = match &input.location {
        Some(location) if location.is_empty() => None,
        Some(location) => Some(location.clone()),
        None => existing.location,
    };
    let new_starts_at = input.starts_at.unwrap_or(existing.starts_at);
    let new_ends_at = input.ends_at.or(existing.ends_at);
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE events
        SET slug = ?, title = ?, summary = ?, description = ?, location = ?, starts_at = ?, ends_at = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_title)
    .bind(&new_summary)
    .bind(&new_description)
    .bind(&new_location)
    .bind(new_starts_at)
    .bind(new_ends_at)
    .bind(new_status.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update event")?;

    get_by_id_sqlite(pool, id).await
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete event")?;

    Ok(result.rows_affected() > 0)
}

async fn list_sqlite(
    pool: &SqlitePool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<Event>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM events WHERE status = ? ORDER BY starts_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list events")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM events WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count events")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM events ORDER BY starts_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list events")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM events")
                .fetch_one(pool)
                .await
                .context("Failed to count events")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut events = Vec::new();
    for row in rows {
        events.push(row_to_event_sqlite(&row)?);
    }

    Ok(PagedResult::new(events, total, params))
}

async fn list_published_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<PagedResult<Event>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM events WHERE status = 'published' ORDER BY starts_at DESC, id DESC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published events")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM events WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published events")?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row_to_event_sqlite(&row)?);
    }

    Ok(PagedResult::new(events, count_row.get("count"), params))
}

async fn list_upcoming_sqlite(
    pool: &SqlitePool,
    after: DateTime<Utc>,
    params: &ListParams,
) -> Result<PagedResult<Event>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM events WHERE status = 'published' AND starts_at > ? ORDER BY starts_at ASC, id ASC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(after)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list upcoming events")?;

    let count_row = sqlx::query(
        "SELECT COUNT(*) as count FROM events WHERE status = 'published' AND starts_at > ?",
    )
    .bind(after)
    .fetch_one(pool)
    .await
    .context("Failed to count upcoming events")?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row_to_event_sqlite(&row)?);
    }

    Ok(PagedResult::new(events, count_row.get("count"), params))
}

fn row_to_event_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Event> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(Event {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        summary: row.get("summary"),
        description: row.get("description"),
        location: row.get("location"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, input: &CreateEventInput) -> Result<Event> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO events (slug, title, summary, description, location, starts_at, ends_at, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.description)
    .bind(&input.location)
    .bind(input.starts_at)
    .bind(input.ends_at)
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create event")?;

    Ok(Event {
        id: result.last_insert_id() as i64,
        slug: input.slug.clone(),
        title: input.title.clone(),
        summary: input.summary.clone(),
        description: input.description.clone(),
        location: input.location.clone(),
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Event>> {
    let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get event by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_event_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Event>> {
    let row = sqlx::query(&format!("SELECT {} FROM events WHERE slug = ?", COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get event by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_event_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn exists_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM events WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check event slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn update_mysql(pool: &MySqlPool, id: i64, input: &UpdateEventInput) -> Result<Option<Event>> {
    let existing = match get_by_id_mysql(pool, id).await? {
        Some(event) => event,
        None => return Ok(None),
    };

    let now = Utc::now();
    let new_title = input.title.clone().unwrap_or(existing.title);
    let new_slug = input.slug.clone().unwrap_or(existing.slug);
    let new_summary = input.summary.clone().unwrap_or(existing.summary);
    let new_description = input.description.clone().unwrap_or(existing.description);
    let new_location = match &input.location {
        Some(location) if location.is_empty() => None,
        Some(location) => Some(location.clone()),
        None => existing.location,
    };
    let new_starts_at = input.starts_at.unwrap_or(existing.starts_at);
    let new_ends_at = input.ends_at.or(existing.ends_at);
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE events
        SET slug = ?, title = ?, summary = ?, description = ?, location = ?, starts_at = ?, ends_at = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&new_slug)
    .bind(&new_title)
    .bind(&new_summary)
    .bind(&new_description)
    .bind(&new_location)
    .bind(new_starts_at)
    .bind(new_ends_at)
    .bind(new_status.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update event")?;

    get_by_id_mysql(pool, id).await
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete event")?;

    Ok(result.rows_affected() > 0)
}

async fn list_mysql(
    pool: &MySqlPool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<PagedResult<Event>> {
    let (rows, total) = match status {
        Some(status) => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM events WHERE status = ? ORDER BY starts_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(status.as_str())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list events")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM events WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(pool)
                .await
                .context("Failed to count events")?;
            (rows, count_row.get::<i64, _>("count"))
        }
        None => {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM events ORDER BY starts_at DESC, id DESC LIMIT ? OFFSET ?",
                COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list events")?;

            let count_row = sqlx::query("SELECT COUNT(*) as count FROM events")
                .fetch_one(pool)
                .await
                .context("Failed to count events")?;
            (rows, count_row.get::<i64, _>("count"))
        }
    };

    let mut events = Vec::new();
    for row in rows {
        events.push(row_to_event_mysql(&row)?);
    }

    Ok(PagedResult::new(events, total, params))
}

async fn list_published_mysql(pool: &MySqlPool, params: &ListParams) -> Result<PagedResult<Event>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM events WHERE status = 'published' ORDER BY starts_at DESC, id DESC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list published events")?;

    let count_row = sqlx::query("SELECT COUNT(*) as count FROM events WHERE status = 'published'")
        .fetch_one(pool)
        .await
        .context("Failed to count published events")?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row_to_event_mysql(&row)?);
    }

    Ok(PagedResult::new(events, count_row.get("count"), params))
}

async fn list_upcoming_mysql(
    pool: &MySqlPool,
    after: DateTime<Utc>,
    params: &ListParams,
) -> Result<PagedResult<Event>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM events WHERE status = 'published' AND starts_at > ? ORDER BY starts_at ASC, id ASC LIMIT ? OFFSET ?",
        COLUMNS
    ))
    .bind(after)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list upcoming events")?;

    let count_row = sqlx::query(
        "SELECT COUNT(*) as count FROM events WHERE status = 'published' AND starts_at > ?",
    )
    .bind(after)
    .fetch_one(pool)
    .await
    .context("Failed to count upcoming events")?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row_to_event_mysql(&row)?);
    }

    Ok(PagedResult::new(events, count_row.get("count"), params))
}

fn row_to_event_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Event> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    Ok(Event {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        summary: row.get("summary"),
        description: row.get("description"),
        location: row.get("location"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup_test_repo() -> SqlxEventRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxEventRepository::new(pool)
    }

    fn event_input(slug: &str, title: &str, starts_at: DateTime<Utc>) -> CreateEventInput {
        CreateEventInput {
            title: title.to_string(),
            slug: slug.to_string(),
            summary: "An event".to_string(),
            description: "Event details.".to_string(),
            location: Some("Main office".to_string()),
            starts_at,
            ends_at: None,
            status: Some(ContentStatus::Published),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;
        let starts = Utc::now() + Duration::days(7);

        let created = repo
            .create(&event_input("open-house", "Open House", starts))
            .await
            .expect("Failed to create event");
        assert_eq!(created.location.as_deref(), Some("Main office"));

        let found = repo
            .get_by_slug("open-house")
            .await
            .expect("Failed to get event")
            .expect("Event not found");
        assert_eq!(found.title, "Open House");
        assert_eq!(found.description, "Event details.");
        assert!(found.ends_at.is_none());
    }

    #[tokio::test]
    async fn test_list_upcoming_orders_soonest_first() {
        let repo = setup_test_repo().await;
        let now = Utc::now();

        repo.create(&event_input("past", "Past", now - Duration::days(30)))
            .await
            .expect("Failed to create event");
        repo.create(&event_input("far", "Far", now + Duration::days(60)))
            .await
            .expect("Failed to create event");
        repo.create(&event_input("soon", "Soon", now + Duration::days(3)))
            .await
            .expect("Failed to create event");

        let upcoming = repo
            .list_upcoming(now, &ListParams::default())
            .await
            .expect("Failed to list upcoming");
        let slugs: Vec<&str> = upcoming.items.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["soon", "far"]);
    }

    #[tokio::test]
    async fn test_list_upcoming_skips_drafts() {
        let repo = setup_test_repo().await;
        let now = Utc::now();

        let mut input = event_input("draft-event", "Draft", now + Duration::days(5));
        input.status = Some(ContentStatus::Draft);
        repo.create(&input).await.expect("Failed to create event");

        let upcoming = repo
            .list_upcoming(now, &ListParams::default())
            .await
            .expect("Failed to list upcoming");
        assert_eq!(upcoming.total, 0);
    }

    #[tokio::test]
    async fn test_update_reschedule() {
        let repo = setup_test_repo().await;
        let starts = Utc::now() + Duration::days(10);
        let created = repo
            .create(&event_input("meetup", "Meetup", starts))
            .await
            .expect("Failed to create event");

        let new_start = starts + Duration::days(4);
        let updated = repo
            .update(
                created.id,
                &UpdateEventInput {
                    starts_at: Some(new_start),
                    ends_at: Some(new_start + Duration::hours(2)),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to update event")
            .expect("Event not found");
        assert_eq!(updated.starts_at, new_start);
        assert!(updated.ends_at.is_some());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&event_input("temp", "Temp", Utc::now()))
            .await
            .expect("Failed to create event");

        assert!(repo.delete(created.id).await.expect("Failed to delete"));
        assert!(repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get")
            .is_none());
    }
}
