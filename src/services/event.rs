//! Event service
//!
//! Business logic for company events, including the upcoming-events view.

use crate::db::repositories::EventRepository;
use crate::models::{ContentStatus, CreateEventInput, Event, ListParams, PagedResult, UpdateEventInput};
use crate::services::slug::generate_slug;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types for event service operations
#[derive(Debug, thiserror::Error)]
pub enum EventServiceError {
    /// Event not found
    #[error("Event not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("Event slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Event service for managing events
pub struct EventService {
    repo: Arc<dyn EventRepository>,
}

impl EventService {
    /// Create a new event service
    pub fn new(repo: Arc<dyn EventRepository>) -> Self {
        Self { repo }
    }

    /// Create an event.
    ///
    /// Generates a slug from the title when none is supplied.
    pub async fn create(&self, mut input: CreateEventInput) -> Result<Event, EventServiceError> {
        self.validate_create_input(&input)?;

        if input.slug.trim().is_empty() {
            input.slug = generate_slug(&input.title);
        }
        if input.slug.is_empty() {
            return Err(EventServiceError::ValidationError(
                "Could not derive a slug from the title; provide one explicitly".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_slug(&input.slug)
            .await
            .context("Failed to check slug uniqueness")?
        {
            return Err(EventServiceError::DuplicateSlug(input.slug));
        }

        let event = self
            .repo
            .create(&input)
            .await
            .context("Failed to create event")?;

        Ok(event)
    }

    /// Get an event by ID, any status
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Event>, EventServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get event by ID")
            .map_err(Into::into)
    }

    /// Get a published event by slug (public view)
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Event>, EventServiceError> {
        let event = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get event by slug")?;

        Ok(event.filter(|e| e.status == ContentStatus::Published))
    }

    /// List events with optional status filter (admin view)
    pub async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Event>, EventServiceError> {
        self.repo
            .list(status, params)
            .await
            .context("Failed to list events")
            .map_err(Into::into)
    }

    /// List published events, latest start first (public archive)
    pub async fn list_published(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Event>, EventServiceError> {
        self.repo
            .list_published(params)
            .await
            .context("Failed to list published events")
            .map_err(Into::into)
    }

    /// List published events that have not started yet, soonest first
    pub async fn list_upcoming(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Event>, EventServiceError> {
        self.list_upcoming_after(Utc::now(), params).await
    }

    /// Upcoming events relative to an explicit instant. Split out for tests.
    pub async fn list_upcoming_after(
        &self,
        after: DateTime<Utc>,
        params: &ListParams,
    ) -> Result<PagedResult<Event>, EventServiceError> {
        self.repo
            .list_upcoming(after, params)
            .await
            .context("Failed to list upcoming events")
            .map_err(Into::into)
    }

    /// Update an event
    pub async fn update(&self, id: i64, input: UpdateEventInput) -> Result<Event, EventServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get event")?
            .ok_or_else(|| EventServiceError::NotFound(format!("Event with ID {} not found", id)))?;

        self.validate_update_input(&input, &existing)?;

        if let Some(ref new_slug) = input.slug {
            if new_slug != &existing.slug
                && self
                    .repo
                    .exists_by_slug(new_slug)
                    .await
                    .context("Failed to check slug uniqueness")?
            {
                return Err(EventServiceError::DuplicateSlug(new_slug.clone()));
            }
        }

        let updated = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update event")?
            .ok_or_else(|| EventServiceError::NotFound(format!("Event with ID {} not found", id)))?;

        Ok(updated)
    }

    /// Delete an event
    pub async fn delete(&self, id: i64) -> Result<(), EventServiceError> {
        let deleted = self.repo.delete(id).await.context("Failed to delete event")?;

        if !deleted {
            return Err(EventServiceError::NotFound(format!(
                "Event with ID {} not found",
                id
            )));
        }

        Ok(())
    }

    fn validate_create_input(&self, input: &CreateEventInput) -> Result<(), EventServiceError> {
        if input.title.trim().is_empty() {
            return Err(EventServiceError::ValidationError(
                "Event title cannot be empty".to_string(),
            ));
        }
        validate_time_order(input.starts_at, input.ends_at)?;
        Ok(())
    }

    fn validate_update_input(
        &self,
        input: &UpdateEventInput,
        existing: &Event,
    ) -> Result<(), EventServiceError> {
        let final_title = input.title.as_ref().unwrap_or(&existing.title);
        if final_title.trim().is_empty() {
            return Err(EventServiceError::ValidationError(
                "Event title cannot be empty".to_string(),
            ));
        }

        let final_starts = input.starts_at.unwrap_or(existing.starts_at);
        let final_ends = input.ends_at.or(existing.ends_at);
        validate_time_order(final_starts, final_ends)?;

        if let Some(ref slug) = input.slug {
            if slug.trim().is_empty() {
                return Err(EventServiceError::ValidationError(
                    "Event slug cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn validate_time_order(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), EventServiceError> {
    if let Some(end) = ends_at {
        if end <= starts_at {
            return Err(EventServiceError::ValidationError(
                "Event end time must be after the start time".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxEventRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use chrono::Duration;

    async fn setup_test_service() -> (DynDatabasePool, EventService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = EventService::new(SqlxEventRepository::boxed(pool.clone()));
        (pool, service)
    }

    fn event_input(title: &str, starts_at: DateTime<Utc>) -> CreateEventInput {
        CreateEventInput {
            title: title.to_string(),
            slug: String::new(),
            summary: "Summary".to_string(),
            description: "Details.".to_string(),
            location: None,
            starts_at,
            ends_at: None,
            status: Some(ContentStatus::Published),
        }
    }

    #[tokio::test]
    async fn test_create_generates_slug() {
        let (_pool, service) = setup_test_service().await;

        let event = service
            .create(event_input("Annual Open Day", Utc::now() + Duration::days(14)))
            .await
            .expect("Failed to create event");
        assert_eq!(event.slug, "annual-open-day");
    }

    #[tokio::test]
    async fn test_create_rejects_end_before_start() {
        let (_pool, service) = setup_test_service().await;

        let starts = Utc::now() + Duration::days(7);
        let mut input = event_input("Backwards", starts);
        input.ends_at = Some(starts - Duration::hours(1));

        let result = service.create(input).await;
        assert!(matches!(result, Err(EventServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_end_before_start() {
        let (_pool, service) = setup_test_service().await;

        let starts = Utc::now() + Duration::days(7);
        let event = service
            .create(event_input("Workshop", starts))
            .await
            .expect("Failed to create event");

        let result = service
            .update(
                event.id,
                UpdateEventInput {
                    ends_at: Some(starts - Duration::minutes(30)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(EventServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_upcoming_excludes_past_events() {
        let (_pool, service) = setup_test_service().await;
        let now = Utc::now();

        service
            .create(event_input("Past Meetup", now - Duration::days(10)))
            .await
            .expect("Failed to create event");
        service
            .create(event_input("Future Meetup", now + Duration::days(10)))
            .await
            .expect("Failed to create event");

        let upcoming = service
            .list_upcoming_after(now, &ListParams::default())
            .await
            .expect("Failed to list upcoming");
        assert_eq!(upcoming.total, 1);
        assert_eq!(upcoming.items[0].title, "Future Meetup");
    }

    #[tokio::test]
    async fn test_delete_missing_event() {
        let (_pool, service) = setup_test_service().await;

        let result = service.delete(9999).await;
        assert!(matches!(result, Err(EventServiceError::NotFound(_))));
    }
}
