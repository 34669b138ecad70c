//! Service-catalog service
//!
//! Business logic for the services the company offers.

use crate::db::repositories::ServiceItemRepository;
use crate::models::{ContentStatus, CreateServiceItemInput, ListParams, PagedResult, ServiceItem, UpdateServiceItemInput};
use crate::services::slug::generate_slug;
use anyhow::Context;
use std::sync::Arc;

/// Error types for service-catalog operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceItemError {
    /// Service not found
    #[error("Service not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("Service slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Service managing the company's service catalog
pub struct ServiceItemService {
    repo: Arc<dyn ServiceItemRepository>,
}

impl ServiceItemService {
    /// Create a new service-catalog service
    pub fn new(repo: Arc<dyn ServiceItemRepository>) -> Self {
        Self { repo }
    }

    /// Create a service entry.
    ///
    /// Generates a slug from the name when none is supplied.
    pub async fn create(
        &self,
        mut input: CreateServiceItemInput,
    ) -> Result<ServiceItem, ServiceItemError> {
        self.validate_create_input(&input)?;

        if input.slug.trim().is_empty() {
            input.slug = generate_slug(&input.name);
        }
        if input.slug.is_empty() {
            return Err(ServiceItemError::ValidationError(
                "Could not derive a slug from the name; provide one explicitly".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_slug(&input.slug)
            .await
            .context("Failed to check slug uniqueness")?
        {
            return Err(ServiceItemError::DuplicateSlug(input.slug));
        }

        let service = self
            .repo
            .create(&input)
            .await
            .context("Failed to create service")?;

        Ok(service)
    }

    /// Get a service by ID, any status
    pub async fn get_by_id(&self, id: i64) -> Result<Option<ServiceItem>, ServiceItemError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get service by ID")
            .map_err(Into::into)
    }

    /// Get a published service by slug (public view)
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ServiceItem>, ServiceItemError> {
        let service = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get service by slug")?;

        Ok(service.filter(|s| s.status == ContentStatus::Published))
    }

    /// List services with optional status filter (admin view)
    pub async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<ServiceItem>, ServiceItemError> {
        self.repo
            .list(status, params)
            .await
            .context("Failed to list services")
            .map_err(Into::into)
    }

    /// List published services in display order (public view)
    pub async fn list_published(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<ServiceItem>, ServiceItemError> {
        self.repo
            .list_published(params)
            .await
            .context("Failed to list published services")
            .map_err(Into::into)
    }

    /// Update a service
    pub async fn update(
        &self,
        id: i64,
        input: UpdateServiceItemInput,
    ) -> Result<ServiceItem, ServiceItemError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get service")?
            .ok_or_else(|| {
                ServiceItemError::NotFound(format!("Service with ID {} not found", id))
            })?;

        self.validate_update_input(&input, &existing)?;

        if let Some(ref new_slug) = input.slug {
            if new_slug != &existing.slug
                && self
                    .repo
                    .exists_by_slug(new_slug)
                    .await
                    .context("Failed to check slug uniqueness")?
            {
                return Err(ServiceItemError::DuplicateSlug(new_slug.clone()));
            }
        }

        let updated = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update service")?
            .ok_or_else(|| {
                ServiceItemError::NotFound(format!("Service with ID {} not found", id))
            })?;

        Ok(updated)
    }

    /// Delete a service
    pub async fn delete(&self, id: i64) -> Result<(), ServiceItemError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete service")?;

        if !deleted {
            return Err(ServiceItemError::NotFound(format!(
                "Service with ID {} not found",
                id
            )));
        }

        Ok(())
    }

    fn validate_create_input(&self, input: &CreateServiceItemInput) -> Result<(), ServiceItemError> {
        if input.name.trim().is_empty() {
            return Err(ServiceItemError::ValidationError(
                "Service name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_update_input(
        &self,
        input: &UpdateServiceItemInput,
        existing: &ServiceItem,
    ) -> Result<(), ServiceItemError> {
        let final_name = input.name.as_ref().unwrap_or(&existing.name);
        if final_name.trim().is_empty() {
            return Err(ServiceItemError::ValidationError(
                "Service name cannot be empty".to_string(),
            ));
        }
        if let Some(ref slug) = input.slug {
            if slug.trim().is_empty() {
                return Err(ServiceItemError::ValidationError(
                    "Service slug cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxServiceItemRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, ServiceItemService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = ServiceItemService::new(SqlxServiceItemRepository::boxed(pool.clone()));
        (pool, service)
    }

    fn service_input(name: &str, sort_order: i32) -> CreateServiceItemInput {
        CreateServiceItemInput {
            name: name.to_string(),
            slug: String::new(),
            summary: "Summary".to_string(),
            description: "Description.".to_string(),
            icon: None,
            sort_order: Some(sort_order),
            status: Some(ContentStatus::Published),
        }
    }

    #[tokio::test]
    async fn test_create_generates_slug() {
        let (_pool, service) = setup_test_service().await;

        let item = service
            .create(service_input("Cloud Migration", 1))
            .await
            .expect("Failed to create service");
        assert_eq!(item.slug, "cloud-migration");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let (_pool, service) = setup_test_service().await;

        let result = service.create(service_input("  ", 0)).await;
        assert!(matches!(result, Err(ServiceItemError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_list_published_in_display_order() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(service_input("Support", 3))
            .await
            .expect("Failed to create service");
        service
            .create(service_input("Consulting", 1))
            .await
            .expect("Failed to create service");

        let listed = service
            .list_published(&ListParams::default())
            .await
            .expect("Failed to list");
        assert_eq!(listed.items[0].name, "Consulting");
        assert_eq!(listed.items[1].name, "Support");
    }

    #[tokio::test]
    async fn test_update_reorders() {
        let (_pool, service) = setup_test_service().await;

        let item = service
            .create(service_input("Training", 5))
            .await
            .expect("Failed to create service");

        let updated = service
            .update(
                item.id,
                UpdateServiceItemInput {
                    sort_order: Some(1),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to update service");
        assert_eq!(updated.sort_order, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_service() {
        let (_pool, service) = setup_test_service().await;

        let result = service.delete(9999).await;
        assert!(matches!(result, Err(ServiceItemError::NotFound(_))));
    }
}
