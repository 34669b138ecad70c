//! Project service
//!
//! Business logic for the project portfolio.

use crate::db::repositories::ProjectRepository;
use crate::models::{ContentStatus, CreateProjectInput, ListParams, PagedResult, Project, UpdateProjectInput};
use crate::services::slug::generate_slug;
use anyhow::Context;
use chrono::NaiveDate;
use std::sync::Arc;

/// Error types for project service operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    /// Project not found
    #[error("Project not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("Project slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Project service for managing the portfolio
pub struct ProjectService {
    repo: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    /// Create a new project service
    pub fn new(repo: Arc<dyn ProjectRepository>) -> Self {
        Self { repo }
    }

    /// Create a project.
    ///
    /// Generates a slug from the name when none is supplied.
    pub async fn create(&self, mut input: CreateProjectInput) -> Result<Project, ProjectServiceError> {
        self.validate_create_input(&input)?;

        if input.slug.trim().is_empty() {
            input.slug = generate_slug(&input.name);
        }
        if input.slug.is_empty() {
            return Err(ProjectServiceError::ValidationError(
                "Could not derive a slug from the name; provide one explicitly".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_slug(&input.slug)
            .await
            .context("Failed to check slug uniqueness")?
        {
            return Err(ProjectServiceError::DuplicateSlug(input.slug));
        }

        let project = self
            .repo
            .create(&input)
            .await
            .context("Failed to create project")?;

        Ok(project)
    }

    /// Get a project by ID, any status
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Project>, ProjectServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get project by ID")
            .map_err(Into::into)
    }

    /// Get a published project by slug (public view)
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Project>, ProjectServiceError> {
        let project = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get project by slug")?;

        Ok(project.filter(|p| p.status == ContentStatus::Published))
    }

    /// List projects with optional status filter (admin view)
    pub async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Project>, ProjectServiceError> {
        self.repo
            .list(status, params)
            .await
            .context("Failed to list projects")
            .map_err(Into::into)
    }

    /// List published projects, newest first (public view)
    pub async fn list_published(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Project>, ProjectServiceError> {
        self.repo
            .list_published(params)
            .await
            .context("Failed to list published projects")
            .map_err(Into::into)
    }

    /// Update a project
    pub async fn update(
        &self,
        id: i64,
        input: UpdateProjectInput,
    ) -> Result<Project, ProjectServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get project")?
            .ok_or_else(|| {
                ProjectServiceError::NotFound(format!("Project with ID {} not found", id))
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
                return Err(ProjectServiceError::DuplicateSlug(new_slug.clone()));
            }
        }

        let updated = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update project")?
            .ok_or_else(|| {
                ProjectServiceError::NotFound(format!("Project with ID {} not found", id))
            })?;

        Ok(updated)
    }

    /// Delete a project
    pub async fn delete(&self, id: i64) -> Result<(), ProjectServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete project")?;

        if !deleted {
            return Err(ProjectServiceError::NotFound(format!(
                "Project with ID {} not found",
                id
            )));
        }

        Ok(())
    }

    fn validate_create_input(&self, input: &CreateProjectInput) -> Result<(), ProjectServiceError> {
        if input.name.trim().is_empty() {
            return Err(ProjectServiceError::ValidationError(
                "Project name cannot be empty".to_string(),
            ));
        }
        validate_date_order(input.started_on, input.completed_on)?;
        Ok(())
    }

    fn validate_update_input(
        &self,
        input: &UpdateProjectInput,
        existing: &Project,
    ) -> Result<(), ProjectServiceError> {
        let final_name = input.name.as_ref().unwrap_or(&existing.name);
        if final_name.trim().is_empty() {
            return Err(ProjectServiceError::ValidationError(
                "Project name cannot be empty".to_string(),
            ));
        }

        let final_started = input.started_on.or(existing.started_on);
        let final_completed = input.completed_on.or(existing.completed_on);
        validate_date_order(final_started, final_completed)?;

        if let Some(ref slug) = input.slug {
            if slug.trim().is_empty() {
                return Err(ProjectServiceError::ValidationError(
                    "Project slug cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn validate_date_order(
    started: Option<NaiveDate>,
    completed: Option<NaiveDate>,
) -> Result<(), ProjectServiceError> {
    if let (Some(start), Some(end)) = (started, completed) {
        if end < start {
            return Err(ProjectServiceError::ValidationError(
                "Completion date cannot precede the start date".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxProjectRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, ProjectService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = ProjectService::new(SqlxProjectRepository::boxed(pool.clone()));
        (pool, service)
    }

    fn project_input(name: &str) -> CreateProjectInput {
        CreateProjectInput {
            name: name.to_string(),
            slug: String::new(),
            summary: "Summary".to_string(),
            description: "Description.".to_string(),
            client: None,
            cover_image: None,
            started_on: NaiveDate::from_ymd_opt(2024, 1, 15),
            completed_on: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_generates_slug() {
        let (_pool, service) = setup_test_service().await;

        let project = service
            .create(project_input("Warehouse Automation"))
            .await
            .expect("Failed to create project");
        assert_eq!(project.slug, "warehouse-automation");
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_dates() {
        let (_pool, service) = setup_test_service().await;

        let mut input = project_input("Backwards");
        input.completed_on = NaiveDate::from_ymd_opt(2023, 12, 1);
        let result = service.create(input).await;
        assert!(matches!(result, Err(ProjectServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_inverted_dates() {
        let (_pool, service) = setup_test_service().await;

        let project = service
            .create(project_input("Timeline"))
            .await
            .expect("Failed to create project");

        let result = service
            .update(
                project.id,
                UpdateProjectInput {
                    completed_on: NaiveDate::from_ymd_opt(2023, 1, 1),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ProjectServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_accepts_valid_completion() {
        let (_pool, service) = setup_test_service().await;

        let project = service
            .create(project_input("Finished"))
            .await
            .expect("Failed to create project");

        let updated = service
            .update(
                project.id,
                UpdateProjectInput {
                    completed_on: NaiveDate::from_ymd_opt(2024, 6, 30),
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to update project");
        assert_eq!(updated.completed_on, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_slug() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(project_input("Same Name"))
            .await
            .expect("Failed to create project");

        let result = service.create(project_input("Same Name")).await;
        assert!(matches!(result, Err(ProjectServiceError::DuplicateSlug(_))));
    }
}
