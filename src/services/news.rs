//! News service
//!
//! Business logic for news posts:
//! - Create, read, update, delete with validation
//! - Slug generation and uniqueness
//! - Published/draft visibility rules

use crate::db::repositories::NewsRepository;
use crate::models::{ContentStatus, CreateNewsInput, ListParams, NewsPost, PagedResult, UpdateNewsInput};
use crate::services::slug::generate_slug;
use anyhow::Context;
use std::sync::Arc;

/// Error types for news service operations
#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    /// News post not found
    #[error("News post not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("News slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// News service for managing news posts
pub struct NewsService {
    repo: Arc<dyn NewsRepository>,
}

impl NewsService {
    /// Create a new news service
    pub fn new(repo: Arc<dyn NewsRepository>) -> Self {
        Self { repo }
    }

    /// Create a news post.
    ///
    /// Generates a slug from the title when none is supplied.
    pub async fn create(&self, mut input: CreateNewsInput) -> Result<NewsPost, NewsServiceError> {
        self.validate_create_input(&input)?;

        if input.slug.trim().is_empty() {
            input.slug = generate_slug(&input.title);
        }
        if input.slug.is_empty() {
            return Err(NewsServiceError::ValidationError(
                "Could not derive a slug from the title; provide one explicitly".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_slug(&input.slug)
            .await
            .context("Failed to check slug uniqueness")?
        {
            return Err(NewsServiceError::DuplicateSlug(input.slug));
        }

        let post = self
            .repo
            .create(&input)
            .await
            .context("Failed to create news post")?;

        Ok(post)
    }

    /// Get a news post by ID, any status
    pub async fn get_by_id(&self, id: i64) -> Result<Option<NewsPost>, NewsServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get news post by ID")
            .map_err(Into::into)
    }

    /// Get a news post by slug, any status
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsPost>, NewsServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get news post by slug")
            .map_err(Into::into)
    }

    /// Get a published news post by slug.
    ///
    /// Drafts and archived posts are treated as not found, so the public
    /// site cannot leak unpublished content.
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<NewsPost>, NewsServiceError> {
        let post = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get news post by slug")?;

        Ok(post.filter(|p| p.is_published()))
    }

    /// List news posts with optional status filter (admin view)
    pub async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<NewsPost>, NewsServiceError> {
        self.repo
            .list(status, params)
            .await
            .context("Failed to list news posts")
            .map_err(Into::into)
    }

    /// List published news posts, newest publication first (public view)
    pub async fn list_published(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<NewsPost>, NewsServiceError> {
        self.repo
            .list_published(params)
            .await
            .context("Failed to list published news posts")
            .map_err(Into::into)
    }

    /// Update a news post
    pub async fn update(
        &self,
        id: i64,
        input: UpdateNewsInput,
    ) -> Result<NewsPost, NewsServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get news post")?
            .ok_or_else(|| {
                NewsServiceError::NotFound(format!("News post with ID {} not found", id))
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
                return Err(NewsServiceError::DuplicateSlug(new_slug.clone()));
            }
        }

        let updated = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update news post")?
            .ok_or_else(|| {
                NewsServiceError::NotFound(format!("News post with ID {} not found", id))
            })?;

        Ok(updated)
    }

    /// Delete a news post
    pub async fn delete(&self, id: i64) -> Result<(), NewsServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete news post")?;

        if !deleted {
            return Err(NewsServiceError::NotFound(format!(
                "News post with ID {} not found",
                id
            )));
        }

        Ok(())
    }

    fn validate_create_input(&self, input: &CreateNewsInput) -> Result<(), NewsServiceError> {
        if input.title.trim().is_empty() {
            return Err(NewsServiceError::ValidationError(
                "News title cannot be empty".to_string(),
            ));
        }
        if input.body.trim().is_empty() {
            return Err(NewsServiceError::ValidationError(
                "News body cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_update_input(
        &self,
        input: &UpdateNewsInput,
        existing: &NewsPost,
    ) -> Result<(), NewsServiceError> {
        let final_title = input.title.as_ref().unwrap_or(&existing.title);
        let final_body = input.body.as_ref().unwrap_or(&existing.body);

        if final_title.trim().is_empty() {
            return Err(NewsServiceError::ValidationError(
                "News title cannot be empty".to_string(),
            ));
        }
        if final_body.trim().is_empty() {
            return Err(NewsServiceError::ValidationError(
                "News body cannot be empty".to_string(),
            ));
        }
        if let Some(ref slug) = input.slug {
            if slug.trim().is_empty() {
                return Err(NewsServiceError::ValidationError(
                    "News slug cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
