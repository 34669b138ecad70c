//! Product service
//!
//! Business logic for the product catalog.

use crate::db::repositories::ProductRepository;
use crate::models::{ContentStatus, CreateProductInput, ListParams, PagedResult, Product, UpdateProductInput};
use crate::services::slug::generate_slug;
use anyhow::Context;
use std::sync::Arc;

/// Error types for product service operations
#[derive(Debug, thiserror::Error)]
pub enum ProductServiceError {
    /// Product not found
    #[error("Product not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("Product slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Product service for managing the catalog
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
}

impl ProductService {
    /// Create a new product service
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo }
    }

    /// Create a product.
    ///
    /// Generates a slug from the name when none is supplied.
    pub async fn create(&self, mut input: CreateProductInput) -> Result<Product, ProductServiceError> {
        self.validate_create_input(&input)?;

        if input.slug.trim().is_empty() {
            input.slug = generate_slug(&input.name);
        }
        if input.slug.is_empty() {
            return Err(ProductServiceError::ValidationError(
                "Could not derive a slug from the name; provide one explicitly".to_string(),
            ));
        }

        if self
            .repo
            .exists_by_slug(&input.slug)
            .await
            .context("Failed to check slug uniqueness")?
        {
            return Err(ProductServiceError::DuplicateSlug(input.slug));
        }

        let product = self
            .repo
            .create(&input)
            .await
            .context("Failed to create product")?;

        Ok(product)
    }

    /// Get a product by ID, any status
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Product>, ProductServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get product by ID")
            .map_err(Into::into)
    }

    /// Get a published product by slug (public view)
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Product>, ProductServiceError> {
        let product = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get product by slug")?;

        Ok(product.filter(|p| p.status == ContentStatus::Published))
    }

    /// List products with optional status filter (admin view)
    pub async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Product>, ProductServiceError> {
        self.repo
            .list(status, params)
            .await
            .context("Failed to list products")
            .map_err(Into::into)
    }

    /// List published products in display order (public view)
    pub async fn list_published(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Product>, ProductServiceError> {
        self.repo
            .list_published(params)
            .await
            .context("Failed to list published products")
            .map_err(Into::into)
    }

    /// Update a product
    pub async fn update(
        &self,
        id: i64,
        input: UpdateProductInput,
    ) -> Result<Product, ProductServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get product")?
            .ok_or_else(|| {
                ProductServiceError::NotFound(format!("Product with ID {} not found", id))
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
                return Err(ProductServiceError::DuplicateSlug(new_slug.clone()));
            }
        }

        let updated = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update product")?
            .ok_or_else(|| {
                ProductServiceError::NotFound(format!("Product with ID {} not found", id))
            })?;

        Ok(updated)
    }

    /// Delete a product
    pub async fn delete(&self, id: i64) -> Result<(), ProductServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete product")?;

        if !deleted {
            return Err(ProductServiceError::NotFound(format!(
                "Product with ID {} not found",
                id
            )));
        }

        Ok(())
    }

    fn validate_create_input(&self, input: &CreateProductInput) -> Result<(), ProductServiceError> {
        if input.name.trim().is_empty() {
            return Err(ProductServiceError::ValidationError(
                "Product name cannot be empty".to_string(),
            ));
        }
        if let Some(price) = input.price_cents {
            if price < 0 {
                return Err(ProductServiceError::ValidationError(
                    "Product price cannot be negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn validate_update_input(
        &self,
        input: &UpdateProductInput,
        existing: &Product,
    ) -> Result<(), ProductServiceError> {
        let final_name = input.name.as_ref().unwrap_or(&existing.name);
        if final_name.trim().is_empty() {
            return Err(ProductServiceError::ValidationError(
                "Product name cannot be empty".to_string(),
            ));
        }
        if let Some(price) = input.price_cents {
            if price < 0 {
                return Err(ProductServiceError::ValidationError(
                    "Product price cannot be negative".to_string(),
                ));
            }
        }
        if let Some(ref slug) = input.slug {
            if slug.trim().is_empty() {
                return Err(ProductServiceError::ValidationError(
                    "Product slug cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxProductRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, ProductService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = ProductService::new(SqlxProductRepository::boxed(pool.clone()));
        (pool, service)
    }

    fn product_input(name: &str) -> CreateProductInput {
        CreateProductInput {
            name: name.to_string(),
            slug: String::new(),
            summary: "Summary".to_string(),
            description: "Description.".to_string(),
            price_cents: Some(12_900),
            image: None,
            sort_order: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_generates_slug() {
        let (_pool, service) = setup_test_service().await;

        let product = service
            .create(product_input("Widget Pro 2000"))
            .await
            .expect("Failed to create product");
        assert_eq!(product.slug, "widget-pro-2000");
        assert_eq!(product.price_cents, Some(12_900));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let (_pool, service) = setup_test_service().await;

        let mut input = product_input("Cheap Widget");
        input.price_cents = Some(-5);
        let result = service.create(input).await;
        assert!(matches!(result, Err(ProductServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_slug() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(product_input("Widget"))
            .await
            .expect("Failed to create product");

        let result = service.create(product_input("Widget")).await;
        assert!(matches!(result, Err(ProductServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_public_view_hides_drafts() {
        let (_pool, service) = setup_test_service().await;

        let product = service
            .create(product_input("Unreleased"))
            .await
            .expect("Failed to create product");

        let public = service
            .get_published_by_slug(&product.slug)
            .await
            .expect("Failed to get");
        assert!(public.is_none());

        service
            .update(
                product.id,
                UpdateProductInput {
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to publish");

        assert!(service
            .get_published_by_slug(&product.slug)
            .await
            .expect("Failed to get")
            .is_some());
    }

    #[tokio::test]
    async fn test_update_rejects_negative_price() {
        let (_pool, service) = setup_test_service().await;

        let product = service
            .create(product_input("Widget"))
            .await
            .expect("Failed to create product");

        let result = service
            .update(
                product.id,
                UpdateProductInput {
                    price_cents: Some(-1),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ProductServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let (_pool, service) = setup_test_service().await;

        let result = service.delete(9999).await;
        assert!(matches!(result, Err(ProductServiceError::NotFound(_))));
    }
}
