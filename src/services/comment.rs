//! Comment service
//!
//! Business logic for visitor comments on news posts:
//! - Guest submissions queue for moderation, signed-in users post directly
//! - Comments attach only to published news posts
//! - Moderation queue operations for editors

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::models::{Comment, CommentStatus, CreateCommentInput, ListParams, PagedResult, User};
use anyhow::Context;
use std::sync::Arc;

/// Longest accepted comment body in characters
const MAX_COMMENT_LENGTH: usize = 4000;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Comment or target news post not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for submitting a comment through the public API
#[derive(Debug, Clone)]
pub struct SubmitCommentInput {
    pub body: String,
    /// Display name for guest submissions
    pub author_name: Option<String>,
    /// Contact email for guest submissions, never shown publicly
    pub author_email: Option<String>,
}

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    news_repo: Arc<dyn NewsRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>, news_repo: Arc<dyn NewsRepository>) -> Self {
        Self { repo, news_repo }
    }

    /// Submit a comment on a news post.
    ///
    /// Guests land in the moderation queue as pending; comments from
    /// signed-in users are approved immediately. The target post must
    /// exist and be published.
    pub async fn submit(
        &self,
        news_id: i64,
        input: SubmitCommentInput,
        user: Option<&User>,
        ip_address: Option<String>,
    ) -> Result<Comment, CommentServiceError> {
        self.validate_submission(&input, user)?;

        let post = self
            .news_repo
            .get_by_id(news_id)
            .await
            .context("Failed to get news post")?
            .filter(|p| p.is_published())
            .ok_or_else(|| {
                CommentServiceError::NotFound(format!("News post with ID {} not found", news_id))
            })?;

        let status = if user.is_some() {
            CommentStatus::Approved
        } else {
            CommentStatus::Pending
        };

        let create_input = CreateCommentInput {
            news_id: post.id,
            user_id: user.map(|u| u.id),
            // Signed-in users are displayed by their account name
            author_name: match user {
                Some(u) => Some(u.username.clone()),
                None => input.author_name,
            },
            author_email: match user {
                Some(_) => None,
                None => input.author_email,
            },
            body: input.body,
            status: Some(status),
            ip_address,
        };

        let comment = self
            .repo
            .create(&create_input)
            .await
            .context("Failed to create comment")?;

        Ok(comment)
    }

    /// Approved comments on a published news post, oldest first (public view)
    pub async fn list_public(
        &self,
        news_id: i64,
        params: &ListParams,
    ) -> Result<PagedResult<Comment>, CommentServiceError> {
        let post = self
            .news_repo
            .get_by_id(news_id)
            .await
            .context("Failed to get news post")?
            .filter(|p| p.is_published());

        if post.is_none() {
            return Err(CommentServiceError::NotFound(format!(
                "News post with ID {} not found",
                news_id
            )));
        }

        self.repo
            .list_for_news(news_id, true, params)
            .await
            .context("Failed to list comments")
            .map_err(Into::into)
    }

    /// All comments across posts with optional status filter (moderation view)
    pub async fn list(
        &self,
        status: Option<CommentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Comment>, CommentServiceError> {
        self.repo
            .list(status, params)
            .await
            .context("Failed to list comments")
            .map_err(Into::into)
    }

    /// Number of comments waiting for moderation
    pub async fn count_pending(&self) -> Result<i64, CommentServiceError> {
        self.repo
            .count_pending()
            .await
            .context("Failed to count pending comments")
            .map_err(Into::into)
    }

    /// Approve a comment
    pub async fn approve(&self, id: i64) -> Result<(), CommentServiceError> {
        self.set_status(id, CommentStatus::Approved).await
    }

    /// Reject a comment
    pub async fn reject(&self, id: i64) -> Result<(), CommentServiceError> {
        self.set_status(id, CommentStatus::Rejected).await
    }

    /// Delete a comment permanently
    pub async fn delete(&self, id: i64) -> Result<(), CommentServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete comment")?;

        if !deleted {
            return Err(CommentServiceError::NotFound(format!(
                "Comment with ID {} not found",
                id
            )));
        }

        Ok(())
    }

    async fn set_status(&self, id: i64, status: CommentStatus) -> Result<(), CommentServiceError> {
        let updated = self
            .repo
            .update_status(id, status)
            .await
            .context("Failed to update comment status")?;

        if !updated {
            return Err(CommentServiceError::NotFound(format!(
                "Comment with ID {} not found",
                id
            )));
        }

        Ok(())
    }

    fn validate_submission(
        &self,
        input: &SubmitCommentInput,
        user: Option<&User>,
    ) -> Result<(), CommentServiceError> {
        if input.body.trim().is_empty() {
            return Err(CommentServiceError::ValidationError(
                "Comment body cannot be empty".to_string(),
            ));
        }
        if input.body.chars().count() > MAX_COMMENT_LENGTH {
            return Err(CommentServiceError::ValidationError(format!(
                "Comment body cannot exceed {} characters",
                MAX_COMMENT_LENGTH
            )));
        }

        // Guests must identify themselves
        if user.is_none() {
            let has_name = input
                .author_name
                .as_ref()
                .is_some_and(|n| !n.trim().is_empty());
            if !has_name {
                return Err(CommentServiceError::ValidationError(
                    "Guest comments require a name".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxNewsRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{ContentStatus, CreateNewsInput, UserRole};

    async fn setup_test_service() -> (DynDatabasePool, CommentService, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let author = create_user(&pool, "author").await;
        let news_repo = SqlxNewsRepository::new(pool.clone());
        let post = news_repo
            .create(&CreateNewsInput {
                title: "Launch".to_string(),
                slug: "launch".to_string(),
                summary: "Summary".to_string(),
                body: "Body".to_string(),
                cover_image: None,
                author_id: author.id,
                status: Some(ContentStatus::Published),
            })
            .await
            .expect("Failed to create news post");

        let service = CommentService::new(
            SqlxCommentRepository::boxed(pool.clone()),
            SqlxNewsRepository::boxed(pool.clone()),
        );
        (pool, service, post.id)
    }

    async fn create_user(pool: &DynDatabasePool, username: &str) -> User {
        SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                username.to_string(),
                format!("{}@example.com", username),
                "hash".to_string(),
                UserRole::Editor,
            ))
            .await
            .expect("Failed to create user")
    }

    fn guest_input(body: &str) -> SubmitCommentInput {
        SubmitCommentInput {
            body: body.to_string(),
            author_name: Some("Visitor".to_string()),
            author_email: Some("visitor@example.com".to_string()),
        }
    }

    #[tokio::test]
    async fn test_guest_comment_is_pending() {
        let (_pool, service, news_id) = setup_test_service().await;

        let comment = service
            .submit(news_id, guest_input("Great news!"), None, None)
            .await
            .expect("Failed to submit comment");
        assert_eq!(comment.status, CommentStatus::Pending);
        assert_eq!(comment.author_name.as_deref(), Some("Visitor"));
    }

    #[tokio::test]
    async fn test_signed_in_comment_is_approved() {
        let (pool, service, news_id) = setup_test_service().await;
        let user = create_user(&pool, "editor").await;

        let comment = service
            .submit(
                news_id,
                SubmitCommentInput {
                    body: "Posting as staff".to_string(),
                    author_name: None,
                    author_email: None,
                },
                Some(&user),
                None,
            )
            .await
            .expect("Failed to submit comment");
        assert_eq!(comment.status, CommentStatus::Approved);
        assert_eq!(comment.author_name.as_deref(), Some("editor"));
        assert_eq!(comment.user_id, Some(user.id));
    }

    #[tokio::test]
    async fn test_guest_without_name_rejected() {
        let (_pool, service, news_id) = setup_test_service().await;

        let result = service
            .submit(
                news_id,
                SubmitCommentInput {
                    body: "Anonymous".to_string(),
                    author_name: None,
                    author_email: None,
                },
                None,
                None,
            )
            .await;
        assert!(matches!(result, Err(CommentServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_fails() {
        let (_pool, service, _news_id) = setup_test_service().await;

        let result = service
            .submit(9999, guest_input("Hello?"), None, None)
            .await;
        assert!(matches!(result, Err(CommentServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_comment_on_draft_post_fails() {
        let (pool, service, _news_id) = setup_test_service().await;

        let author = create_user(&pool, "second-author").await;
        let news_repo = SqlxNewsRepository::new(pool.clone());
        let draft = news_repo
            .create(&CreateNewsInput {
                title: "Draft".to_string(),
                slug: "draft".to_string(),
                summary: "Summary".to_string(),
                body: "Body".to_string(),
                cover_image: None,
                author_id: author.id,
                status: None,
            })
            .await
            .expect("Failed to create draft");

        let result = service
            .submit(draft.id, guest_input("Sneaky"), None, None)
            .await;
        assert!(matches!(result, Err(CommentServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_overlong_body_rejected() {
        let (_pool, service, news_id) = setup_test_service().await;

        let result = service
            .submit(news_id, guest_input(&"x".repeat(MAX_COMMENT_LENGTH + 1)), None, None)
            .await;
        assert!(matches!(result, Err(CommentServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_moderation_flow() {
        let (_pool, service, news_id) = setup_test_service().await;

        let comment = service
            .submit(news_id, guest_input("Needs review"), None, None)
            .await
            .expect("Failed to submit comment");

        assert_eq!(service.count_pending().await.expect("count"), 1);

        // Invisible to the public until approved
        let public = service
            .list_public(news_id, &ListParams::default())
            .await
            .expect("Failed to list");
        assert_eq!(public.total, 0);

        service.approve(comment.id).await.expect("Failed to approve");

        let public = service
            .list_public(news_id, &ListParams::default())
            .await
            .expect("Failed to list");
        assert_eq!(public.total, 1);
        assert_eq!(service.count_pending().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_approve_missing_comment() {
        let (_pool, service, _news_id) = setup_test_service().await;

        let result = service.approve(9999).await;
        assert!(matches!(result, Err(CommentServiceError::NotFound(_))));
    }
}
