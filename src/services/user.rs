//! User service
//!
//! Account management for the admin console:
//! - CRUD with username/email uniqueness checks
//! - Password policy enforcement on create and update
//! - Guards: no self-deletion, the last active admin can neither be
//!   deleted nor demoted, authors with news posts cannot be deleted
//! - First-run bootstrap of the initial admin account

use crate::db::repositories::{NewsRepository, UserRepository};
use crate::models::{ListParams, PagedResult, User, UserRole, UserStatus};
use crate::services::password::{hash_password, validate_password_strength};
use crate::services::token::generate_opaque_token;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{2,31}$").expect("valid regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// User not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Defaults to editor
    pub role: Option<UserRole>,
}

/// Input for updating a user; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub password: Option<String>,
}

/// User service for account management
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    news_repo: Arc<dyn NewsRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, news_repo: Arc<dyn NewsRepository>) -> Self {
        Self {
            user_repo,
            news_repo,
        }
    }

    /// Create a new account
    pub async fn create(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        self.validate_create_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(
            input.username,
            input.email,
            password_hash,
            input.role.unwrap_or_default(),
        );

        self.user_repo
            .create(&user)
            .await
            .context("Failed to create user")
            .map_err(Into::into)
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")
            .map_err(Into::into)
    }

    /// List accounts, newest first
    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<User>, UserServiceError> {
        let (items, total) = self
            .user_repo
            .list(params.page as i64, params.per_page as i64)
            .await
            .context("Failed to list users")?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Update an account.
    ///
    /// Changes that would leave the site without an active admin are
    /// refused.
    pub async fn update(&self, id: i64, input: UpdateUserInput) -> Result<User, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound(format!("User with ID {} not found", id)))?;

        if let Some(email) = &input.email {
            if !EMAIL_RE.is_match(email) {
                return Err(UserServiceError::ValidationError(
                    "Invalid email format".to_string(),
                ));
            }
            if email != &user.email {
                if let Some(existing) = self
                    .user_repo
                    .get_by_email(email)
                    .await
                    .context("Failed to check email")?
                {
                    if existing.id != id {
                        return Err(UserServiceError::UserExists(format!(
                            "Email '{}' is already registered",
                            email
                        )));
                    }
                }
                user.email = email.clone();
            }
        }

        let was_active_admin = user.is_admin() && user.is_active();
        let new_role = input.role.unwrap_or(user.role);
        let new_status = input.status.unwrap_or(user.status);
        let stays_active_admin = new_role == UserRole::Admin && new_status == UserStatus::Active;
        if was_active_admin && !stays_active_admin {
            let admins = self
                .user_repo
                .count_active_admins()
                .await
                .context("Failed to count admins")?;
            if admins <= 1 {
                return Err(UserServiceError::ValidationError(
                    "Cannot demote or disable the last administrator".to_string(),
                ));
            }
        }
        user.role = new_role;
        user.status = new_status;

        if let Some(password) = &input.password {
            if let Some(problem) = validate_password_strength(password) {
                return Err(UserServiceError::ValidationError(problem.to_string()));
            }
            user.password_hash = hash_password(password).context("Failed to hash password")?;
        }

        self.user_repo
            .update(&user)
            .await
            .context("Failed to update user")
            .map_err(Into::into)
    }

    /// Delete an account.
    ///
    /// Callers cannot delete themselves, the last active admin stays,
    /// and accounts still referenced as news authors are refused.
    pub async fn delete(&self, id: i64, acting_user: &User) -> Result<(), UserServiceError> {
        if id == acting_user.id {
            return Err(UserServiceError::ValidationError(
                "You cannot delete your own account".to_string(),
            ));
        }

        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound(format!("User with ID {} not found", id)))?;

        if user.is_admin() && user.is_active() {
            let admins = self
                .user_repo
                .count_active_admins()
                .await
                .context("Failed to count admins")?;
            if admins <= 1 {
                return Err(UserServiceError::ValidationError(
                    "Cannot delete the last administrator".to_string(),
                ));
            }
        }

        let authored = self
            .news_repo
            .count_by_author(id)
            .await
            .context("Failed to count authored posts")?;
        if authored > 0 {
            return Err(UserServiceError::ValidationError(format!(
                "User still has {} news post(s); reassign or delete them first",
                authored
            )));
        }

        self.user_repo
            .delete(id)
            .await
            .context("Failed to delete user")
            .map_err(Into::into)
    }

    /// Create the initial admin account if no users exist yet.
    ///
    /// With no explicit password a random one is generated and returned
    /// so the caller can surface it exactly once.
    pub async fn ensure_initial_admin(
        &self,
        password: Option<String>,
    ) -> Result<Option<String>, UserServiceError> {
        let count = self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?;
        if count > 0 {
            return Ok(None);
        }

        let (password, generated) = match password {
            Some(password) => {
                if let Some(problem) = validate_password_strength(&password) {
                    return Err(UserServiceError::ValidationError(problem.to_string()));
                }
                (password, false)
            }
            None => {
                let token = generate_opaque_token()?;
                (token[..16].to_string(), true)
            }
        };

        let password_hash = hash_password(&password).context("Failed to hash password")?;
        self.user_repo
            .create(&User::new(
                "admin".to_string(),
                "admin@example.com".to_string(),
                password_hash,
                UserRole::Admin,
            ))
            .await
            .context("Failed to create initial admin")?;

        Ok(generated.then_some(password))
    }

    fn validate_create_input(&self, input: &CreateUserInput) -> Result<(), UserServiceError> {
        if !USERNAME_RE.is_match(&input.username) {
            return Err(UserServiceError::ValidationError(
                "Username must be 3-32 characters: letters, digits, '_', '.' or '-'".to_string(),
            ));
        }

        if !EMAIL_RE.is_match(&input.email) {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if let Some(problem) = validate_password_strength(&input.password) {
            return Err(UserServiceError::ValidationError(problem.to_string()));
        }

        Ok(())
    }
}
