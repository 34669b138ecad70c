//! Authentication service
//!
//! Implements the full credential lifecycle:
//! - Login with per-username and per-IP rate limiting
//! - Short-lived JWT access tokens paired with rotating refresh tokens
//! - Refresh token reuse detection (a replayed token kills every session)
//! - Password reset via emailed single-use tokens
//! - An audit trail of every authentication event

use crate::config::AuthConfig;
use crate::db::repositories::{
    AuthLogRepository, PasswordResetRepository, RefreshTokenRepository, UserRepository,
};
use crate::models::{auth_action, CreateAuthLogInput, CreateRefreshTokenInput, User};
use crate::services::email::EmailService;
use crate::services::password::{hash_password, validate_password_strength, verify_password};
use crate::services::rate_limiter::AuthRateLimiter;
use crate::services::token::{
    generate_access_token, generate_opaque_token, token_digest, verify_token_digest,
};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::net::IpAddr;
use std::sync::Arc;

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// The account exists but may not sign in
    #[error("Account disabled")]
    AccountDisabled,

    /// Too many attempts from this client or for this account
    #[error("Too many attempts, retry in {retry_after} seconds")]
    RateLimited { retry_after: i64 },

    /// Token is unknown, expired, revoked, or already used
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for the login operation
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Signed JWT, sent as `Authorization: Bearer`
    pub access_token: String,
    /// Opaque rotating token; the only copy of the plaintext
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Client metadata attached to auth events and issued sessions
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    fn ip(&self) -> Option<IpAddr> {
        self.ip_address.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Authentication service
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    refresh_repo: Arc<dyn RefreshTokenRepository>,
    reset_repo: Arc<dyn PasswordResetRepository>,
    auth_log_repo: Arc<dyn AuthLogRepository>,
    rate_limiter: Arc<AuthRateLimiter>,
    email: Arc<EmailService>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        refresh_repo: Arc<dyn RefreshTokenRepository>,
        reset_repo: Arc<dyn PasswordResetRepository>,
        auth_log_repo: Arc<dyn AuthLogRepository>,
        rate_limiter: Arc<AuthRateLimiter>,
        email: Arc<EmailService>,
        config: AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            refresh_repo,
            reset_repo,
            auth_log_repo,
            rate_limiter,
            email,
            config,
        }
    }

    /// Login with credentials.
    ///
    /// Rate limits apply before credentials are checked: per client IP
    /// and per username. Unknown users and wrong passwords produce the
    /// same generic error. Every attempt lands in the audit log.
    pub async fn login(
        &self,
        input: LoginInput,
        client: &ClientInfo,
    ) -> Result<(User, IssuedTokens), AuthServiceError> {
        if let Some(ip) = client.ip() {
            if let Some(retry_after) = self.rate_limiter.check_ip(ip).await {
                self.log_event(
                    None,
                    &input.username_or_email,
                    auth_action::LOGIN_FAILED,
                    client,
                    false,
                    Some("IP rate limit exceeded".to_string()),
                )
                .await;
                return Err(AuthServiceError::RateLimited { retry_after });
            }
        }

        if let Some(retry_after) = self.rate_limiter.check_username(&input.username_or_email).await
        {
            self.log_event(
                None,
                &input.username_or_email,
                auth_action::LOGIN_FAILED,
                client,
                false,
                Some("Username rate limit exceeded".to_string()),
            )
            .await;
            return Err(AuthServiceError::RateLimited { retry_after });
        }

        let user = match self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
        {
            Some(user) => user,
            None => {
                self.rate_limiter
                    .record_failed_attempt(&input.username_or_email)
                    .await;
                self.log_event(
                    None,
                    &input.username_or_email,
                    auth_action::LOGIN_FAILED,
                    client,
                    false,
                    Some("Unknown user".to_string()),
                )
                .await;
                return Err(AuthServiceError::AuthenticationError(
                    "Invalid username or password".to_string(),
                ));
            }
        };

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            self.rate_limiter
                .record_failed_attempt(&input.username_or_email)
                .await;
            self.log_event(
                Some(user.id),
                &input.username_or_email,
                auth_action::LOGIN_FAILED,
                client,
                false,
                Some("Invalid password".to_string()),
            )
            .await;
            return Err(AuthServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        if !user.is_active() {
            self.log_event(
                Some(user.id),
                &input.username_or_email,
                auth_action::LOGIN_FAILED,
                client,
                false,
                Some("Account disabled".to_string()),
            )
            .await;
            return Err(AuthServiceError::AccountDisabled);
        }

        let tokens = self.issue_tokens(&user, client).await?;

        self.rate_limiter
            .clear_username(&input.username_or_email)
            .await;
        self.log_event(Some(user.id), &user.username, auth_action::LOGIN, client, true, None)
            .await;

        Ok((user, tokens))
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The presented token is revoked (rotation). Presenting a token
    /// that was already revoked is treated as theft: every session of
    /// that user is revoked before the request is rejected.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client: &ClientInfo,
    ) -> Result<(User, IssuedTokens), AuthServiceError> {
        let digest = token_digest(refresh_token, &self.config.token_key);
        let stored = self
            .refresh_repo
            .find_by_token_hash(&digest)
            .await
            .context("Failed to look up refresh token")?
            .ok_or(AuthServiceError::InvalidToken)?;

        let user = self
            .user_repo
            .get_by_id(stored.user_id)
            .await
            .context("Failed to get user")?;

        if stored.is_revoked() {
            let revoked = self
                .refresh_repo
                .revoke_all_for_user(stored.user_id)
                .await
                .context("Failed to revoke sessions")?;
            let username = user.map(|u| u.username).unwrap_or_default();
            self.log_event(
                Some(stored.user_id),
                &username,
                auth_action::REFRESH_REUSED,
                client,
                false,
                Some(format!("Revoked {} session(s)", revoked)),
            )
            .await;
            return Err(AuthServiceError::InvalidToken);
        }

        if stored.is_expired() {
            return Err(AuthServiceError::InvalidToken);
        }

        let user = user.ok_or(AuthServiceError::InvalidToken)?;
        if !user.is_active() {
            return Err(AuthServiceError::AccountDisabled);
        }

        // Rotation claim: only one presentation may revoke the row.
        // Losing that race means a second copy of the token is in
        // flight, which is reuse.
        let claimed = self
            .refresh_repo
            .revoke(stored.id)
            .await
            .context("Failed to revoke refresh token")?;
        if !claimed {
            let revoked = self
                .refresh_repo
                .revoke_all_for_user(stored.user_id)
                .await
                .context("Failed to revoke sessions")?;
            self.log_event(
                Some(stored.user_id),
                &user.username,
                auth_action::REFRESH_REUSED,
                client,
                false,
                Some(format!("Revoked {} session(s)", revoked)),
            )
            .await;
            return Err(AuthServiceError::InvalidToken);
        }

        let tokens = self.issue_tokens(&user, client).await?;
        self.log_event(Some(user.id), &user.username, auth_action::REFRESH, client, true, None)
            .await;

        Ok((user, tokens))
    }

    /// Revoke one of the caller's sessions.
    ///
    /// The token must belong to the calling user.
    pub async fn logout(
        &self,
        user: &User,
        refresh_token: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthServiceError> {
        let digest = token_digest(refresh_token, &self.config.token_key);
        let stored = self
            .refresh_repo
            .find_by_token_hash(&digest)
            .await
            .context("Failed to look up refresh token")?
            .filter(|t| t.user_id == user.id)
            .ok_or(AuthServiceError::InvalidToken)?;

        self.refresh_repo
            .revoke(stored.id)
            .await
            .context("Failed to revoke refresh token")?;
        self.log_event(Some(user.id), &user.username, auth_action::LOGOUT, client, true, None)
            .await;

        Ok(())
    }

    /// Revoke every session of the caller. Returns the number revoked.
    pub async fn logout_all(
        &self,
        user: &User,
        client: &ClientInfo,
    ) -> Result<u64, AuthServiceError> {
        let revoked = self
            .refresh_repo
            .revoke_all_for_user(user.id)
            .await
            .context("Failed to revoke sessions")?;
        self.log_event(
            Some(user.id),
            &user.username,
            auth_action::LOGOUT_ALL,
            client,
            true,
            Some(format!("Revoked {} session(s)", revoked)),
        )
        .await;

        Ok(revoked)
    }

    /// Start the password reset flow for an email address.
    ///
    /// Always succeeds, whether or not the address belongs to an
    /// account. When it does, outstanding reset tokens are invalidated
    /// and a fresh single-use token is emailed.
    pub async fn forgot_password(
        &self,
        email: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthServiceError> {
        let user = match self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to get user by email")?
        {
            Some(user) if user.is_active() => user,
            _ => return Ok(()),
        };

        self.reset_repo
            .invalidate_for_user(user.id)
            .await
            .context("Failed to invalidate reset tokens")?;

        let reset_token = generate_opaque_token()?;
        let expires_at = Utc::now() + Duration::minutes(self.config.reset_token_ttl_minutes);
        self.reset_repo
            .create(
                user.id,
                &token_digest(&reset_token, &self.config.token_key),
                expires_at,
            )
            .await
            .context("Failed to store reset token")?;

        self.log_event(
            Some(user.id),
            &user.username,
            auth_action::RESET_REQUESTED,
            client,
            true,
            None,
        )
        .await;

        if let Err(e) = self.email.send_password_reset(&user.email, &reset_token).await {
            tracing::warn!("Failed to send password reset email: {}", e);
        }

        Ok(())
    }

    /// Complete a password reset with an emailed token.
    ///
    /// The token must be unused and unexpired; it is consumed here.
    /// All refresh tokens of the user are revoked.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthServiceError> {
        if let Some(problem) = validate_password_strength(new_password) {
            return Err(AuthServiceError::ValidationError(problem.to_string()));
        }

        let digest = token_digest(reset_token, &self.config.token_key);
        let stored = self
            .reset_repo
            .find_by_token_hash(&digest)
            .await
            .context("Failed to look up reset token")?
            .filter(|t| t.is_usable())
            .ok_or(AuthServiceError::InvalidToken)?;

        // Constant-time re-check of the presented token against the row
        if !verify_token_digest(reset_token, &self.config.token_key, &stored.token_hash) {
            return Err(AuthServiceError::InvalidToken);
        }

        let mut user = self
            .user_repo
            .get_by_id(stored.user_id)
            .await
            .context("Failed to get user")?
            .ok_or(AuthServiceError::InvalidToken)?;

        // Single-use guard: claim the token before changing anything
        let claimed = self
            .reset_repo
            .mark_used(stored.id)
            .await
            .context("Failed to mark reset token used")?;
        if !claimed {
            return Err(AuthServiceError::InvalidToken);
        }

        user.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        self.refresh_repo
            .revoke_all_for_user(user.id)
            .await
            .context("Failed to revoke sessions")?;
        self.log_event(
            Some(user.id),
            &user.username,
            auth_action::RESET_COMPLETED,
            client,
            true,
            None,
        )
        .await;

        Ok(())
    }

    /// Change the password of a signed-in user.
    ///
    /// Verifies the current password first. All refresh tokens of the
    /// user are revoked.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthServiceError> {
        let current_valid = verify_password(current_password, &user.password_hash)
            .context("Failed to verify password")?;
        if !current_valid {
            return Err(AuthServiceError::AuthenticationError(
                "Current password is incorrect".to_string(),
            ));
        }

        if let Some(problem) = validate_password_strength(new_password) {
            return Err(AuthServiceError::ValidationError(problem.to_string()));
        }

        let mut updated = user.clone();
        updated.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo
            .update(&updated)
            .await
            .context("Failed to update user")?;

        self.refresh_repo
            .revoke_all_for_user(user.id)
            .await
            .context("Failed to revoke sessions")?;
        self.log_event(
            Some(user.id),
            &user.username,
            auth_action::PASSWORD_CHANGED,
            client,
            true,
            None,
        )
        .await;

        Ok(())
    }

    /// Resolve a bearer access token to its user.
    ///
    /// Rejects tokens whose signature or expiry fails, whose user no
    /// longer exists, or whose account has been disabled since issue.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AuthServiceError> {
        let claims = crate::services::token::validate_access_token(access_token, &self.config)
            .map_err(|_| AuthServiceError::InvalidToken)?;

        let user = self
            .user_repo
            .get_by_id(claims.sub)
            .await
            .context("Failed to get user")?
            .ok_or(AuthServiceError::InvalidToken)?;

        if !user.is_active() {
            return Err(AuthServiceError::AccountDisabled);
        }

        Ok(user)
    }

    /// Purge expired tokens and stale rate limiter entries.
    ///
    /// Meant to run periodically from a background task.
    pub async fn cleanup(&self) -> Result<(), AuthServiceError> {
        let refresh = self
            .refresh_repo
            .delete_expired()
            .await
            .context("Failed to purge refresh tokens")?;
        let resets = self
            .reset_repo
            .delete_expired()
            .await
            .context("Failed to purge reset tokens")?;
        if refresh > 0 || resets > 0 {
            tracing::debug!(
                "Purged {} expired refresh token(s) and {} reset token(s)",
                refresh,
                resets
            );
        }
        self.rate_limiter.cleanup().await;
        Ok(())
    }

    async fn issue_tokens(
        &self,
        user: &User,
        client: &ClientInfo,
    ) -> Result<IssuedTokens, AuthServiceError> {
        let access_token = generate_access_token(user.id, &user.role.to_string(), &self.config)
            .context("Failed to sign access token")?;

        let refresh_token = generate_opaque_token()?;
        let expires_at = Utc::now() + Duration::days(self.config.refresh_token_ttl_days);
        self.refresh_repo
            .create(&CreateRefreshTokenInput {
                user_id: user.id,
                token_hash: token_digest(&refresh_token, &self.config.token_key),
                expires_at,
                ip_address: client.ip_address.clone(),
                user_agent: client.user_agent.clone(),
            })
            .await
            .context("Failed to store refresh token")?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_in: self.config.access_token_ttl_minutes * 60,
        })
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, AuthServiceError> {
        // Try username first
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        self.user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")
            .map_err(Into::into)
    }

    /// Record an auth event; failures must never break the auth flow.
    async fn log_event(
        &self,
        user_id: Option<i64>,
        username: &str,
        action: &str,
        client: &ClientInfo,
        success: bool,
        detail: Option<String>,
    ) {
        let input = CreateAuthLogInput {
            user_id,
            username: username.to_string(),
            action: action.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            success,
            detail,
        };
        if let Err(e) = self.auth_log_repo.create(&input).await {
            tracing::warn!("Failed to record auth event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxAuthLogRepository, SqlxPasswordResetRepository, SqlxRefreshTokenRepository,
        SqlxSettingsRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{ListParams, UserRole, UserStatus};

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-jwt-secret".to_string(),
            token_key: "test-token-key".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 30,
            reset_token_ttl_minutes: 30,
        }
    }

    async fn setup_test_service() -> (DynDatabasePool, AuthService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = AuthService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxRefreshTokenRepository::boxed(pool.clone()),
            SqlxPasswordResetRepository::boxed(pool.clone()),
            SqlxAuthLogRepository::boxed(pool.clone()),
            Arc::new(AuthRateLimiter::new()),
            Arc::new(EmailService::new(SqlxSettingsRepository::boxed(pool.clone()))),
            test_config(),
        );
        (pool, service)
    }

    async fn create_user(pool: &DynDatabasePool, username: &str, password: &str) -> User {
        let repo = SqlxUserRepository::new(pool.clone());
        let hash = hash_password(password).expect("Failed to hash password");
        repo.create(&User::new(
            username.to_string(),
            format!("{}@example.com", username),
            hash,
            UserRole::Editor,
        ))
        .await
        .expect("Failed to create user")
    }

    #[tokio::test]
    async fn test_login_with_username() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let (user, tokens) = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");

        assert_eq!(user.username, "alice");
        assert_eq!(tokens.expires_in, 15 * 60);
        assert_eq!(tokens.refresh_token.len(), 64);

        let authenticated = service
            .authenticate(&tokens.access_token)
            .await
            .expect("Access token rejected");
        assert_eq!(authenticated.id, user.id);
    }

    #[tokio::test]
    async fn test_login_with_email() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let result = service
            .login(
                LoginInput {
                    username_or_email: "alice@example.com".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let result = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "wrong".to_string(),
                },
                &ClientInfo::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthServiceError::AuthenticationError(_))));

        // The failure shows up in the audit log
        let logs = SqlxAuthLogRepository::new(pool.clone())
            .list(None, &ListParams::default())
            .await
            .expect("Failed to list auth logs");
        assert!(logs
            .items
            .iter()
            .any(|l| l.action == auth_action::LOGIN_FAILED && !l.success));
    }

    #[tokio::test]
    async fn test_login_unknown_user_same_error() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .login(
                LoginInput {
                    username_or_email: "ghost".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await;
        match result {
            Err(AuthServiceError::AuthenticationError(msg)) => {
                assert_eq!(msg, "Invalid username or password");
            }
            other => panic!("Expected AuthenticationError, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_login_disabled_account() {
        let (pool, service) = setup_test_service().await;
        let mut user = create_user(&pool, "alice", "password123").await;

        user.status = UserStatus::Disabled;
        SqlxUserRepository::new(pool.clone())
            .update(&user)
            .await
            .expect("Failed to update user");

        let result = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthServiceError::AccountDisabled)));
    }

    #[tokio::test]
    async fn test_login_rate_limited_after_failures() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        for _ in 0..5 {
            let _ = service
                .login(
                    LoginInput {
                        username_or_email: "alice".to_string(),
                        password: "wrong".to_string(),
                    },
                    &ClientInfo::default(),
                )
                .await;
        }

        // Even the correct password is refused now
        let result = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthServiceError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_detects_reuse() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let (_, first) = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");

        let (_, second) = service
            .refresh(&first.refresh_token, &ClientInfo::default())
            .await
            .expect("Refresh failed");
        assert_ne!(first.refresh_token, second.refresh_token);

        // Replaying the rotated token is treated as theft
        let replay = service
            .refresh(&first.refresh_token, &ClientInfo::default())
            .await;
        assert!(matches!(replay, Err(AuthServiceError::InvalidToken)));

        // ... and takes the legitimate session down with it
        let follow_up = service
            .refresh(&second.refresh_token, &ClientInfo::default())
            .await;
        assert!(matches!(follow_up, Err(AuthServiceError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_single_use() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let (_, tokens) = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");

        // Two simultaneous presentations of the same token: the
        // rotation claim on the row lets at most one win
        let client_info = ClientInfo::default();
        let (first, second) = tokio::join!(
            service.refresh(&tokens.refresh_token, &client_info),
            service.refresh(&tokens.refresh_token, &client_info),
        );
        let successes = usize::from(first.is_ok()) + usize::from(second.is_ok());
        assert!(successes <= 1, "both presentations were accepted");

        // Either way the presented token is spent
        let replay = service
            .refresh(&tokens.refresh_token, &ClientInfo::default())
            .await;
        assert!(matches!(replay, Err(AuthServiceError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_reuse_detection_survives_cleanup() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let (_, first) = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");
        let (_, second) = service
            .refresh(&first.refresh_token, &ClientInfo::default())
            .await
            .expect("Refresh failed");

        // Maintenance must not purge the revoked (but unexpired) row
        service.cleanup().await.expect("Cleanup failed");

        let replay = service
            .refresh(&first.refresh_token, &ClientInfo::default())
            .await;
        assert!(matches!(replay, Err(AuthServiceError::InvalidToken)));

        // ... so the replay still took the live session down
        let follow_up = service
            .refresh(&second.refresh_token, &ClientInfo::default())
            .await;
        assert!(matches!(follow_up, Err(AuthServiceError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_refresh_with_garbage_token() {
        let (_pool, service) = setup_test_service().await;

        let result = service.refresh("not-a-token", &ClientInfo::default()).await;
        assert!(matches!(result, Err(AuthServiceError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let (user, tokens) = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");

        service
            .logout(&user, &tokens.refresh_token, &ClientInfo::default())
            .await
            .expect("Logout failed");

        let result = service
            .refresh(&tokens.refresh_token, &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AuthServiceError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_logout_rejects_foreign_token() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;
        create_user(&pool, "bob", "password456").await;

        let (_, alice_tokens) = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");
        let (bob, _) = service
            .login(
                LoginInput {
                    username_or_email: "bob".to_string(),
                    password: "password456".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");

        let result = service
            .logout(&bob, &alice_tokens.refresh_token, &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AuthServiceError::InvalidToken)));

        // Alice's session survives the attempt
        let refresh = service
            .refresh(&alice_tokens.refresh_token, &ClientInfo::default())
            .await;
        assert!(refresh.is_ok());
    }

    #[tokio::test]
    async fn test_logout_all_counts_sessions() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let input = LoginInput {
            username_or_email: "alice".to_string(),
            password: "password123".to_string(),
        };
        let (user, first) = service
            .login(input.clone(), &ClientInfo::default())
            .await
            .expect("Login failed");
        let (_, second) = service
            .login(input, &ClientInfo::default())
            .await
            .expect("Login failed");

        let revoked = service
            .logout_all(&user, &ClientInfo::default())
            .await
            .expect("Logout all failed");
        assert_eq!(revoked, 2);

        for token in [first.refresh_token, second.refresh_token] {
            let result = service.refresh(&token, &ClientInfo::default()).await;
            assert!(matches!(result, Err(AuthServiceError::InvalidToken)));
        }
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_is_silent() {
        let (pool, service) = setup_test_service().await;

        let result = service
            .forgot_password("nobody@example.com", &ClientInfo::default())
            .await;
        assert!(result.is_ok());

        // No audit entry for an unknown address
        let logs = SqlxAuthLogRepository::new(pool.clone())
            .list(None, &ListParams::default())
            .await
            .expect("Failed to list auth logs");
        assert_eq!(logs.total, 0);
    }

    #[tokio::test]
    async fn test_forgot_password_records_request() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        service
            .forgot_password("alice@example.com", &ClientInfo::default())
            .await
            .expect("Forgot password failed");

        let logs = SqlxAuthLogRepository::new(pool.clone())
            .list(None, &ListParams::default())
            .await
            .expect("Failed to list auth logs");
        assert!(logs
            .items
            .iter()
            .any(|l| l.action == auth_action::RESET_REQUESTED && l.success));
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let (pool, service) = setup_test_service().await;
        let user = create_user(&pool, "alice", "password123").await;

        // Plant a reset token the way forgot_password would
        let reset_token = generate_opaque_token().expect("Failed to generate token");
        SqlxPasswordResetRepository::new(pool.clone())
            .create(
                user.id,
                &token_digest(&reset_token, &test_config().token_key),
                Utc::now() + Duration::minutes(30),
            )
            .await
            .expect("Failed to store reset token");

        service
            .reset_password(&reset_token, "newpassword456", &ClientInfo::default())
            .await
            .expect("Reset failed");

        // Old password is gone, new one works
        let old = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await;
        assert!(matches!(old, Err(AuthServiceError::AuthenticationError(_))));

        let new = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "newpassword456".to_string(),
                },
                &ClientInfo::default(),
            )
            .await;
        assert!(new.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_is_single_use() {
        let (pool, service) = setup_test_service().await;
        let user = create_user(&pool, "alice", "password123").await;

        let reset_token = generate_opaque_token().expect("Failed to generate token");
        SqlxPasswordResetRepository::new(pool.clone())
            .create(
                user.id,
                &token_digest(&reset_token, &test_config().token_key),
                Utc::now() + Duration::minutes(30),
            )
            .await
            .expect("Failed to store reset token");

        service
            .reset_password(&reset_token, "newpassword456", &ClientInfo::default())
            .await
            .expect("Reset failed");

        let replay = service
            .reset_password(&reset_token, "anotherpass789", &ClientInfo::default())
            .await;
        assert!(matches!(replay, Err(AuthServiceError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_weak_password() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .reset_password("whatever", "short", &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AuthServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_reset_password_revokes_sessions() {
        let (pool, service) = setup_test_service().await;
        let user = create_user(&pool, "alice", "password123").await;

        let (_, tokens) = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");

        let reset_token = generate_opaque_token().expect("Failed to generate token");
        SqlxPasswordResetRepository::new(pool.clone())
            .create(
                user.id,
                &token_digest(&reset_token, &test_config().token_key),
                Utc::now() + Duration::minutes(30),
            )
            .await
            .expect("Failed to store reset token");

        service
            .reset_password(&reset_token, "newpassword456", &ClientInfo::default())
            .await
            .expect("Reset failed");

        let result = service
            .refresh(&tokens.refresh_token, &ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AuthServiceError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_change_password() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let (user, tokens) = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");

        let wrong = service
            .change_password(&user, "nope", "newpassword456", &ClientInfo::default())
            .await;
        assert!(matches!(wrong, Err(AuthServiceError::AuthenticationError(_))));

        service
            .change_password(&user, "password123", "newpassword456", &ClientInfo::default())
            .await
            .expect("Change password failed");

        // Existing sessions are cut off
        let refresh = service
            .refresh(&tokens.refresh_token, &ClientInfo::default())
            .await;
        assert!(matches!(refresh, Err(AuthServiceError::InvalidToken)));

        let login = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "newpassword456".to_string(),
                },
                &ClientInfo::default(),
            )
            .await;
        assert!(login.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_disabled_account() {
        let (pool, service) = setup_test_service().await;
        create_user(&pool, "alice", "password123").await;

        let (mut user, tokens) = service
            .login(
                LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "password123".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .expect("Login failed");

        user.status = UserStatus::Disabled;
        SqlxUserRepository::new(pool.clone())
            .update(&user)
            .await
            .expect("Failed to update user");

        let result = service.authenticate(&tokens.access_token).await;
        assert!(matches!(result, Err(AuthServiceError::AccountDisabled)));
    }

    #[tokio::test]
    async fn test_cleanup_purges_expired_rows() {
        let (pool, service) = setup_test_service().await;
        let user = create_user(&pool, "alice", "password123").await;

        SqlxRefreshTokenRepository::new(pool.clone())
            .create(&CreateRefreshTokenInput {
                user_id: user.id,
                token_hash: "stale-digest".to_string(),
                expires_at: Utc::now() - Duration::days(1),
                ip_address: None,
                user_agent: None,
            })
            .await
            .expect("Failed to store refresh token");

        service.cleanup().await.expect("Cleanup failed");

        let found = SqlxRefreshTokenRepository::new(pool.clone())
            .find_by_token_hash("stale-digest")
            .await
            .expect("Lookup failed");
        assert!(found.is_none());
    }
}
