//! Rate limiter for authentication endpoints
//!
//! Protects against brute force attacks by limiting failed login attempts
//! per username and auth requests per IP address. When a limit is hit the
//! caller gets the number of seconds until the window reopens.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Failed attempts allowed per username within the window
const USERNAME_MAX_ATTEMPTS: usize = 5;
/// Username window length in minutes
const USERNAME_WINDOW_MINUTES: i64 = 15;
/// Requests allowed per IP within the window
const IP_MAX_REQUESTS: usize = 10;
/// IP window length in seconds
const IP_WINDOW_SECONDS: i64 = 60;

/// In-memory rate limiter for login and token endpoints
pub struct AuthRateLimiter {
    /// Failed login attempts by username
    username_attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    /// Request timestamps by IP address
    ip_attempts: Arc<RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>>,
}

impl AuthRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            username_attempts: Arc::new(RwLock::new(HashMap::new())),
            ip_attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check whether a username is currently locked out.
    ///
    /// Returns the seconds until the lockout lifts, or None when the
    /// username still has attempts left.
    pub async fn check_username(&self, username: &str) -> Option<i64> {
        let mut attempts = self.username_attempts.write().await;
        let now = Utc::now();
        let cutoff = now - Duration::minutes(USERNAME_WINDOW_MINUTES);

        let entry = attempts.entry(username.to_lowercase()).or_default();
        entry.retain(|time| *time > cutoff);

        if entry.len() >= USERNAME_MAX_ATTEMPTS {
            Some(retry_after_secs(entry, now, Duration::minutes(USERNAME_WINDOW_MINUTES)))
        } else {
            None
        }
    }

    /// Record a failed login attempt for a username
    pub async fn record_failed_attempt(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts
            .entry(username.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Clear failed attempts for a username (on successful login)
    pub async fn clear_username(&self, username: &str) {
        let mut attempts = self.username_attempts.write().await;
        attempts.remove(&username.to_lowercase());
    }

    /// Check whether an IP is currently rate limited.
    ///
    /// Returns the seconds until the window reopens, or None when the IP
    /// still has requests left. Every call counts as a request.
    pub async fn check_ip(&self, ip: IpAddr) -> Option<i64> {
        let mut attempts = self.ip_attempts.write().await;
        let now = Utc::now();
        let cutoff = now - Duration::seconds(IP_WINDOW_SECONDS);

        let entry = attempts.entry(ip).or_default();
        entry.retain(|time| *time > cutoff);

        if entry.len() >= IP_MAX_REQUESTS {
            return Some(retry_after_secs(entry, now, Duration::seconds(IP_WINDOW_SECONDS)));
        }

        entry.push(now);
        None
    }

    /// Drop stale entries. Called periodically from a background task.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let username_cutoff = now - Duration::minutes(USERNAME_WINDOW_MINUTES);
        let ip_cutoff = now - Duration::seconds(IP_WINDOW_SECONDS);

        {
            let mut attempts = self.username_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > username_cutoff);
                !times.is_empty()
            });
        }

        {
            let mut attempts = self.ip_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > ip_cutoff);
                !times.is_empty()
            });
        }
    }
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds until the oldest attempt in the window ages out.
/// Timestamps are pushed in order, so the first element is the oldest.
fn retry_after_secs(times: &[DateTime<Utc>], now: DateTime<Utc>, window: Duration) -> i64 {
    match times.first() {
        Some(oldest) => (*oldest + window - now).num_seconds().max(1),
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_username_lockout_after_five_failures() {
        let limiter = AuthRateLimiter::new();

        for _ in 0..4 {
            assert!(limiter.check_username("testuser").await.is_none());
            limiter.record_failed_attempt("testuser").await;
        }
        limiter.record_failed_attempt("testuser").await;

        let retry_after = limiter
            .check_username("testuser")
            .await
            .expect("should be limited after 5 failures");
        assert!(retry_after >= 1);
        assert!(retry_after <= USERNAME_WINDOW_MINUTES * 60);
    }

    #[tokio::test]
    async fn test_successful_login_clears_lockout() {
        let limiter = AuthRateLimiter::new();

        for _ in 0..5 {
            limiter.record_failed_attempt("testuser").await;
        }
        assert!(limiter.check_username("testuser").await.is_some());

        limiter.clear_username("testuser").await;
        assert!(limiter.check_username("testuser").await.is_none());
    }

    #[tokio::test]
    async fn test_username_is_case_insensitive() {
        let limiter = AuthRateLimiter::new();

        limiter.record_failed_attempt("TestUser").await;
        limiter.record_failed_attempt("testuser").await;
        limiter.record_failed_attempt("TESTUSER").await;
        limiter.record_failed_attempt("testuser").await;
        limiter.record_failed_attempt("testuser").await;

        assert!(limiter.check_username("TestUser").await.is_some());
    }

    #[tokio::test]
    async fn test_ip_rate_limit() {
        let limiter = AuthRateLimiter::new();
        let ip = IpAddr::from_str("127.0.0.1").expect("valid IP");

        for _ in 0..IP_MAX_REQUESTS {
            assert!(limiter.check_ip(ip).await.is_none());
        }

        let retry_after = limiter.check_ip(ip).await.expect("should be limited");
        assert!(retry_after >= 1);
    }

    #[tokio::test]
    async fn test_distinct_ips_counted_separately() {
        let limiter = AuthRateLimiter::new();
        let first = IpAddr::from_str("10.0.0.1").expect("valid IP");
        let second = IpAddr::from_str("10.0.0.2").expect("valid IP");

        for _ in 0..IP_MAX_REQUESTS {
            assert!(limiter.check_ip(first).await.is_none());
        }

        assert!(limiter.check_ip(first).await.is_some());
        assert!(limiter.check_ip(second).await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_drops_empty_entries() {
        let limiter = AuthRateLimiter::new();
        limiter.record_failed_attempt("someone").await;

        limiter.cleanup().await;

        // Entry survives while fresh
        let attempts = limiter.username_attempts.read().await;
        assert!(attempts.contains_key("someone"));
    }
}
