//! Email service for transactional mail

use crate::db::repositories::SettingsRepository;
use crate::services::settings::keys;
use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

/// Email service backed by SMTP settings stored in the database
pub struct EmailService {
    settings_repo: Arc<dyn SettingsRepository>,
}

impl EmailService {
    pub fn new(settings_repo: Arc<dyn SettingsRepository>) -> Self {
        Self { settings_repo }
    }

    /// Whether an SMTP host has been configured
    pub async fn is_configured(&self) -> bool {
        match self.settings_repo.get(keys::SMTP_HOST).await {
            Ok(Some(setting)) => !setting.value.trim().is_empty(),
            _ => false,
        }
    }

    /// Send a password reset email containing the reset link.
    ///
    /// The link points at the configured `site_url`; with no site URL
    /// set the link is relative, which still works behind a proxy that
    /// serves API and site from one origin.
    pub async fn send_password_reset(&self, to_email: &str, reset_token: &str) -> Result<()> {
        let site_name = self
            .get_setting(keys::SITE_NAME)
            .await
            .unwrap_or_else(|_| "Vitrine".to_string());
        let site_url = self.get_setting(keys::SITE_URL).await.unwrap_or_default();
        let reset_url = format!(
            "{}/reset-password?token={}",
            site_url.trim_end_matches('/'),
            reset_token
        );

        let subject = format!("[{}] Password reset request", site_name);
        let body = format!(
            "Hello,\n\n\
             A password reset was requested for your account. Open the link below to choose a new password:\n\n\
             {}\n\n\
             The link expires in 30 minutes. If you did not request a reset, you can ignore this email.\n\n\
             {}",
            reset_url, site_name
        );

        self.send(to_email, &subject, &body).await
    }

    /// Send a test email to verify the SMTP configuration
    pub async fn send_test_email(&self, to_email: &str) -> Result<()> {
        let site_name = self
            .get_setting(keys::SITE_NAME)
            .await
            .unwrap_or_else(|_| "Vitrine".to_string());

        let subject = format!("[{}] Test email", site_name);
        let body = format!(
            "This is a test email from {}. Your SMTP settings are working.",
            site_name
        );

        self.send(to_email, &subject, &body).await
    }

    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        let smtp_host = self
            .get_setting(keys::SMTP_HOST)
            .await
            .map_err(|_| anyhow!("SMTP host not configured"))?;
        if smtp_host.is_empty() {
            return Err(anyhow!("SMTP host not configured"));
        }

        let smtp_port: u16 = self
            .get_setting(keys::SMTP_PORT)
            .await
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .unwrap_or(587);
        let smtp_username = self
            .get_setting(keys::SMTP_USERNAME)
            .await
            .map_err(|_| anyhow!("SMTP username not configured"))?;
        let smtp_password = self
            .get_setting(keys::SMTP_PASSWORD)
            .await
            .map_err(|_| anyhow!("SMTP password not configured"))?;
        let smtp_from = self
            .get_setting(keys::SMTP_FROM)
            .await
            .map_err(|_| anyhow!("SMTP from address not configured"))?;
        let smtp_from_name = self
            .get_setting(keys::SMTP_FROM_NAME)
            .await
            .unwrap_or_else(|_| "Vitrine".to_string());

        let from = format!("{} <{}>", smtp_from_name, smtp_from);

        let email = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to_email.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let creds = Credentials::new(smtp_username, smtp_password);

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp_host)
                .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
                .credentials(creds)
                .port(smtp_port)
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<String> {
        self.settings_repo
            .get(key)
            .await?
            .map(|s| s.value)
            .ok_or_else(|| anyhow!("Setting '{}' not configured", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxSettingsRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_service() -> EmailService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        EmailService::new(SqlxSettingsRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_not_configured_by_default() {
        let service = setup_service().await;
        assert!(!service.is_configured().await);
    }

    #[tokio::test]
    async fn test_send_fails_without_smtp_host() {
        let service = setup_service().await;
        let result = service
            .send_password_reset("user@example.com", "sometoken")
            .await;
        assert!(result.is_err());
    }
}
