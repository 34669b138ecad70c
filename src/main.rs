//! Vitrine - Company website CMS backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitrine::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAuthLogRepository, SqlxCommentRepository, SqlxEventRepository, SqlxNewsRepository,
            SqlxPasswordResetRepository, SqlxProductRepository, SqlxProjectRepository,
            SqlxRefreshTokenRepository, SqlxServiceItemRepository, SqlxSettingsRepository,
            SqlxUserRepository,
        },
    },
    services::{
        AuthRateLimiter, AuthService, CommentService, EmailService, EventService, NewsService,
        ProductService, ProjectService, ServiceItemService, SettingsService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Vitrine CMS backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    if config.auth.uses_insecure_defaults() {
        tracing::warn!(
            "Auth secrets are development defaults; set VITRINE_AUTH_JWT_SECRET \
             and VITRINE_AUTH_TOKEN_KEY before exposing this server"
        );
    }

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let refresh_repo = SqlxRefreshTokenRepository::boxed(pool.clone());
    let reset_repo = SqlxPasswordResetRepository::boxed(pool.clone());
    let auth_log_repo = SqlxAuthLogRepository::boxed(pool.clone());
    let news_repo = SqlxNewsRepository::boxed(pool.clone());
    let product_repo = SqlxProductRepository::boxed(pool.clone());
    let project_repo = SqlxProjectRepository::boxed(pool.clone());
    let service_item_repo = SqlxServiceItemRepository::boxed(pool.clone());
    let event_repo = SqlxEventRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());
    let settings_repo = SqlxSettingsRepository::boxed(pool.clone());

    // Initialize services
    let rate_limiter = Arc::new(AuthRateLimiter::new());
    let email_service = Arc::new(EmailService::new(settings_repo.clone()));
    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        refresh_repo.clone(),
        reset_repo.clone(),
        auth_log_repo.clone(),
        rate_limiter.clone(),
        email_service.clone(),
        config.auth.clone(),
    ));
    let user_service = Arc::new(UserService::new(user_repo.clone(), news_repo.clone()));
    let news_service = Arc::new(NewsService::new(news_repo.clone()));
    let product_service = Arc::new(ProductService::new(product_repo));
    let project_service = Arc::new(ProjectService::new(project_repo));
    let service_item_service = Arc::new(ServiceItemService::new(service_item_repo));
    let event_service = Arc::new(EventService::new(event_repo));
    let comment_service = Arc::new(CommentService::new(comment_repo, news_repo.clone()));
    let settings_service = Arc::new(SettingsService::new(settings_repo));

    // Create the initial admin account on an empty database
    if let Some(password) = user_service
        .ensure_initial_admin(std::env::var("VITRINE_ADMIN_PASSWORD").ok())
        .await?
    {
        tracing::warn!(
            "Created initial admin user 'admin' with password '{}'; change it after first login",
            password
        );
    }

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        auth_service: auth_service.clone(),
        user_service,
        news_service,
        product_service,
        project_service,
        service_item_service,
        event_service,
        comment_service,
        settings_service,
        email_service,
    };

    // Periodic maintenance: prune rate-limiter windows and expired
    // token rows (runs every 5 minutes)
    {
        let limiter = rate_limiter.clone();
        let auth = auth_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                if let Err(e) = auth.cleanup().await {
                    tracing::warn!("Token cleanup failed: {}", e);
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
