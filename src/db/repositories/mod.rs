//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod auth_log;
pub mod comment;
pub mod event;
pub mod news;
pub mod password_reset;
pub mod product;
pub mod project;
pub mod refresh_token;
pub mod service_item;
pub mod settings;
pub mod user;

pub use auth_log::{AuthLogRepository, SqlxAuthLogRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use event::{EventRepository, SqlxEventRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use password_reset::{PasswordResetRepository, SqlxPasswordResetRepository};
pub use product::{ProductRepository, SqlxProductRepository};
pub use project::{ProjectRepository, SqlxProjectRepository};
pub use refresh_token::{RefreshTokenRepository, SqlxRefreshTokenRepository};
pub use service_item::{ServiceItemRepository, SqlxServiceItemRepository};
pub use settings::{Setting, SettingsRepository, SqlxSettingsRepository};
pub use user::{SqlxUserRepository, UserRepository};
