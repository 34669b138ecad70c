//! Data models
//!
//! This module contains all data structures used throughout the Vitrine backend.
//! Models represent:
//! - Database entities (User, NewsPost, Product, Project, ServiceItem, Event, Comment)
//! - Authentication records (RefreshToken, PasswordResetToken, AuthLog)
//! - Shared helpers (ContentStatus, pagination)

mod auth;
mod comment;
mod common;
mod event;
mod news;
mod product;
mod project;
mod service_item;
mod user;

pub use auth::{
    auth_action, AuthLog, CreateAuthLogInput, CreateRefreshTokenInput, PasswordResetToken,
    RefreshToken,
};
pub use comment::{Comment, CommentStatus, CreateCommentInput};
pub use common::{ContentStatus, ListParams, PagedResult};
pub use event::{CreateEventInput, Event, UpdateEventInput};
pub use news::{CreateNewsInput, NewsPost, UpdateNewsInput};
pub use product::{CreateProductInput, Product, UpdateProductInput};
pub use project::{CreateProjectInput, Project, UpdateProjectInput};
pub use service_item::{CreateServiceItemInput, ServiceItem, UpdateServiceItemInput};
pub use user::{CreateUserInput, UpdateUserInput, User, UserRole, UserStatus};
