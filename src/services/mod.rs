//! Services layer - Business logic
//!
//! This module contains all business logic services for the Vitrine backend.
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories
//! - Handling validation and error cases

pub mod auth;
pub mod comment;
pub mod email;
pub mod event;
pub mod news;
pub mod password;
pub mod product;
pub mod project;
pub mod rate_limiter;
pub mod service_item;
pub mod settings;
pub mod slug;
pub mod token;
pub mod user;

pub use auth::{AuthService, AuthServiceError, ClientInfo, IssuedTokens, LoginInput};
pub use comment::{CommentService, CommentServiceError, SubmitCommentInput};
pub use email::EmailService;
pub use event::{EventService, EventServiceError};
pub use news::{NewsService, NewsServiceError};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use product::{ProductService, ProductServiceError};
pub use project::{ProjectService, ProjectServiceError};
pub use rate_limiter::AuthRateLimiter;
pub use service_item::{ServiceItemError, ServiceItemService};
pub use settings::{SettingsService, SettingsServiceError};
pub use slug::generate_slug;
pub use token::{generate_opaque_token, token_digest, verify_token_digest, Claims};
pub use user::{CreateUserInput, UpdateUserInput, UserService, UserServiceError};
