//! Database layer
//!
//! Supports two backends, selected by configuration:
//! - SQLite (default, single-binary deployment)
//! - MySQL (larger deployments)
//!
//! The `DatabasePool` trait hides the backend from the rest of the
//! application; repositories dispatch on `pool.driver()` where the SQL
//! dialects differ.
//!
//! ```ignore
//! use vitrine::config::DatabaseConfig;
//! use vitrine::db::{create_pool, migrations};
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
