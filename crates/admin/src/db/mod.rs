//! Database operations for the admin dashboard.
//!
//! The admin shares the storefront's database and is the only writer of the
//! catalog and site-settings tables.
//!
//! ## Tables written
//!
//! - `categories`, `products`, `catalogs`
//! - `site_images`, `app_config`
//! - `admin.revoked_admins`
//!
//! ## Tables read
//!
//! - `contact_messages` (dashboard only)
//! - `admin.session` (through `tower-sessions-sqlx-store`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bultex-cli -- migrate
//! ```

pub mod app_config;
pub mod catalogs;
pub mod categories;
pub mod dashboard;
pub mod products;
pub mod revocations;
pub mod site_images;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalogs::{CatalogRepository, CatalogUpdate, NewCatalog};
pub use categories::{CategoryInput, CategoryRepository};
pub use dashboard::{DashboardCounts, DashboardRepository};
pub use products::{ProductInput, ProductRepository};
pub use revocations::{RevokedAdminRepository, SessionRevocations};
pub use site_images::{NewSiteImage, SiteImageRepository};

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to [`RepositoryError::Conflict`] naming the
    /// violated constraint.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
        {
            return Self::Conflict(db_err.constraint().unwrap_or("unique").to_string());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
