//! Application state shared across handlers.

use std::sync::Arc;

use bultex_core::{SiteContext, SiteSnapshot};
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    site: SiteContext,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `site` - Published site settings, kept fresh by the change listener
    ///
    /// The SMTP transport is built here when the configuration has one. A
    /// transport that cannot be built is logged and treated as missing.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, site: SiteContext) -> Self {
        let email = match config.email.as_ref().map(EmailService::new) {
            Some(Ok(service)) => Some(service),
            Some(Err(e)) => {
                tracing::error!(error = %e, "Failed to set up SMTP transport");
                None
            }
            None => {
                tracing::warn!("SMTP not configured, contact messages will be stored without email delivery");
                None
            }
        };

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                site,
                email,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the published site settings context.
    #[must_use]
    pub fn site_context(&self) -> &SiteContext {
        &self.inner.site
    }

    /// Current snapshot of site configuration and images.
    #[must_use]
    pub fn site(&self) -> Arc<SiteSnapshot> {
        self.inner.site.current()
    }

    /// The contact email sender, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
