//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use bultex_core::notify_site_changed;
use sqlx::PgPool;

use crate::services::{SupabaseAuthClient, SupabaseStorage};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    identity: SupabaseAuthClient,
    storage: SupabaseStorage,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(pool: PgPool, identity: SupabaseAuthClient, storage: SupabaseStorage) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                identity,
                storage,
            }),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Supabase Auth admin client.
    #[must_use]
    pub fn identity(&self) -> &SupabaseAuthClient {
        &self.inner.identity
    }

    /// Supabase Storage client.
    #[must_use]
    pub fn storage(&self) -> &SupabaseStorage {
        &self.inner.storage
    }

    /// Tell the public site to reload its settings.
    ///
    /// Called after every write to `app_config` or `site_images`. Failures
    /// are logged; the write itself has already succeeded.
    pub async fn publish_site_changes(&self) {
        if let Err(e) = notify_site_changed(self.pool()).await {
            tracing::error!(error = %e, "Failed to notify storefront of site changes");
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool().clone()
    }
}
