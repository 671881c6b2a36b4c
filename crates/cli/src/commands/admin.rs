//! Admin account commands.
//!
//! Accounts live in the identity service, so these go through the same
//! client the admin dashboard uses.
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_SERVICE_ROLE_KEY`
//! - `ADMIN_EMAIL_DOMAIN` - synthetic email domain (default `bultex.local`)

use thiserror::Error;

use bultex_admin::config::{ConfigError, SupabaseConfig};
use bultex_admin::services::{IdentityError, IdentityProvider, SupabaseAuthClient};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Supabase settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The identity service rejected the request.
    #[error("Identity service error: {0}")]
    Identity(#[from] IdentityError),
}

fn client() -> Result<SupabaseAuthClient, AdminError> {
    let config = SupabaseConfig::from_env()?;
    Ok(SupabaseAuthClient::new(&config)?)
}

/// Create a confirmed admin account.
///
/// # Errors
///
/// Returns an error if the username or password is invalid, the account
/// already exists, or the identity service is unreachable.
pub async fn create_user(username: &str, password: &str) -> Result<(), AdminError> {
    let identity = client()?;
    let user = identity.create_user(username, password).await?;

    tracing::info!(
        id = %user.id,
        username = %user.username,
        email = %user.email,
        "Admin account created"
    );
    Ok(())
}

/// Log every admin account.
///
/// # Errors
///
/// Returns an error if the identity service is unreachable.
pub async fn list_users() -> Result<(), AdminError> {
    let identity = client()?;
    let users = identity.list_users().await?;

    tracing::info!(count = users.len(), "Admin accounts");
    for user in &users {
        tracing::info!(
            id = %user.id,
            username = %user.username,
            email = %user.email,
            created_at = %user.created_at.format("%Y-%m-%d"),
            banned = user.is_banned(),
            "Admin account"
        );
    }
    Ok(())
}
