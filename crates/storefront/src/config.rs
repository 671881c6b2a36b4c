//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `SITE_URL` - Public URL of the site, used for robots.txt and the sitemap
//!   (default: `http://localhost:3000`)
//! - `STOREFRONT_HOST` - Bind address (default: 0.0.0.0)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance traces sample rate (default: 0.0)
//!
//! ## Optional (contact-form email)
//! - `SMTP_HOST`, `SMTP_USER`, `SMTP_PASS` - all three enable email delivery
//! - `SMTP_PORT` - SMTP port (default: 465, implicit TLS; other ports use STARTTLS)
//! - `SMTP_FROM_EMAIL` - Sender address (default: `SMTP_USER`)
//! - `SMTP_FROM_NAME` - Sender display name (default: BULTEX)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_FROM_NAME: &str = "BULTEX";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of the site, without a trailing slash
    pub site_url: String,
    /// SMTP settings for contact-form email (absent when not configured)
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_email: String,
    pub from_name: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

impl EmailConfig {
    /// Port 465 means the connection is TLS from the first byte.
    #[must_use]
    pub const fn implicit_tls(&self) -> bool {
        self.smtp_port == 465
    }

    fn from_vars<F>(var: &F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (Some(smtp_host), Some(smtp_username), Some(smtp_password)) =
            (var("SMTP_HOST"), var("SMTP_USER"), var("SMTP_PASS"))
        else {
            return Ok(None);
        };

        let smtp_port = parse_or_default(var, "SMTP_PORT", DEFAULT_SMTP_PORT)?;
        let from_email = var("SMTP_FROM_EMAIL").unwrap_or_else(|| smtp_username.clone());
        let from_name = var("SMTP_FROM_NAME").unwrap_or_else(|| DEFAULT_FROM_NAME.to_string());

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password: SecretString::from(smtp_password),
            from_email,
            from_name,
        }))
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(&|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    fn from_vars<F>(var: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = var("DATABASE_URL")
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let host = parse_or_default(var, "STOREFRONT_HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or_default(var, "STOREFRONT_PORT", 3000_u16)?;

        let site_url = var("SITE_URL").unwrap_or_else(|| "http://localhost:3000".to_string());
        Url::parse(&site_url)
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_URL".to_string(), e.to_string()))?;
        let site_url = site_url.trim_end_matches('/').to_string();

        Ok(Self {
            database_url,
            host,
            port,
            site_url,
            email: EmailConfig::from_vars(var)?,
            sentry_dsn: var("SENTRY_DSN"),
            sentry_environment: var("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or_default(var, "SENTRY_SAMPLE_RATE", 1.0_f32)?,
            sentry_traces_sample_rate: parse_or_default(var, "SENTRY_TRACES_SAMPLE_RATE", 0.0_f32)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<F, T>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = StorefrontConfig::from_vars(&vars(&[("DATABASE_URL", "postgres://localhost/bultex")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.site_url, "http://localhost:3000");
        assert!(config.email.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let err = StorefrontConfig::from_vars(&vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let err = StorefrontConfig::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://localhost/bultex"),
            ("STOREFRONT_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_site_url_trailing_slash_trimmed() {
        let config = StorefrontConfig::from_vars(&vars(&[
            ("DATABASE_URL", "postgres://localhost/bultex"),
            ("SITE_URL", "https://bultex.mx/"),
        ]))
        .unwrap();
        assert_eq!(config.site_url, "https://bultex.mx");
    }

    #[test]
    fn test_email_defaults_to_implicit_tls_and_user_as_sender() {
        let email = EmailConfig::from_vars(&vars(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "ventas@bultex.mx"),
            ("SMTP_PASS", "s3cret"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(email.smtp_port, 465);
        assert!(email.implicit_tls());
        assert_eq!(email.from_email, "ventas@bultex.mx");
        assert_eq!(email.from_name, "BULTEX");
        assert_eq!(email.smtp_password.expose_secret(), "s3cret");
    }

    #[test]
    fn test_email_requires_host_user_and_password() {
        let email = EmailConfig::from_vars(&vars(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "ventas@bultex.mx"),
        ]))
        .unwrap();
        assert!(email.is_none());
    }

    #[test]
    fn test_email_starttls_port() {
        let email = EmailConfig::from_vars(&vars(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "ventas@bultex.mx"),
            ("SMTP_PASS", "s3cret"),
            ("SMTP_PORT", "587"),
        ]))
        .unwrap()
        .unwrap();
        assert!(!email.implicit_tls());
    }

    #[test]
    fn test_debug_redacts_password() {
        let email = EmailConfig::from_vars(&vars(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "ventas@bultex.mx"),
            ("SMTP_PASS", "hunter2hunter2"),
        ]))
        .unwrap()
        .unwrap();
        let debug = format!("{email:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
