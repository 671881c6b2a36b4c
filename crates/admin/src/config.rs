//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (shared with the storefront)
//! - `SUPABASE_URL` - Base URL of the Supabase project
//! - `SUPABASE_ANON_KEY` - Public key, used for password login
//! - `SUPABASE_SERVICE_ROLE_KEY` - Admin-privileged key for user management
//!   and storage writes (HIGH PRIVILEGE, server-only)
//!
//! ## Optional
//! - `ADMIN_BASE_URL` - Public URL for the admin panel (default: `http://localhost:3001`)
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_EMAIL_DOMAIN` - Domain of the synthetic emails given to admin
//!   usernames (default: `bultex.local`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance traces sample rate (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_EMAIL_DOMAIN: &str = "bultex.local";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Identity service and object storage
    pub supabase: SupabaseConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Supabase project configuration.
///
/// Implements `Debug` manually to redact both keys.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL without a trailing slash (e.g. `https://abc.supabase.co`)
    pub url: String,
    /// Public key used for password login
    pub anon_key: SecretString,
    /// Service-role key (HIGH PRIVILEGE - bypasses row-level security)
    pub service_role_key: SecretString,
    /// Domain appended to admin usernames to form their login email
    pub email_domain: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("service_role_key", &"[REDACTED]")
            .field("email_domain", &self.email_domain)
            .finish()
    }
}

impl SupabaseConfig {
    /// Load only the Supabase settings (used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a key is missing, the URL is invalid, or the
    /// service-role key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(&env_var)
    }

    fn from_vars<F>(var: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = get_required(var, "SUPABASE_URL")?;
        Url::parse(&url)
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;

        let anon_key = get_required(var, "SUPABASE_ANON_KEY")?;
        let service_role_key = get_required(var, "SUPABASE_SERVICE_ROLE_KEY")?;
        validate_secret_strength(&service_role_key, "SUPABASE_SERVICE_ROLE_KEY")?;

        let email_domain = var("ADMIN_EMAIL_DOMAIN")
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string());

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: SecretString::from(anon_key),
            service_role_key: SecretString::from(service_role_key),
            email_domain,
        })
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the service-role key fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(&env_var)
    }

    fn from_vars<F>(var: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get_required(var, "DATABASE_URL").map(SecretString::from)?;
        let host = parse_or_default(var, "ADMIN_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or_default(var, "ADMIN_PORT", 3001_u16)?;

        let base_url = var("ADMIN_BASE_URL").unwrap_or_else(|| "http://localhost:3001".to_string());
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string()))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            supabase: SupabaseConfig::from_vars(var)?,
            sentry_dsn: var("SENTRY_DSN"),
            sentry_environment: var("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or_default(var, "SENTRY_SAMPLE_RATE", 1.0_f32)?,
            sentry_traces_sample_rate: parse_or_default(var, "SENTRY_TRACES_SAMPLE_RATE", 1.0_f32)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the session cookie should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Read a process environment variable, treating blank values as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_required<F>(var: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

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

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject keys copied verbatim from a `.env.example`.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const SERVICE_KEY: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.c2VydmljZV9yb2xl.Qm9kF7xZp2";

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://localhost/bultex"),
            ("SUPABASE_URL", "https://abc.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon-public-key"),
            ("SUPABASE_SERVICE_ROLE_KEY", SERVICE_KEY),
        ]
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AdminConfig::from_vars(&vars(&required())).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.base_url, "http://localhost:3001");
        assert!(!config.is_https());
        assert_eq!(config.supabase.url, "https://abc.supabase.co");
        assert_eq!(config.supabase.email_domain, "bultex.local");
        assert_eq!(config.supabase.service_role_key.expose_secret(), SERVICE_KEY);
    }

    #[test]
    fn test_missing_supabase_key() {
        let pairs: Vec<_> = required()
            .into_iter()
            .filter(|(k, _)| *k != "SUPABASE_SERVICE_ROLE_KEY")
            .collect();
        let err = AdminConfig::from_vars(&vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "SUPABASE_SERVICE_ROLE_KEY"));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = required();
        pairs.push(("ADMIN_PORT", "99999"));
        let err = AdminConfig::from_vars(&vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "ADMIN_PORT"));
    }

    #[test]
    fn test_email_domain_normalized() {
        let mut pairs = required();
        pairs.push(("ADMIN_EMAIL_DOMAIN", " @Bultex.MX "));
        let config = AdminConfig::from_vars(&vars(&pairs)).unwrap();
        assert_eq!(config.supabase.email_domain, "bultex.mx");
    }

    #[test]
    fn test_https_base_url() {
        let mut pairs = required();
        pairs.push(("ADMIN_BASE_URL", "https://admin.bultex.mx/"));
        let config = AdminConfig::from_vars(&vars(&pairs)).unwrap();
        assert!(config.is_https());
        assert_eq!(config.base_url, "https://admin.bultex.mx");
    }

    #[test]
    fn test_placeholder_service_key_rejected() {
        let result = validate_secret_strength("your-service-role-key", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_low_entropy_service_key_rejected() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(SERVICE_KEY) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_supabase_config_debug_redacts_keys() {
        let config = AdminConfig::from_vars(&vars(&required())).unwrap();
        let debug_output = format!("{:?}", config.supabase);

        assert!(debug_output.contains("https://abc.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("anon-public-key"));
        assert!(!debug_output.contains(SERVICE_KEY));
    }
}
