//! Supabase Auth client for admin accounts.
//!
//! Admins never get a local credential store: passwords are checked by the
//! identity service and accounts are managed through its admin API.
//!
//! # API Reference
//!
//! - Password login: `POST /auth/v1/token?grant_type=password` (anon key)
//! - User management: `/auth/v1/admin/users[/{id}]` (service-role key)

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::config::SupabaseConfig;
use crate::models::admin_user::{
    AdminUser, display_username, login_email, validate_password, validate_username,
};

/// `ban_duration` that keeps an account banned for roughly a century.
pub const BAN_FOREVER: &str = "876000h";

/// `ban_duration` that lifts a ban.
pub const BAN_NONE: &str = "none";

const PAGE_SIZE: usize = 200;

/// Errors that can occur when talking to the identity service.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Wrong username/password, or the account is banned.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    AlreadyExists,

    /// Input rejected before calling the service.
    #[error("{0}")]
    InvalidInput(&'static str),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl IdentityError {
    /// Message safe to show in the admin UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Usuario o contraseña incorrectos".to_string(),
            Self::AlreadyExists => "Ya existe un usuario con ese nombre".to_string(),
            Self::InvalidInput(msg) => (*msg).to_string(),
            Self::Api { message, .. } => format!("Error del servicio de usuarios: {message}"),
            Self::Http(_) | Self::Parse(_) => {
                "No se pudo contactar al servicio de usuarios".to_string()
            }
        }
    }
}

/// The operations the admin needs from an identity service.
pub trait IdentityProvider: Send + Sync {
    /// Check a username (or email) and password.
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<AdminUser, IdentityError>> + Send;

    /// All accounts, newest first.
    fn list_users(&self) -> impl Future<Output = Result<Vec<AdminUser>, IdentityError>> + Send;

    /// Create a confirmed account for `username`.
    fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<AdminUser, IdentityError>> + Send;

    fn ban(&self, id: Uuid) -> impl Future<Output = Result<(), IdentityError>> + Send;

    fn unban(&self, id: Uuid) -> impl Future<Output = Result<(), IdentityError>> + Send;

    fn set_password(
        &self,
        id: Uuid,
        password: &str,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    fn delete_user(&self, id: Uuid) -> impl Future<Output = Result<(), IdentityError>> + Send;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    banned_until: Option<DateTime<Utc>>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

impl From<UserResponse> for AdminUser {
    fn from(user: UserResponse) -> Self {
        let email = user.email.unwrap_or_default();
        Self {
            id: user.id,
            username: display_username(user.user_metadata.username.as_deref(), &email),
            email,
            created_at: user.created_at,
            last_sign_in_at: user.last_sign_in_at,
            banned_until: user.banned_until,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    users: Vec<UserResponse>,
}

/// Error body. Older endpoints use `error`/`error_description`, newer ones
/// `error_code`/`msg`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }

    fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

fn classify_error(status: StatusCode, body: &str) -> IdentityError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code().unwrap_or_default();

    if matches!(code, "email_exists" | "user_already_exists") {
        return IdentityError::AlreadyExists;
    }

    IdentityError::Api {
        status: status.as_u16(),
        message: parsed
            .message()
            .map_or_else(|| body.chars().take(200).collect(), ToString::to_string),
    }
}

/// Newest account first.
fn sort_newest_first(users: &mut [AdminUser]) {
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// =============================================================================
// Client
// =============================================================================

/// Supabase Auth API client.
#[derive(Clone)]
pub struct SupabaseAuthClient {
    inner: Arc<SupabaseAuthClientInner>,
}

struct SupabaseAuthClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    service_role_key: SecretString,
    email_domain: String,
}

impl SupabaseAuthClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseAuthClientInner {
                client,
                base_url: format!("{}/auth/v1", config.url),
                anon_key: config.anon_key.clone(),
                service_role_key: config.service_role_key.clone(),
                email_domain: config.email_domain.clone(),
            }),
        })
    }

    /// Domain of the synthetic emails given to usernames.
    #[must_use]
    pub fn email_domain(&self) -> &str {
        &self.inner.email_domain
    }

    /// Request against the admin API, authorized with the service-role key.
    fn admin_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let key = self.inner.service_role_key.expose_secret();
        self.inner
            .client
            .request(method, format!("{}/admin/users{path}", self.inner.base_url))
            .header("apikey", key)
            .bearer_auth(key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, IdentityError> {
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| IdentityError::Parse(format!("Failed to parse response: {e}")))
    }

    async fn update_user(&self, id: Uuid, body: serde_json::Value) -> Result<(), IdentityError> {
        let response = self
            .admin_request(reqwest::Method::PUT, &format!("/{id}"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

impl IdentityProvider for SupabaseAuthClient {
    #[tracing::instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<AdminUser, IdentityError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(IdentityError::InvalidCredentials);
        }

        let email = login_email(username, &self.inner.email_domain);
        let response = self
            .inner
            .client
            .post(format!("{}/token", self.inner.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", self.inner.anon_key.expose_secret())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        // 400 covers wrong passwords, unknown users and banned accounts
        if response.status() == StatusCode::BAD_REQUEST {
            return Err(IdentityError::InvalidCredentials);
        }

        let token: TokenResponse = Self::parse(response).await?;
        Ok(token.user.into())
    }

    #[tracing::instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<AdminUser>, IdentityError> {
        let mut users: Vec<AdminUser> = Vec::new();

        for page in 1.. {
            let response = self
                .admin_request(reqwest::Method::GET, "")
                .query(&[("page", page.to_string()), ("per_page", PAGE_SIZE.to_string())])
                .send()
                .await?;
            let batch: UserListResponse = Self::parse(response).await?;
            let count = batch.users.len();
            users.extend(batch.users.into_iter().map(AdminUser::from));
            if count < PAGE_SIZE {
                break;
            }
        }

        sort_newest_first(&mut users);
        tracing::debug!(count = users.len(), "Fetched admin users");
        Ok(users)
    }

    #[tracing::instrument(skip(self, password))]
    async fn create_user(&self, username: &str, password: &str) -> Result<AdminUser, IdentityError> {
        let username = validate_username(username).map_err(IdentityError::InvalidInput)?;
        validate_password(password).map_err(IdentityError::InvalidInput)?;

        let email = format!("{username}@{}", self.inner.email_domain);
        let metadata = UserMetadata {
            username: Some(username),
            role: Some("admin".to_string()),
        };

        let response = self
            .admin_request(reqwest::Method::POST, "")
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": metadata,
            }))
            .send()
            .await?;

        let user: UserResponse = Self::parse(response).await?;
        tracing::info!(user_id = %user.id, "Admin user created");
        Ok(user.into())
    }

    #[tracing::instrument(skip(self))]
    async fn ban(&self, id: Uuid) -> Result<(), IdentityError> {
        self.update_user(id, json!({ "ban_duration": BAN_FOREVER }))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn unban(&self, id: Uuid) -> Result<(), IdentityError> {
        self.update_user(id, json!({ "ban_duration": BAN_NONE })).await
    }

    #[tracing::instrument(skip(self, password))]
    async fn set_password(&self, id: Uuid, password: &str) -> Result<(), IdentityError> {
        validate_password(password).map_err(IdentityError::InvalidInput)?;
        self.update_user(id, json!({ "password": password })).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_user(&self, id: Uuid) -> Result<(), IdentityError> {
        let response = self
            .admin_request(reqwest::Method::DELETE, &format!("/{id}"))
            .send()
            .await?;
        Self::check(response).await?;
        tracing::info!(user_id = %id, "Admin user deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// In-memory identity service holding one account.
    ///
    /// Records every mutating call as `"{operation} {id}"`.
    pub(crate) struct FakeIdentity {
        pub user: AdminUser,
        pub password: &'static str,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeIdentity {
        pub(crate) fn new(banned_until: Option<DateTime<Utc>>) -> Self {
            Self {
                user: AdminUser {
                    id: Uuid::new_v4(),
                    email: "ana@bultex.local".to_string(),
                    username: "ana".to_string(),
                    created_at: Utc::now(),
                    last_sign_in_at: None,
                    banned_until,
                },
                password: "secreto1",
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, operation: &str, id: Uuid) {
            self.calls.lock().unwrap().push(format!("{operation} {id}"));
        }
    }

    impl IdentityProvider for FakeIdentity {
        async fn login(&self, username: &str, password: &str) -> Result<AdminUser, IdentityError> {
            let email = login_email(username, "bultex.local");
            if email == self.user.email && password == self.password {
                Ok(self.user.clone())
            } else {
                Err(IdentityError::InvalidCredentials)
            }
        }

        async fn list_users(&self) -> Result<Vec<AdminUser>, IdentityError> {
            Ok(vec![self.user.clone()])
        }

        async fn create_user(&self, username: &str, password: &str) -> Result<AdminUser, IdentityError> {
            let username = validate_username(username).map_err(IdentityError::InvalidInput)?;
            validate_password(password).map_err(IdentityError::InvalidInput)?;
            if username == self.user.username {
                return Err(IdentityError::AlreadyExists);
            }
            Ok(AdminUser {
                id: Uuid::new_v4(),
                email: format!("{username}@bultex.local"),
                username,
                created_at: Utc::now(),
                last_sign_in_at: None,
                banned_until: None,
            })
        }

        async fn ban(&self, id: Uuid) -> Result<(), IdentityError> {
            self.record("ban", id);
            Ok(())
        }

        async fn unban(&self, id: Uuid) -> Result<(), IdentityError> {
            self.record("unban", id);
            Ok(())
        }

        async fn set_password(&self, id: Uuid, password: &str) -> Result<(), IdentityError> {
            validate_password(password).map_err(IdentityError::InvalidInput)?;
            self.record("set_password", id);
            Ok(())
        }

        async fn delete_user(&self, id: Uuid) -> Result<(), IdentityError> {
            self.record("delete", id);
            Ok(())
        }
    }

    #[test]
    fn test_user_response_uses_metadata_username() {
        let user: UserResponse = serde_json::from_str(
            r#"{
                "id": "6f1c2a8e-1f0b-4b39-9a55-0d7f3c1f2a10",
                "email": "ana@bultex.local",
                "created_at": "2025-11-02T18:30:00Z",
                "last_sign_in_at": null,
                "banned_until": "2125-11-02T18:30:00Z",
                "user_metadata": {"username": "Ana", "role": "admin"}
            }"#,
        )
        .unwrap();

        let admin = AdminUser::from(user);
        assert_eq!(admin.username, "Ana");
        assert_eq!(admin.email, "ana@bultex.local");
        assert!(admin.is_banned());
    }

    #[test]
    fn test_user_response_without_metadata() {
        let user: UserResponse = serde_json::from_str(
            r#"{
                "id": "6f1c2a8e-1f0b-4b39-9a55-0d7f3c1f2a10",
                "email": "soporte@bultex.mx",
                "created_at": "2025-11-02T18:30:00Z"
            }"#,
        )
        .unwrap();

        let admin = AdminUser::from(user);
        assert_eq!(admin.username, "soporte");
        assert!(!admin.is_banned());
    }

    #[test]
    fn test_classify_duplicate_email() {
        let err = classify_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"error_code":"email_exists","msg":"A user with this email address has already been registered"}"#,
        );
        assert!(matches!(err, IdentityError::AlreadyExists));
    }

    #[test]
    fn test_classify_legacy_error_body() {
        let err = classify_error(
            StatusCode::FORBIDDEN,
            r#"{"error":"not_admin","error_description":"User not allowed"}"#,
        );
        match err {
            IdentityError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "User not allowed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_non_json_body() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "upstream unavailable");
        assert_eq!(err.to_string(), "API error: 502 - upstream unavailable");
    }

    #[test]
    fn test_sort_newest_first() {
        let user = |day: u32| AdminUser {
            id: Uuid::new_v4(),
            email: format!("u{day}@bultex.local"),
            username: format!("u{day}"),
            created_at: format!("2025-01-{day:02}T00:00:00Z").parse().unwrap(),
            last_sign_in_at: None,
            banned_until: None,
        };
        let mut users = vec![user(3), user(10), user(1)];
        sort_newest_first(&mut users);
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["u10", "u3", "u1"]);
    }

    #[test]
    fn test_user_messages_are_spanish() {
        assert_eq!(
            IdentityError::InvalidCredentials.user_message(),
            "Usuario o contraseña incorrectos"
        );
        assert_eq!(
            IdentityError::InvalidInput("La contraseña debe tener al menos 6 caracteres")
                .user_message(),
            "La contraseña debe tener al menos 6 caracteres"
        );
    }
}
