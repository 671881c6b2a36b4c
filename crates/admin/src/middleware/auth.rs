//! Authentication extractors for admin.
//!
//! The logged-in admin lives in the session under
//! [`session_keys::CURRENT_ADMIN`]; there is no server-side user table.
//! Sessions opened before the account was banned or deleted are ended on
//! their next request.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;
use tower_sessions::Session;

use crate::db::{RevokedAdminRepository, SessionRevocations};
use crate::models::{CurrentAdmin, session_keys};

/// Where unauthenticated page requests are sent.
pub const LOGIN_PATH: &str = "/admin/login";

/// Extractor that requires admin authentication.
///
/// If the admin is not logged in, returns a redirect to the login page
/// for HTML requests, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hola, {}", admin.username)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required but the user is not logged in.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl AdminAuthRejection {
    fn for_path(path: &str) -> Self {
        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// The signed-in admin, unless their sessions were revoked.
///
/// A revoked session is flushed. When the revocation check itself fails the
/// request is treated as signed out but the session is kept.
pub(crate) async fn admit<R: SessionRevocations>(
    session: &Session,
    revocations: &R,
) -> Option<CurrentAdmin> {
    let admin = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()?;

    match revocations.is_revoked(admin.id, admin.signed_in_at).await {
        Ok(false) => Some(admin),
        Ok(true) => {
            tracing::info!(admin_id = %admin.id, "Ending session of revoked admin");
            if let Err(e) = session.flush().await {
                tracing::warn!(error = %e, "Failed to flush revoked session");
            }
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Session revocation check failed");
            None
        }
    }
}

async fn current_admin<S>(parts: &Parts, state: &S) -> Option<CurrentAdmin>
where
    PgPool: FromRef<S>,
{
    let session = parts.extensions.get::<Session>()?;
    let pool = PgPool::from_ref(state);
    admit(session, &RevokedAdminRepository::new(&pool)).await
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
    PgPool: FromRef<S>,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        current_admin(parts, state)
            .await
            .map(Self)
            .ok_or_else(|| AdminAuthRejection::for_path(parts.uri.path()))
    }
}

/// Extractor that optionally gets the current admin.
///
/// Unlike `RequireAdminAuth`, this does not reject the request if the admin is not logged in.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
    PgPool: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_admin(parts, state).await))
    }
}

/// Helper to set the current admin in the session.
///
/// Cycles the session ID first so a pre-login session cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{Router, body::Body, http::Request, http::header::LOCATION, routing::get};
    use chrono::{Duration, Utc};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;
    use uuid::Uuid;

    use super::*;
    use crate::db::revocations::tests::FakeRevocations;

    async fn protected(RequireAdminAuth(admin): RequireAdminAuth) -> String {
        admin.username
    }

    fn app() -> Router {
        // Requests without a session never reach the database
        let pool = PgPool::connect_lazy("postgres://localhost/bultex").unwrap();
        Router::new()
            .route("/admin/dashboard", get(protected))
            .route("/api/test-supabase", get(protected))
            .with_state(pool)
    }

    async fn signed_in_session(signed_in_at: chrono::DateTime<Utc>) -> (Session, CurrentAdmin) {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let admin = CurrentAdmin {
            id: Uuid::new_v4(),
            email: "ana@bultex.local".to_string(),
            username: "ana".to_string(),
            signed_in_at,
        };
        session
            .insert(session_keys::CURRENT_ADMIN, &admin)
            .await
            .unwrap();
        (session, admin)
    }

    #[tokio::test]
    async fn test_active_session_is_admitted() {
        let (session, admin) = signed_in_session(Utc::now()).await;
        let revocations = FakeRevocations::default();

        assert_eq!(admit(&session, &revocations).await, Some(admin));
    }

    #[tokio::test]
    async fn test_banned_admin_session_is_ended() {
        let (session, admin) = signed_in_session(Utc::now() - Duration::hours(1)).await;
        let revocations = FakeRevocations::default();
        revocations.revoke(admin.id).await.unwrap();

        assert_eq!(admit(&session, &revocations).await, None);
        // The session no longer carries the admin at all
        let stored: Option<CurrentAdmin> = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_after_revocation_is_admitted() {
        let revocations = FakeRevocations::default();
        let (session, admin) = signed_in_session(Utc::now() + Duration::seconds(5)).await;
        revocations.revoke(admin.id).await.unwrap();

        assert_eq!(admit(&session, &revocations).await, Some(admin));
    }

    #[tokio::test]
    async fn test_failed_revocation_check_denies_access() {
        let (session, _) = signed_in_session(Utc::now()).await;
        let revocations = FakeRevocations {
            fail: true,
            ..FakeRevocations::default()
        };

        assert_eq!(admit(&session, &revocations).await, None);
        let stored: Option<CurrentAdmin> = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[test]
    fn test_rejection_depends_on_path() {
        assert_eq!(
            AdminAuthRejection::for_path("/api/test-supabase"),
            AdminAuthRejection::Unauthorized
        );
        assert_eq!(
            AdminAuthRejection::for_path("/admin/productos"),
            AdminAuthRejection::RedirectToLogin
        );
    }

    #[tokio::test]
    async fn test_page_without_session_redirects_to_login() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/admin/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(LOCATION).unwrap(), LOGIN_PATH);
    }

    #[tokio::test]
    async fn test_api_without_session_is_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/test-supabase")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
