//! Authentication route handlers for admin.
//!
//! Credentials are checked against the identity service; the session only
//! stores who signed in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, auth_rate_limiter, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::{IdentityError, IdentityProvider};
use crate::state::AppState;

use super::Flash;

const DASHBOARD_PATH: &str = "/admin/dashboard";

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub username: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Submitted login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_root))
        .route(
            "/admin/login",
            get(login_page).merge(post(login).layer(auth_rate_limiter())),
        )
        .route("/admin/logout", post(logout))
}

/// Check credentials and build the session identity.
///
/// # Errors
///
/// Returns [`IdentityError::InvalidCredentials`] for wrong credentials and
/// banned accounts, or the service error when it cannot be reached.
pub async fn authenticate<P: IdentityProvider>(
    identity: &P,
    username: &str,
    password: &str,
) -> Result<CurrentAdmin, IdentityError> {
    let user = identity.login(username, password).await?;
    if user.is_banned() {
        return Err(IdentityError::InvalidCredentials);
    }

    Ok(CurrentAdmin {
        id: user.id,
        email: user.email,
        username: user.username,
        signed_in_at: Utc::now(),
    })
}

/// Dashboard when signed in, login otherwise.
///
/// GET /admin
async fn admin_root(OptionalAdminAuth(admin): OptionalAdminAuth) -> Redirect {
    if admin.is_some() {
        Redirect::to(DASHBOARD_PATH)
    } else {
        Redirect::to(crate::middleware::auth::LOGIN_PATH)
    }
}

/// Render the login page.
///
/// GET /admin/login
async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(flash): Query<Flash>,
) -> Response {
    if admin.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let flash = flash.normalized();
    LoginTemplate {
        username: String::new(),
        error: flash.error,
        success: flash.success,
    }
    .into_response()
}

/// Check credentials and start a session.
///
/// POST /admin/login
#[instrument(skip(state, session, form), fields(username = %form.username))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let retry = |status: StatusCode, message: String| {
        (
            status,
            LoginTemplate {
                username: form.username.trim().to_string(),
                error: Some(message),
                success: None,
            },
        )
            .into_response()
    };

    let admin = match authenticate(state.identity(), &form.username, &form.password).await {
        Ok(admin) => admin,
        Err(IdentityError::InvalidCredentials) => {
            tracing::info!("Rejected admin login");
            return retry(
                StatusCode::UNAUTHORIZED,
                IdentityError::InvalidCredentials.user_message(),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Identity service login failed");
            return retry(StatusCode::BAD_GATEWAY, e.user_message());
        }
    };

    if let Err(e) = set_current_admin(&session, &admin).await {
        tracing::error!(error = %e, "Failed to store admin session");
        return retry(
            StatusCode::INTERNAL_SERVER_ERROR,
            "No se pudo iniciar la sesión".to_string(),
        );
    }

    set_sentry_user(admin.id, &admin.email);
    tracing::info!(admin_id = %admin.id, "Admin signed in");
    Redirect::to(DASHBOARD_PATH).into_response()
}

/// Logout and clear session.
///
/// POST /admin/logout
async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();

    super::redirect_success(crate::middleware::auth::LOGIN_PATH, "Sesión cerrada")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::services::identity::tests::FakeIdentity;

    #[tokio::test]
    async fn test_authenticate_builds_session_identity() {
        let identity = FakeIdentity::new(None);
        let admin = authenticate(&identity, "ana", "secreto1").await.unwrap();

        assert_eq!(admin.id, identity.user.id);
        assert_eq!(admin.username, "ana");
        assert_eq!(admin.email, "ana@bultex.local");
    }

    #[tokio::test]
    async fn test_authenticate_accepts_email() {
        let identity = FakeIdentity::new(None);
        assert!(authenticate(&identity, "Ana@Bultex.local", "secreto1").await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_password() {
        let identity = FakeIdentity::new(None);
        let err = authenticate(&identity, "ana", "otra").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_banned_account() {
        let identity = FakeIdentity::new(Some(Utc::now() + Duration::days(365)));
        let err = authenticate(&identity, "ana", "secreto1").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_expired_ban_allows_login() {
        let identity = FakeIdentity::new(Some(Utc::now() - Duration::hours(1)));
        assert!(authenticate(&identity, "ana", "secreto1").await.is_ok());
    }

    #[test]
    fn test_login_page_shows_error() {
        let html = LoginTemplate {
            username: "ana".to_string(),
            error: Some("Usuario o contraseña incorrectos".to_string()),
            success: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("Usuario o contraseña incorrectos"));
        assert!(html.contains("value=\"ana\""));
    }
}
