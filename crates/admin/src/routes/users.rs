//! Admin account management through the identity service.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{RevokedAdminRepository, SessionRevocations};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::AdminUser;
use crate::services::{IdentityError, IdentityProvider};
use crate::state::AppState;

use super::{AdminUserView, Flash, redirect_error, redirect_success};

const LIST_PATH: &str = "/admin/usuarios";

/// One account in the list.
#[derive(Debug, Clone)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub last_sign_in_at: String,
    pub banned: bool,
    pub is_current: bool,
}

impl UserView {
    fn new(user: &AdminUser, current_id: Uuid) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at.format("%d/%m/%Y").to_string(),
            last_sign_in_at: user
                .last_sign_in_at
                .map(|at| at.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_default(),
            banned: user.is_banned(),
            is_current: user.id == current_id,
        }
    }
}

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub users: Vec<UserView>,
    pub load_error: Option<String>,
    pub flash: Flash,
}

/// New account form.
#[derive(Debug, Deserialize)]
pub struct NewUserForm {
    pub username: String,
    pub password: String,
}

/// Password reset form.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

/// A change to an existing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    Ban,
    Unban,
    Delete,
}

impl AccountAction {
    const fn success_message(self) -> &'static str {
        match self {
            Self::Ban => "Usuario bloqueado",
            Self::Unban => "Usuario desbloqueado",
            Self::Delete => "Usuario eliminado",
        }
    }
}

/// Apply `action` to account `id` on behalf of `acting`.
///
/// Admins cannot ban or delete their own account. Banning or deleting ends
/// the account's open sessions before the identity service is called, so a
/// failed call can log someone out but never leaves a banned admin signed in.
///
/// # Errors
///
/// Returns the message shown in the error banner.
pub async fn apply_action<P: IdentityProvider, R: SessionRevocations>(
    identity: &P,
    revocations: &R,
    action: AccountAction,
    id: Uuid,
    acting: Uuid,
) -> std::result::Result<&'static str, String> {
    if id == acting && action != AccountAction::Unban {
        return Err("No puedes bloquear ni eliminar tu propia cuenta".to_string());
    }

    if action != AccountAction::Unban
        && let Err(e) = revocations.revoke(id).await
    {
        tracing::error!(error = %e, user_id = %id, ?action, "Failed to revoke sessions");
        return Err("No se pudieron cerrar las sesiones del usuario".to_string());
    }

    let result = match action {
        AccountAction::Ban => identity.ban(id).await,
        AccountAction::Unban => identity.unban(id).await,
        AccountAction::Delete => identity.delete_user(id).await,
    };

    result.map(|()| action.success_message()).map_err(|e| {
        tracing::error!(error = %e, user_id = %id, ?action, "Account change failed");
        e.user_message()
    })
}

fn form_error(error: &IdentityError) -> String {
    if !matches!(
        error,
        IdentityError::InvalidInput(_) | IdentityError::AlreadyExists
    ) {
        tracing::error!(error = %error, "Identity service call failed");
    }
    error.user_message()
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/usuarios", get(index).post(create))
        .route("/admin/usuarios/{id}/bloquear", post(ban))
        .route("/admin/usuarios/{id}/desbloquear", post(unban))
        .route("/admin/usuarios/{id}/password", post(set_password))
        .route("/admin/usuarios/{id}/eliminar", post(delete))
}

/// GET /admin/usuarios
#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<Flash>,
) -> Result<UsersTemplate> {
    let (users, load_error) = match state.identity().list_users().await {
        Ok(users) => (
            users.iter().map(|u| UserView::new(u, admin.id)).collect(),
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list admin users");
            (Vec::new(), Some(e.user_message()))
        }
    };

    Ok(UsersTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        users,
        load_error,
        flash: flash.normalized(),
    })
}

/// POST /admin/usuarios
#[instrument(skip(state, _admin, form), fields(username = %form.username))]
async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Form(form): Form<NewUserForm>,
) -> Redirect {
    match state
        .identity()
        .create_user(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Admin user created");
            redirect_success(LIST_PATH, &format!("Usuario {} creado", user.username))
        }
        Err(e) => redirect_error(LIST_PATH, &form_error(&e)),
    }
}

/// POST /admin/usuarios/{id}/bloquear
async fn ban(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<Uuid>,
) -> Redirect {
    let revocations = RevokedAdminRepository::new(state.pool());
    finish(apply_action(state.identity(), &revocations, AccountAction::Ban, id, admin.id).await)
}

/// POST /admin/usuarios/{id}/desbloquear
async fn unban(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<Uuid>,
) -> Redirect {
    let revocations = RevokedAdminRepository::new(state.pool());
    finish(apply_action(state.identity(), &revocations, AccountAction::Unban, id, admin.id).await)
}

/// POST /admin/usuarios/{id}/eliminar
async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<Uuid>,
) -> Redirect {
    let revocations = RevokedAdminRepository::new(state.pool());
    finish(apply_action(state.identity(), &revocations, AccountAction::Delete, id, admin.id).await)
}

/// POST /admin/usuarios/{id}/password
#[instrument(skip(state, _admin, form))]
async fn set_password(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<Uuid>,
    Form(form): Form<PasswordForm>,
) -> Redirect {
    match state.identity().set_password(id, &form.password).await {
        Ok(()) => redirect_success(LIST_PATH, "Contraseña actualizada"),
        Err(e) => redirect_error(LIST_PATH, &form_error(&e)),
    }
}

fn finish(result: std::result::Result<&'static str, String>) -> Redirect {
    match result {
        Ok(message) => redirect_success(LIST_PATH, message),
        Err(message) => redirect_error(LIST_PATH, &message),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db::revocations::tests::FakeRevocations;
    use crate::services::identity::tests::FakeIdentity;

    #[tokio::test]
    async fn test_ban_other_account() {
        let identity = FakeIdentity::new(None);
        let revocations = FakeRevocations::default();
        let target = Uuid::new_v4();

        let message = apply_action(
            &identity,
            &revocations,
            AccountAction::Ban,
            target,
            identity.user.id,
        )
        .await
        .unwrap();

        assert_eq!(message, "Usuario bloqueado");
        assert_eq!(*identity.calls.lock().unwrap(), [format!("ban {target}")]);
    }

    #[tokio::test]
    async fn test_ban_and_delete_end_open_sessions() {
        let identity = FakeIdentity::new(None);
        let revocations = FakeRevocations::default();
        let signed_in_at = Utc::now() - Duration::minutes(5);
        let (banned, deleted) = (Uuid::new_v4(), Uuid::new_v4());
        let me = identity.user.id;

        apply_action(&identity, &revocations, AccountAction::Ban, banned, me)
            .await
            .unwrap();
        apply_action(&identity, &revocations, AccountAction::Delete, deleted, me)
            .await
            .unwrap();

        assert!(revocations.is_revoked(banned, signed_in_at).await.unwrap());
        assert!(revocations.is_revoked(deleted, signed_in_at).await.unwrap());
    }

    #[tokio::test]
    async fn test_unban_revokes_nothing() {
        let identity = FakeIdentity::new(None);
        let revocations = FakeRevocations::default();
        let target = Uuid::new_v4();

        apply_action(&identity, &revocations, AccountAction::Unban, target, identity.user.id)
            .await
            .unwrap();
        assert!(revocations.revoked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ban_not_sent_when_sessions_cannot_be_ended() {
        let identity = FakeIdentity::new(None);
        let revocations = FakeRevocations {
            fail: true,
            ..FakeRevocations::default()
        };
        let target = Uuid::new_v4();

        let err = apply_action(&identity, &revocations, AccountAction::Ban, target, identity.user.id)
            .await
            .unwrap_err();
        assert_eq!(err, "No se pudieron cerrar las sesiones del usuario");
        assert!(identity.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cannot_ban_or_delete_self() {
        let identity = FakeIdentity::new(None);
        let revocations = FakeRevocations::default();
        let me = identity.user.id;

        assert!(
            apply_action(&identity, &revocations, AccountAction::Ban, me, me)
                .await
                .is_err()
        );
        assert!(
            apply_action(&identity, &revocations, AccountAction::Delete, me, me)
                .await
                .is_err()
        );
        assert!(identity.calls.lock().unwrap().is_empty());
        assert!(revocations.revoked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unban_self_allowed() {
        let identity = FakeIdentity::new(None);
        let revocations = FakeRevocations::default();
        let me = identity.user.id;
        assert_eq!(
            apply_action(&identity, &revocations, AccountAction::Unban, me, me).await,
            Ok("Usuario desbloqueado")
        );
    }

    #[tokio::test]
    async fn test_create_validation_message() {
        let identity = FakeIdentity::new(None);
        let err = identity.create_user("ana", "secreto1").await.unwrap_err();
        assert_eq!(form_error(&err), "Ya existe un usuario con ese nombre");

        let err = identity.create_user("pedro", "123").await.unwrap_err();
        assert_eq!(
            form_error(&err),
            "La contraseña debe tener al menos 6 caracteres"
        );
    }

    #[test]
    fn test_user_view_marks_current_and_banned() {
        let identity = FakeIdentity::new(Some(chrono::Utc::now() + chrono::Duration::days(1)));
        let view = UserView::new(&identity.user, identity.user.id);
        assert!(view.banned);
        assert!(view.is_current);
        assert_eq!(view.last_sign_in_at, "");
    }
}
