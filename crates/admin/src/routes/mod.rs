//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! GET  /admin                          - Dashboard when signed in, login otherwise
//! GET  /admin/login                    - Login page
//! POST /admin/login                    - Check credentials (rate limited)
//! POST /admin/logout                   - Logout
//!
//! # Dashboard
//! GET  /admin/dashboard                - Counts and recent contact messages
//!
//! # Products
//! GET  /admin/productos                - Product list
//! GET  /admin/productos/nuevo          - New product form
//! POST /admin/productos                - Create product
//! GET  /admin/productos/{id}           - Edit form
//! POST /admin/productos/{id}           - Update product
//! POST /admin/productos/{id}/estado    - Toggle active
//! POST /admin/productos/{id}/eliminar  - Delete product
//!
//! # Categories
//! GET  /admin/categorias               - Category list
//! GET  /admin/categorias/nueva         - New category form
//! POST /admin/categorias               - Create category
//! GET  /admin/categorias/{id}          - Edit form
//! POST /admin/categorias/{id}          - Update category
//! POST /admin/categorias/{id}/eliminar - Delete category
//!
//! # PDF catalogs
//! GET  /admin/catalogos                - Catalog list
//! GET  /admin/catalogos/nuevo          - Upload form
//! POST /admin/catalogos                - Create catalog
//! GET  /admin/catalogos/{id}           - Edit form
//! POST /admin/catalogos/{id}           - Update catalog, replacing files
//! POST /admin/catalogos/{id}/estado    - Toggle active
//! POST /admin/catalogos/{id}/orden     - Set display order
//! POST /admin/catalogos/{id}/eliminar  - Delete catalog and its files
//!
//! # Site images
//! GET  /admin/imagenes                 - Images grouped by section
//! POST /admin/imagenes                 - Upload image
//! POST /admin/imagenes/{id}/estado     - Toggle active
//! POST /admin/imagenes/{id}/eliminar   - Delete image
//!
//! # Admin users
//! GET  /admin/usuarios                 - Account list
//! POST /admin/usuarios                 - Create account
//! POST /admin/usuarios/{id}/bloquear   - Ban
//! POST /admin/usuarios/{id}/desbloquear - Unban
//! POST /admin/usuarios/{id}/password   - Set password
//! POST /admin/usuarios/{id}/eliminar   - Delete account
//!
//! # Settings
//! GET  /admin/configuracion?tab=       - Settings tab
//! POST /admin/configuracion?tab=       - Save tab
//!
//! # Diagnostics
//! GET  /api/test-supabase              - Identity service connectivity check
//! ```

pub mod api;
pub mod auth;
pub mod catalogs;
pub mod categories;
pub mod dashboard;
pub mod form;
pub mod images;
pub mod products;
pub mod settings;
pub mod users;

use axum::{Router, response::Redirect};
use serde::Deserialize;

use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(catalogs::router())
        .merge(images::router())
        .merge(users::router())
        .merge(settings::router())
        .merge(api::router())
}

// =============================================================================
// Shared view helpers
// =============================================================================

/// The signed-in admin, as shown in the page header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub username: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            username: admin.username.clone(),
            email: admin.email.clone(),
        }
    }
}

/// `?success=` / `?error=` banner messages carried across a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    /// Drop blank messages so templates only test for `Some`.
    #[must_use]
    pub fn normalized(self) -> Self {
        let keep = |m: Option<String>| m.filter(|s| !s.trim().is_empty());
        Self {
            success: keep(self.success),
            error: keep(self.error),
        }
    }
}

/// Redirect to `path` with a success banner.
#[must_use]
pub fn redirect_success(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_message(path, "success", message))
}

/// Redirect to `path` with an error banner.
#[must_use]
pub fn redirect_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_message(path, "error", message))
}

fn with_message(path: &str, key: &str, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={}", urlencoding::encode(message))
}

/// Trimmed form value, `None` when blank.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header::LOCATION;
    use axum::response::IntoResponse;

    use super::*;

    fn location(redirect: Redirect) -> String {
        redirect
            .into_response()
            .headers()
            .get(LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_redirect_success_encodes_message() {
        assert_eq!(
            location(redirect_success("/admin/productos", "Producto creado")),
            "/admin/productos?success=Producto%20creado"
        );
    }

    #[test]
    fn test_redirect_error_appends_to_existing_query() {
        assert_eq!(
            location(redirect_error("/admin/configuracion?tab=social", "Falló")),
            "/admin/configuracion?tab=social&error=Fall%C3%B3"
        );
    }

    #[test]
    fn test_flash_drops_blank_messages() {
        let flash = Flash {
            success: Some("  ".to_string()),
            error: Some("Error".to_string()),
        }
        .normalized();
        assert_eq!(flash.success, None);
        assert_eq!(flash.error.as_deref(), Some("Error"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  hola ")), Some("hola".to_string()));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }
}
