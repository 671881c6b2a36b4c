//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /catalogo               - Product grid (?categoria=slug filters)
//! GET  /productos              - Permanent redirect to /catalogo
//! GET  /producto/{id}          - Product detail
//! GET  /catalogos              - Downloadable PDF catalogs
//! GET  /nosotros               - About page
//! GET  /contacto               - Contact page with form
//!
//! # API
//! POST /api/contact            - Contact form submission (JSON)
//!
//! # SEO
//! GET  /robots.txt
//! GET  /sitemap.xml
//! ```

pub mod catalog;
pub mod catalogs;
pub mod contact;
pub mod home;
pub mod pages;
pub mod products;
pub mod seo;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::api_rate_limiter;
use crate::state::AppState;

/// Create the public API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact::submit))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/catalogo", get(catalog::index))
        .route("/productos", get(catalog::legacy_redirect))
        .route("/producto/{id}", get(products::show))
        .route("/catalogos", get(catalogs::index))
        .route("/nosotros", get(pages::about))
        .route("/contacto", get(pages::contact))
        .route("/robots.txt", get(seo::robots))
        .route("/sitemap.xml", get(seo::sitemap))
        .nest("/api", api_routes())
}
