//! `robots.txt` and `sitemap.xml`.

use askama::Template;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use tracing::instrument;

use bultex_core::ProductId;

use crate::db::CatalogRepository;
use crate::error::AppError;
use crate::state::AppState;

/// One `<url>` entry.
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// Sitemap XML template.
#[derive(Template)]
#[template(path = "sitemap.xml")]
pub struct SitemapTemplate {
    pub entries: Vec<SitemapEntry>,
}

/// Static pages with their change frequency and priority.
const STATIC_PAGES: [(&str, &str, &str); 5] = [
    ("/", "monthly", "1.0"),
    ("/catalogo", "weekly", "0.9"),
    ("/catalogos", "monthly", "0.8"),
    ("/nosotros", "monthly", "0.7"),
    ("/contacto", "monthly", "0.7"),
];

fn robots_body(site_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /api/\nDisallow: /admin/\n\nSitemap: {site_url}/sitemap.xml\n"
    )
}

fn sitemap_entries(site_url: &str, products: &[(ProductId, DateTime<Utc>)]) -> Vec<SitemapEntry> {
    let now = Utc::now().format("%Y-%m-%d").to_string();

    let pages = STATIC_PAGES
        .iter()
        .map(|&(path, changefreq, priority)| SitemapEntry {
            loc: format!("{site_url}{path}"),
            lastmod: Some(now.clone()),
            changefreq,
            priority,
        });

    let products = products.iter().map(|(id, created_at)| SitemapEntry {
        loc: format!("{site_url}/producto/{id}"),
        lastmod: Some(created_at.format("%Y-%m-%d").to_string()),
        changefreq: "weekly",
        priority: "0.8",
    });

    pages.chain(products).collect()
}

/// Serve `robots.txt`.
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_body(&state.config().site_url),
    )
}

/// Serve `sitemap.xml`.
///
/// A failing product query is logged and leaves only the static pages.
///
/// # Errors
///
/// Returns `AppError::Internal` if the template fails to render.
#[instrument(skip(state))]
pub async fn sitemap(State(state): State<AppState>) -> Result<Response, AppError> {
    let products = CatalogRepository::new(state.pool())
        .sitemap_products()
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load products for sitemap");
            Vec::new()
        });

    let xml = SitemapTemplate {
        entries: sitemap_entries(&state.config().site_url, &products),
    }
    .render()
    .map_err(|e| AppError::Internal(format!("sitemap render failed: {e}")))?;

    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response())
}
