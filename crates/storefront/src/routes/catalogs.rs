//! Downloadable PDF catalogs.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use bultex_core::{Catalog, SiteSnapshot, format_file_size};

use crate::db::CatalogRepository;
use crate::filters;
use crate::state::AppState;

/// Catalog card view for templates.
pub struct CatalogCard {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_name: String,
    pub file_size: String,
    pub thumbnail_url: Option<String>,
}

impl From<&Catalog> for CatalogCard {
    fn from(catalog: &Catalog) -> Self {
        Self {
            title: catalog.title.clone(),
            description: catalog.description.clone(),
            file_url: catalog.file_url.clone(),
            file_name: catalog.file_name.clone(),
            file_size: format_file_size(u64::try_from(catalog.file_size).unwrap_or(0)),
            thumbnail_url: catalog.thumbnail_url.clone(),
        }
    }
}

/// PDF catalogs page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalogs/index.html")]
pub struct CatalogsTemplate {
    pub site: Arc<SiteSnapshot>,
    pub current_path: &'static str,
    pub catalogs: Vec<CatalogCard>,
}

/// Display active catalogs in display order.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let catalogs = CatalogRepository::new(state.pool())
        .list_active_catalogs()
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load catalogs");
            Vec::new()
        });

    CatalogsTemplate {
        site: state.site(),
        current_path: "/catalogos",
        catalogs: catalogs.iter().map(CatalogCard::from).collect(),
    }
}
