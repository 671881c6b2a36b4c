//! Product catalog listing with an optional category filter.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, RawQuery, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use bultex_core::{Category, Product, SiteSnapshot, resolve_category};

use crate::db::CatalogRepository;
use crate::filters;
use crate::state::AppState;

/// Product card view for templates.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image_url: Option<String>,
    pub category_name: Option<String>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            image_url: product.image_url.clone(),
            category_name: product.category_name().map(String::from),
        }
    }
}

/// Category chip in the filter bar.
#[derive(Clone)]
pub struct CategoryChip {
    pub name: String,
    pub slug: String,
    pub selected: bool,
}

/// Query parameters for the catalog page.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub categoria: Option<String>,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogTemplate {
    pub site: Arc<SiteSnapshot>,
    pub current_path: &'static str,
    pub categories: Vec<CategoryChip>,
    pub selected_name: Option<String>,
    pub products: Vec<ProductCard>,
}

/// Build chips for every category, marking the resolved one.
fn category_chips(categories: &[Category], selected: Option<&Category>) -> Vec<CategoryChip> {
    categories
        .iter()
        .map(|c| CategoryChip {
            name: c.name.clone(),
            slug: c.slug.clone(),
            selected: selected.is_some_and(|s| s.id == c.id),
        })
        .collect()
}

/// Display the product grid.
///
/// An unknown `categoria` slug shows every active product. Database failures
/// are logged and render an empty grid.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let repo = CatalogRepository::new(state.pool());

    let categories = repo.list_categories().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load categories");
        Vec::new()
    });

    let selected = resolve_category(query.categoria.as_deref(), &categories);
    if selected.is_none() && query.categoria.is_some() {
        tracing::debug!(slug = ?query.categoria, "Unknown category slug, showing all products");
    }

    let products = repo
        .list_active_products(selected.map(|c| c.id))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load products");
            Vec::new()
        });

    CatalogTemplate {
        site: state.site(),
        current_path: "/catalogo",
        categories: category_chips(&categories, selected),
        selected_name: selected.map(|c| c.name.clone()),
        products: products.iter().map(ProductCard::from).collect(),
    }
}

/// Redirect the old `/productos` listing to `/catalogo`, keeping the query.
pub async fn legacy_redirect(RawQuery(query): RawQuery) -> Redirect {
    Redirect::permanent(&catalog_url(query.as_deref()))
}

fn catalog_url(query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("/catalogo?{q}"),
        _ => "/catalogo".to_string(),
    }
}
