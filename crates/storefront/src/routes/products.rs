//! Product detail route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use bultex_core::{Product, ProductId, SiteSnapshot};

use crate::db::{CatalogRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Product detail view.
pub struct ProductDetail {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub marketplace_url: Option<String>,
}

impl From<&Product> for ProductDetail {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            image_url: product.image_url.clone(),
            category_name: product.category.as_ref().map(|c| c.name.clone()),
            category_slug: product.category.as_ref().map(|c| c.slug.clone()),
            marketplace_url: product
                .marketplace_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub site: Arc<SiteSnapshot>,
    pub current_path: &'static str,
    pub product: ProductDetail,
    pub quote_link: Option<String>,
}

/// "Producto no encontrado" page.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub site: Arc<SiteSnapshot>,
    pub current_path: &'static str,
}

/// WhatsApp message asking for a wholesale quote on one product.
fn quote_message(product: &Product) -> String {
    format!(
        "Hola, me interesa cotizar mayoreo del producto: {} (ID: {})",
        product.name, product.id
    )
}

fn not_found(state: &AppState) -> Response {
    (
        StatusCode::NOT_FOUND,
        ProductNotFoundTemplate {
            site: state.site(),
            current_path: "/catalogo",
        },
    )
        .into_response()
}

/// Display a product.
///
/// Malformed ids, unknown ids and inactive products all render the 404 page.
///
/// # Errors
///
/// Returns `AppError::Database` if the lookup fails.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Ok(id) = ProductId::parse(&id) else {
        return Ok(not_found(&state));
    };

    let product = match CatalogRepository::new(state.pool())
        .get_active_product(id)
        .await
    {
        Ok(product) => product,
        Err(RepositoryError::NotFound) => return Ok(not_found(&state)),
        Err(e) => return Err(e.into()),
    };

    let site = state.site();
    let quote_link = site.config.whatsapp_link_with(&quote_message(&product));

    Ok(ProductShowTemplate {
        site,
        current_path: "/catalogo",
        product: ProductDetail::from(&product),
        quote_link,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bultex_core::{CategoryId, CategoryRef, Price, random_uuid};
    use chrono::Utc;

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(random_uuid()),
            name: "Overol Industrial".to_string(),
            description: Some("Gabardina de uso rudo".to_string()),
            price: Price::parse("450").unwrap(),
            category_id: None,
            category: None,
            image_url: None,
            marketplace_url: Some("  ".to_string()),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_detail_without_category() {
        let detail = ProductDetail::from(&product());
        assert!(detail.category_name.is_none());
        assert!(detail.marketplace_url.is_none());
        assert_eq!(detail.price, "$450.00");
    }

    #[test]
    fn test_detail_with_joined_category() {
        let id = CategoryId::new(random_uuid());
        let mut p = product();
        p.category_id = Some(id);
        p.category = Some(CategoryRef {
            id,
            name: "Overoles".to_string(),
            slug: "overoles".to_string(),
        });
        let detail = ProductDetail::from(&p);
        assert_eq!(detail.category_name.as_deref(), Some("Overoles"));
        assert_eq!(detail.category_slug.as_deref(), Some("overoles"));
    }

    #[test]
    fn test_quote_message_names_product() {
        let p = product();
        let message = quote_message(&p);
        assert!(message.contains("Overol Industrial"));
        assert!(message.contains(&p.id.to_string()));
    }

    #[test]
    fn test_not_found_page_links_back_to_catalog() {
        let html = ProductNotFoundTemplate {
            site: Arc::new(SiteSnapshot::default()),
            current_path: "/catalogo",
        }
        .render()
        .unwrap();
        assert!(html.contains("Producto no encontrado"));
        assert!(html.contains("href=\"/catalogo\""));
    }
}
