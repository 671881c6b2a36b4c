//! Catalog entities: categories, products and downloadable PDF catalogs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CatalogId, CategoryId, ProductId};
use super::price::Price;

/// A product category (e.g. "Camisolas", "Overoles").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// URL-safe identifier, unique across categories.
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The part of a category that is joined onto a product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product shown in the public catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: Option<CategoryId>,
    /// Joined category. `None` when the product is uncategorized or its
    /// category has been deleted.
    pub category: Option<CategoryRef>,
    pub image_url: Option<String>,
    /// Link to the product on an external marketplace.
    pub marketplace_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Category name for display, if the product has one.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }
}

/// A downloadable PDF catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: CatalogId,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_name: String,
    /// Size of the PDF in bytes.
    pub file_size: i64,
    pub thumbnail_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Resolve a category slug taken from the URL against the loaded categories.
///
/// Returns `None` (meaning "no filter") when the slug is absent, blank, or
/// does not match any category.
#[must_use]
pub fn resolve_category<'a>(slug: Option<&str>, categories: &'a [Category]) -> Option<&'a Category> {
    let slug = slug.map(str::trim).filter(|s| !s.is_empty())?;
    categories.iter().find(|c| c.slug == slug)
}

/// Build a URL slug from a category name.
///
/// Lower-cases the name, turns each run of whitespace into a single `-`,
/// then drops every character outside `[a-z0-9-]`.
///
/// ```
/// use bultex_core::slugify;
///
/// assert_eq!(slugify("Ropa de Trabajo"), "ropa-de-trabajo");
/// assert_eq!(slugify("Calzado  Industrial!"), "calzado-industrial");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            slug.push(ch);
        }
    }

    slug
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::id::random_uuid;

    fn category(name: &str, slug: &str) -> Category {
        Category {
            id: CategoryId::new(random_uuid()),
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_category_matches_slug() {
        let categories = vec![category("Camisolas", "camisolas"), category("Overoles", "overoles")];
        let found = resolve_category(Some("overoles"), &categories).unwrap();
        assert_eq!(found.name, "Overoles");
    }

    #[test]
    fn test_resolve_category_unknown_slug_means_no_filter() {
        let categories = vec![category("Camisolas", "camisolas")];
        assert!(resolve_category(Some("botas"), &categories).is_none());
        assert!(resolve_category(Some("  "), &categories).is_none());
        assert!(resolve_category(None, &categories).is_none());
    }

    #[test]
    fn test_slugify_collapses_whitespace() {
        assert_eq!(slugify("Equipo   de\tSeguridad"), "equipo-de-seguridad");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Camisolas Básicas"), "camisolas-bsicas");
        assert_eq!(slugify("Pantalón (Cargo)"), "pantaln-cargo");
    }

    #[test]
    fn test_slugify_keeps_existing_hyphens_and_digits() {
        assert_eq!(slugify("Línea-2025"), "lnea-2025");
    }
}
