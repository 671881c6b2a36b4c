//! Read-only queries for categories, products and PDF catalogs.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bultex_core::{
    Catalog, CatalogId, Category, CategoryId, CategoryRef, Price, Product, ProductId,
};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    description: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

/// Product row with its category columns from a `LEFT JOIN`.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Price,
    category_id: Option<CategoryId>,
    image_url: Option<String>,
    marketplace_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    joined_category_id: Option<CategoryId>,
    joined_category_name: Option<String>,
    joined_category_slug: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = match (
            row.joined_category_id,
            row.joined_category_name,
            row.joined_category_slug,
        ) {
            (Some(id), Some(name), Some(slug)) => Some(CategoryRef { id, name, slug }),
            _ => None,
        };

        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category_id: row.category_id,
            category,
            image_url: row.image_url,
            marketplace_url: row.marketplace_url,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CatalogRow {
    id: CatalogId,
    title: String,
    description: Option<String>,
    file_url: String,
    file_name: String,
    file_size: i64,
    thumbnail_url: Option<String>,
    display_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<CatalogRow> for Catalog {
    fn from(row: CatalogRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            file_url: row.file_url,
            file_name: row.file_name,
            file_size: row.file_size,
            thumbnail_url: row.thumbnail_url,
            display_order: row.display_order,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = r"
    p.id, p.name, p.description, p.price, p.category_id, p.image_url,
    p.marketplace_url, p.is_active, p.created_at,
    c.id AS joined_category_id, c.name AS joined_category_name, c.slug AS joined_category_slug
";

/// Repository for the public catalog.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, description, image_url, created_at
            FROM categories
            ORDER BY name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Active products, newest first, optionally limited to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active_products(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.is_active = TRUE
              AND ($1::uuid IS NULL OR p.category_id = $1)
            ORDER BY p.created_at DESC
            "
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// A single active product.
    ///
    /// Inactive products are reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no active product with
    /// this id, `RepositoryError::Database` if the query fails.
    pub async fn get_active_product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1 AND p.is_active = TRUE
            "
        );

        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Product::from)
            .ok_or(RepositoryError::NotFound)
    }

    /// Active PDF catalogs in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active_catalogs(&self) -> Result<Vec<Catalog>, RepositoryError> {
        let rows = sqlx::query_as::<_, CatalogRow>(
            r"
            SELECT id, title, description, file_url, file_name, file_size,
                   thumbnail_url, display_order, is_active, created_at
            FROM catalogs
            WHERE is_active = TRUE
            ORDER BY display_order ASC, created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Catalog::from).collect())
    }

    /// `(id, created_at)` of every active product, for the sitemap.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sitemap_products(&self) -> Result<Vec<(ProductId, DateTime<Utc>)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (ProductId, DateTime<Utc>)>(
            "SELECT id, created_at FROM products WHERE is_active = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
