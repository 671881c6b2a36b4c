//! PDF catalog rows.
//!
//! File uploads and deletions happen in object storage around these calls;
//! a row is only written after its files are in place.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bultex_core::{Catalog, CatalogId};

use super::RepositoryError;

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

/// A freshly uploaded catalog.
#[derive(Debug, Clone)]
pub struct NewCatalog {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_name: String,
    pub file_size: i64,
    pub thumbnail_url: Option<String>,
}

/// Full replacement of the editable columns.
#[derive(Debug, Clone)]
pub struct CatalogUpdate {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_name: String,
    pub file_size: i64,
    pub thumbnail_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

impl CatalogUpdate {
    /// Start from the stored row.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            title: catalog.title.clone(),
            description: catalog.description.clone(),
            file_url: catalog.file_url.clone(),
            file_name: catalog.file_name.clone(),
            file_size: catalog.file_size,
            thumbnail_url: catalog.thumbnail_url.clone(),
            display_order: catalog.display_order,
            is_active: catalog.is_active,
        }
    }
}

const CATALOG_COLUMNS: &str = "id, title, description, file_url, file_name, file_size, \
                               thumbnail_url, display_order, is_active, created_at";

pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every catalog in display order, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Catalog>, RepositoryError> {
        let rows = sqlx::query_as::<_, CatalogRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalogs ORDER BY display_order ASC, created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Catalog::from).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no catalog has this ID.
    pub async fn get(&self, id: CatalogId) -> Result<Catalog, RepositoryError> {
        sqlx::query_as::<_, CatalogRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalogs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Catalog::from)
        .ok_or(RepositoryError::NotFound)
    }

    /// Insert a new active catalog at display order 0.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, catalog: &NewCatalog) -> Result<CatalogId, RepositoryError> {
        let id = sqlx::query_scalar::<_, CatalogId>(
            r"
            INSERT INTO catalogs
                (title, description, file_url, file_name, file_size, thumbnail_url, display_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, 0, TRUE)
            RETURNING id
            ",
        )
        .bind(&catalog.title)
        .bind(&catalog.description)
        .bind(&catalog.file_url)
        .bind(&catalog.file_name)
        .bind(catalog.file_size)
        .bind(&catalog.thumbnail_url)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        tracing::info!(catalog_id = %id, "Catalog created");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the catalog no longer exists.
    pub async fn update(&self, id: CatalogId, update: &CatalogUpdate) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE catalogs
            SET title = $2, description = $3, file_url = $4, file_name = $5, file_size = $6,
                thumbnail_url = $7, display_order = $8, is_active = $9
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.file_url)
        .bind(&update.file_name)
        .bind(update.file_size)
        .bind(&update.thumbnail_url)
        .bind(update.display_order)
        .bind(update.is_active)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip `is_active`, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the catalog no longer exists.
    pub async fn toggle_active(&self, id: CatalogId) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            "UPDATE catalogs SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the catalog no longer exists.
    pub async fn set_display_order(&self, id: CatalogId, order: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE catalogs SET display_order = $2 WHERE id = $1")
            .bind(id)
            .bind(order)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete the row and return it so its files can be removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the catalog no longer exists.
    pub async fn delete(&self, id: CatalogId) -> Result<Catalog, RepositoryError> {
        let row = sqlx::query_as::<_, CatalogRow>(&format!(
            "DELETE FROM catalogs WHERE id = $1 RETURNING {CATALOG_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tracing::info!(catalog_id = %id, "Catalog deleted");
        Ok(row.into())
    }
}
