//! Section images for the public site.

use sqlx::PgPool;
use uuid::Uuid;

use bultex_core::{SiteImage, SiteImageId, SiteSection};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct SiteImageRow {
    id: SiteImageId,
    section: String,
    url: String,
    alt: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    display_order: i32,
    is_active: bool,
}

impl TryFrom<SiteImageRow> for SiteImage {
    type Error = RepositoryError;

    fn try_from(row: SiteImageRow) -> Result<Self, Self::Error> {
        let section = SiteSection::parse(&row.section).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown image section: {}", row.section))
        })?;
        Ok(Self {
            id: row.id,
            section,
            url: row.url,
            alt: row.alt.unwrap_or_default(),
            title: row.title,
            subtitle: row.subtitle,
            display_order: row.display_order,
            is_active: row.is_active,
        })
    }
}

/// A newly uploaded image.
#[derive(Debug, Clone)]
pub struct NewSiteImage {
    pub section: SiteSection,
    pub url: String,
    pub alt: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub display_order: i32,
}

pub struct SiteImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SiteImageRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every image, active or not, by section and display order.
    ///
    /// Rows with an unknown section are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<SiteImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, SiteImageRow>(
            r"
            SELECT id, section, url, alt, title, subtitle, display_order, is_active
            FROM site_images
            ORDER BY section, display_order, created_at
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match SiteImage::try_from(row) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping site image");
                    None
                }
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, image: &NewSiteImage) -> Result<SiteImageId, RepositoryError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r"
            INSERT INTO site_images (section, url, alt, title, subtitle, display_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id
            ",
        )
        .bind(image.section.as_str())
        .bind(&image.url)
        .bind(&image.alt)
        .bind(&image.title)
        .bind(&image.subtitle)
        .bind(image.display_order)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        Ok(SiteImageId::new(id))
    }

    /// Flip `is_active`, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image no longer exists.
    pub async fn toggle_active(&self, id: SiteImageId) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            "UPDATE site_images SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete an image row, returning its URL so the file can be removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image no longer exists.
    pub async fn delete(&self, id: SiteImageId) -> Result<String, RepositoryError> {
        sqlx::query_scalar::<_, String>("DELETE FROM site_images WHERE id = $1 RETURNING url")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
