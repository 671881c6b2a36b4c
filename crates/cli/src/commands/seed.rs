//! Seed the site configuration.
//!
//! Inserts one `app_config` row per public setting with its default value,
//! plus an empty contact-form recipient. Rows that already exist are left
//! untouched, so the command is safe to run against a live database.

use bultex_core::{FORM_RECIPIENT_KEY, SiteConfig};

use super::{DatabaseError, connect};

/// Starter `(key, value)` rows.
fn starter_rows() -> Vec<(&'static str, String)> {
    let defaults = SiteConfig::default();
    SiteConfig::KEYS
        .iter()
        .map(|key| (*key, defaults.get(key).unwrap_or_default().to_string()))
        .chain(std::iter::once((FORM_RECIPIENT_KEY, String::new())))
        .collect()
}

/// Insert the starter configuration.
///
/// Returns the number of rows actually inserted.
///
/// # Errors
///
/// Returns an error if the connection or an insert fails.
pub async fn config() -> Result<u64, DatabaseError> {
    let pool = connect().await?;
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for (key, value) in starter_rows() {
        let result = sqlx::query(
            "INSERT INTO app_config (key, value) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .bind(&value)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    tracing::info!(inserted, "Site configuration seeded");
    Ok(inserted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_rows_cover_every_key() {
        let rows = starter_rows();
        assert_eq!(rows.len(), SiteConfig::KEYS.len() + 1);

        let value = |key: &str| rows.iter().find(|(k, _)| *k == key).unwrap().1.clone();
        assert_eq!(value("company_name"), "BULTEX");
        assert_eq!(value("campaign_url"), "/catalogo");
        assert_eq!(value(FORM_RECIPIENT_KEY), "");
    }
}
