//! `app_config` key-value operations.
//!
//! Reads return every stored row, including keys the public site ignores
//! (such as the contact-form recipient).

use std::collections::HashMap;

use sqlx::PgPool;

use super::RepositoryError;

/// Every stored key and value.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn get_all(pool: &PgPool) -> Result<HashMap<String, String>, RepositoryError> {
    let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM app_config")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().collect())
}

/// Insert or overwrite each `(key, value)` pair in one transaction.
///
/// # Errors
///
/// Returns an error if any write fails; nothing is saved in that case.
pub async fn upsert_many(pool: &PgPool, values: &[(&str, String)]) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await?;

    for (key, value) in values {
        sqlx::query(
            r"
            INSERT INTO app_config (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!(keys = values.len(), "Site configuration saved");
    Ok(())
}
