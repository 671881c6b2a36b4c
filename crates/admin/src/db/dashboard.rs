//! Counts and recent activity for the dashboard.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bultex_core::{ContactMessage, ContactMessageId};

use super::RepositoryError;

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct DashboardCounts {
    pub products: i64,
    pub active_products: i64,
    pub categories: i64,
    pub catalogs: i64,
    /// Contact messages whose notification email was not delivered.
    pub unsent_messages: i64,
}

#[derive(sqlx::FromRow)]
struct ContactMessageRow {
    id: ContactMessageId,
    name: String,
    email: String,
    phone: String,
    message: String,
    email_sent: bool,
    email_error: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ContactMessageRow> for ContactMessage {
    fn from(row: ContactMessageRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            message: row.message,
            email_sent: row.email_sent,
            email_error: row.email_error,
            created_at: row.created_at,
        }
    }
}

pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<DashboardCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r"
            SELECT
                (SELECT COUNT(*) FROM products) AS products,
                (SELECT COUNT(*) FROM products WHERE is_active) AS active_products,
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM catalogs) AS catalogs,
                (SELECT COUNT(*) FROM contact_messages WHERE NOT email_sent) AS unsent_messages
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }

    /// Most recent contact-form submissions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_messages(&self, limit: i64) -> Result<Vec<ContactMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactMessageRow>(
            r"
            SELECT id, name, email, phone, message, email_sent, email_error, created_at
            FROM contact_messages
            ORDER BY created_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ContactMessage::from).collect())
    }
}
