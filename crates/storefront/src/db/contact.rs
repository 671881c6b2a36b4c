//! Contact-message log and the recipient lookup.

use sqlx::PgPool;

use bultex_core::{ContactMessageId, FORM_RECIPIENT_KEY, ValidContact};

use super::RepositoryError;

/// Repository for contact-form submissions.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The configured `form_recipient_email`, if set and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recipient_email(&self) -> Result<Option<String>, RepositoryError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM app_config WHERE key = $1")
            .bind(FORM_RECIPIENT_KEY)
            .fetch_optional(self.pool)
            .await?;

        Ok(value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// Store a submission with `email_sent = false`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, contact: &ValidContact) -> Result<ContactMessageId, RepositoryError> {
        let id = sqlx::query_scalar::<_, ContactMessageId>(
            r"
            INSERT INTO contact_messages (name, email, phone, message, email_sent)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id
            ",
        )
        .bind(&contact.name)
        .bind(contact.email.as_str())
        .bind(&contact.phone)
        .bind(&contact.message)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Record the outcome of email delivery for a stored message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row is gone,
    /// `RepositoryError::Database` if the update fails.
    pub async fn record_delivery(
        &self,
        id: ContactMessageId,
        email_error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE contact_messages SET email_sent = $2, email_error = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(email_error.is_none())
        .bind(email_error)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
