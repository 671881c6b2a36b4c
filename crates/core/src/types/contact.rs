//! Contact-form submissions and the stored message log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::ContactMessageId;

/// Why a contact submission was rejected.
///
/// The `Display` text is returned to the visitor.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactError {
    #[error("Todos los campos son requeridos")]
    MissingFields,
    #[error("Email inválido")]
    InvalidEmail,
}

/// Raw contact form body. Missing fields deserialize as empty strings so they
/// are reported as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

/// A submission that passed validation, with whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub message: String,
}

impl ContactSubmission {
    /// Check that every field is present and the email is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::MissingFields`] when any field is blank and
    /// [`ContactError::InvalidEmail`] when the email does not parse.
    pub fn validate(&self) -> Result<ValidContact, ContactError> {
        let name = self.name.trim();
        let email = self.email.trim();
        let phone = self.phone.trim();
        let message = self.message.trim();

        if [name, email, phone, message].iter().any(|f| f.is_empty()) {
            return Err(ContactError::MissingFields);
        }

        let email = Email::parse(email).map_err(|_| ContactError::InvalidEmail)?;

        Ok(ValidContact {
            name: name.to_string(),
            email,
            phone: phone.to_string(),
            message: message.to_string(),
        })
    }
}

/// A stored contact message with its delivery status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub email_sent: bool,
    pub email_error: Option<String>,
    pub created_at: DateTime<Utc>,
}
