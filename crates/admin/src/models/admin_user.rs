//! Admin accounts as reported by the identity service.
//!
//! Accounts are never stored locally. Usernames are mapped onto synthetic
//! email addresses (`{username}@{domain}`) because the identity service
//! only knows emails.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Minimum password length accepted by the identity service.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// An admin user (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    /// Set while the account is banned.
    pub banned_until: Option<DateTime<Utc>>,
}

impl AdminUser {
    /// Whether the ban is still in effect at `now`.
    #[must_use]
    pub fn is_banned_at(&self, now: DateTime<Utc>) -> bool {
        self.banned_until.is_some_and(|until| until > now)
    }

    #[must_use]
    pub fn is_banned(&self) -> bool {
        self.is_banned_at(Utc::now())
    }
}

/// Username shown for an account: the `username` metadata entry when set,
/// otherwise the local part of the email.
#[must_use]
pub fn display_username(metadata_username: Option<&str>, email: &str) -> String {
    metadata_username
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map_or_else(
            || email.split('@').next().unwrap_or(email).to_string(),
            ToString::to_string,
        )
}

/// Login email for what the admin typed in the username box.
///
/// Input that already contains `@` is used as an email; anything else is a
/// username and gets the synthetic domain appended.
#[must_use]
pub fn login_email(input: &str, domain: &str) -> String {
    let input = input.trim().to_lowercase();
    if input.contains('@') {
        input
    } else {
        format!("{input}@{domain}")
    }
}

/// Check a username for a new account.
///
/// # Errors
///
/// Returns the Spanish message shown on the form.
pub fn validate_username(username: &str) -> Result<String, &'static str> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err("El nombre de usuario es requerido");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err("El nombre de usuario solo puede contener letras, números, puntos, guiones y guiones bajos");
    }
    Ok(username)
}

/// Check a new password.
///
/// # Errors
///
/// Returns the Spanish message shown on the form.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("La contraseña debe tener al menos 6 caracteres");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn user(banned_until: Option<DateTime<Utc>>) -> AdminUser {
        AdminUser {
            id: Uuid::nil(),
            email: "ana@bultex.local".to_string(),
            username: "ana".to_string(),
            created_at: Utc::now(),
            last_sign_in_at: None,
            banned_until,
        }
    }

    #[test]
    fn test_display_username_prefers_metadata() {
        assert_eq!(display_username(Some("Ana"), "x@bultex.local"), "Ana");
        assert_eq!(display_username(Some("  "), "ana@bultex.local"), "ana");
        assert_eq!(display_username(None, "ana@bultex.local"), "ana");
    }

    #[test]
    fn test_login_email() {
        assert_eq!(login_email(" Ana ", "bultex.local"), "ana@bultex.local");
        assert_eq!(login_email("ana@bultex.mx", "bultex.local"), "ana@bultex.mx");
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username(" Ana.Perez ").unwrap(), "ana.perez");
        assert!(validate_username("").is_err());
        assert!(validate_username("ana perez").is_err());
        assert!(validate_username("ana@bultex").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("ñandú1").is_ok());
    }

    #[test]
    fn test_ban_state() {
        let now = Utc::now();
        assert!(!user(None).is_banned_at(now));
        assert!(user(Some(now + Duration::hours(1))).is_banned_at(now));
        assert!(!user(Some(now - Duration::hours(1))).is_banned_at(now));
    }
}
