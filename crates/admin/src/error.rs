//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{IdentityError, StorageError};

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Object storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Identity service operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message safe to show in a banner on an admin page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => {
                "El registro ya no existe".to_string()
            }
            Self::Database(RepositoryError::Conflict(_)) => {
                "Ya existe un registro con esos datos".to_string()
            }
            Self::Database(_) | Self::Internal(_) => "Error interno del servidor".to_string(),
            Self::Storage(StorageError::InvalidUrl) => StorageError::InvalidUrl.to_string(),
            Self::Storage(_) => "No se pudo guardar el archivo".to_string(),
            Self::Identity(e) => e.user_message(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ) | Self::Internal(_)
                | Self::Storage(StorageError::Http(_) | StorageError::Api { .. })
                | Self::Identity(
                    IdentityError::Http(_) | IdentityError::Api { .. } | IdentityError::Parse(_)
                )
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = match &self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(StorageError::InvalidUrl)
            | Self::Identity(
                IdentityError::InvalidInput(_)
                | IdentityError::AlreadyExists
                | IdentityError::InvalidCredentials,
            )
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Identity(_) => StatusCode::BAD_GATEWAY,
        };

        (status, self.user_message()).into_response()
    }
}

/// Set the Sentry user context from the signed-in admin.
pub fn set_sentry_user(admin_id: uuid::Uuid, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("producto".to_string());
        assert_eq!(err.to_string(), "Not found: producto");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "categories_slug_key".to_string()
            ))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_external_failures_are_bad_gateway() {
        assert_eq!(
            get_status(AppError::Storage(StorageError::Api {
                status: 500,
                message: "boom".to_string()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Identity(IdentityError::Parse("bad".to_string()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_user_input_errors_are_bad_request() {
        assert_eq!(
            get_status(AppError::Identity(IdentityError::AlreadyExists)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Storage(StorageError::InvalidUrl)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = AppError::Internal("pool exhausted".to_string());
        assert_eq!(err.user_message(), "Error interno del servidor");

        let err = AppError::Identity(IdentityError::AlreadyExists);
        assert_eq!(err.user_message(), "Ya existe un usuario con ese nombre");
    }
}
