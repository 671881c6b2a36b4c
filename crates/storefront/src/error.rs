//! Error handling with Sentry integration.
//!
//! Page handlers answer with a short text body; the contact API answers with
//! `{"error": "..."}`. Server-side failures are captured to Sentry before the
//! response is built and never leak their details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;

/// Shown when a contact message could not be stored.
pub const SAVE_FAILED: &str = "Error al guardar el mensaje. Por favor intenta de nuevo.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed while rendering a page.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Contact submission rejected; the message is shown to the visitor.
    #[error("{0}")]
    InvalidSubmission(String),

    /// Contact message could not be stored.
    #[error("Failed to store contact message: {0}")]
    SaveFailed(#[source] RepositoryError),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(RepositoryError::NotFound) | Self::InvalidSubmission(_)
        )
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::InvalidSubmission(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) | Self::SaveFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        match self {
            Self::InvalidSubmission(message) => {
                (status, Json(json!({ "error": message }))).into_response()
            }
            Self::SaveFailed(_) => (status, Json(json!({ "error": SAVE_FAILED }))).into_response(),
            Self::Database(RepositoryError::NotFound) => {
                (status, "Página no encontrada").into_response()
            }
            Self::Database(_) | Self::Internal(_) => {
                (status, "Error interno del servidor").into_response()
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_page_status_codes() {
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(RepositoryError::DataCorruption("bad".to_string()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal("render".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_invalid_submission_is_json_400() {
        let (status, body) =
            body_json(AppError::InvalidSubmission("Email inválido".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email inválido");
    }

    #[tokio::test]
    async fn test_save_failure_hides_details() {
        let (status, body) = body_json(AppError::SaveFailed(RepositoryError::DataCorruption(
            "relation contact_messages missing".to_string(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], SAVE_FAILED);
    }
}
