//! Contact form API.
//!
//! The stored message is the success criterion. Email delivery is attempted
//! afterwards and its outcome is recorded on the row, never surfaced as a
//! request failure.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use tracing::instrument;

use bultex_core::{ContactSubmission, ValidContact};

use crate::db::ContactRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

const RECEIVED: &str = "Tu mensaje ha sido recibido. Te contactaremos pronto.";
const NO_RECIPIENT: &str = "No recipient email configured";
const SMTP_MISSING: &str = "SMTP configuration is missing";

/// Successful submission response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
    pub email_sent: bool,
}

/// Check a raw payload, turning body and field problems into a 400.
///
/// # Errors
///
/// Returns `AppError::InvalidSubmission` with the visitor-facing message.
pub fn accept_payload(
    payload: std::result::Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<ValidContact> {
    let Json(submission) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected contact payload");
        AppError::InvalidSubmission("Solicitud inválida".to_string())
    })?;

    submission
        .validate()
        .map_err(|e| AppError::InvalidSubmission(e.to_string()))
}

/// Submit the contact form.
///
/// POST /api/contact
///
/// Returns 400 for a malformed body, missing fields or an invalid email,
/// 500 when the message cannot be stored, and 200 otherwise.
#[instrument(skip(state, payload))]
pub async fn submit(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<Json<ContactResponse>> {
    let contact = accept_payload(payload)?;
    let repo = ContactRepository::new(state.pool());

    let recipient = repo.recipient_email().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to read form recipient email");
        None
    });

    let id = repo.insert(&contact).await.map_err(AppError::SaveFailed)?;

    let delivery_error = deliver(&state, recipient.as_deref(), &contact).await;
    let email_sent = delivery_error.is_none();

    if let Err(e) = repo.record_delivery(id, delivery_error.as_deref()).await {
        tracing::error!(error = %e, message_id = %id, "Failed to record email delivery status");
    }

    tracing::info!(message_id = %id, email_sent, "Contact message received");

    Ok(Json(ContactResponse {
        success: true,
        message: RECEIVED,
        email_sent,
    }))
}

/// Try to email the submission. Returns the failure text to store, if any.
async fn deliver(state: &AppState, recipient: Option<&str>, contact: &ValidContact) -> Option<String> {
    let Some(recipient) = recipient else {
        return Some(NO_RECIPIENT.to_string());
    };
    let Some(email) = state.email() else {
        return Some(SMTP_MISSING.to_string());
    };

    let site = state.site();
    match email
        .send_contact_notification(recipient, &site.config.company_name, contact)
        .await
    {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Contact email delivery failed");
            Some(e.to_string())
        }
    }
}
