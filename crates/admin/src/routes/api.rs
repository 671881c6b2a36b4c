//! JSON diagnostics endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::middleware::RequireAdminAuth;
use crate::models::AdminUser;
use crate::services::{IdentityError, IdentityProvider};
use crate::state::AppState;

/// Account summary returned by the connectivity check.
#[derive(Debug, Serialize)]
struct UserSummary {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<&AdminUser> for UserSummary {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/test-supabase", get(test_supabase))
}

/// Shape the connectivity-check response from a user listing.
fn connectivity_report(result: Result<Vec<AdminUser>, IdentityError>) -> (StatusCode, Value) {
    match result {
        Ok(users) => {
            let summaries: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();
            (
                StatusCode::OK,
                json!({
                    "success": true,
                    "userCount": summaries.len(),
                    "users": summaries,
                }),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Identity service connectivity check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "error": e.to_string() }),
            )
        }
    }
}

/// List accounts through the service-role key to prove the identity
/// service is reachable and correctly configured.
///
/// GET /api/test-supabase
async fn test_supabase(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> (StatusCode, Json<Value>) {
    let (status, body) = connectivity_report(state.identity().list_users().await);
    (status, Json(body))
}
