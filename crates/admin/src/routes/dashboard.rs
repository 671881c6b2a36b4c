//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use bultex_core::ContactMessage;

use crate::db::{DashboardCounts, DashboardRepository};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

use super::AdminUserView;

/// Contact messages listed under the counts.
const RECENT_MESSAGES: i64 = 10;

/// One recent contact message.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub received_at: String,
    pub email_sent: bool,
    pub email_error: String,
}

impl From<&ContactMessage> for MessageView {
    fn from(message: &ContactMessage) -> Self {
        Self {
            name: message.name.clone(),
            email: message.email.clone(),
            phone: message.phone.clone(),
            message: message.message.clone(),
            received_at: message.created_at.format("%d/%m/%Y %H:%M").to_string(),
            email_sent: message.email_sent,
            email_error: message.email_error.clone().unwrap_or_default(),
        }
    }
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub counts: DashboardCounts,
    pub messages: Vec<MessageView>,
    pub load_error: bool,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin/dashboard", get(index))
}

/// Counts and recent contact messages.
///
/// GET /admin/dashboard
#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> DashboardTemplate {
    let repo = DashboardRepository::new(state.pool());
    let (counts, messages) = tokio::join!(repo.counts(), repo.recent_messages(RECENT_MESSAGES));

    let mut load_error = false;
    let counts = counts.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load dashboard counts");
        load_error = true;
        DashboardCounts::default()
    });
    let messages = messages.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load contact messages");
        load_error = true;
        Vec::new()
    });

    DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/admin/dashboard",
        counts,
        messages: messages.iter().map(MessageView::from).collect(),
        load_error,
    }
}
