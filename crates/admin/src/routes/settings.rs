//! Site configuration editor.
//!
//! Each tab edits a fixed set of `app_config` keys. Saving a tab upserts
//! only that tab's keys and republishes the site snapshot.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::Redirect,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use bultex_core::{ConfigField, ConfigTab};

use crate::db::app_config;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

use super::{AdminUserView, Flash, redirect_error, redirect_success};

const SETTINGS_PATH: &str = "/admin/configuracion";

/// Tab link in the page header.
#[derive(Debug, Clone)]
pub struct TabView {
    pub key: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// One input with its stored value.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub key: &'static str,
    pub label: &'static str,
    pub multiline: bool,
    pub value: String,
}

impl FieldView {
    fn new(field: &ConfigField, stored: &HashMap<String, String>) -> Self {
        Self {
            key: field.key,
            label: field.label,
            multiline: field.multiline,
            value: stored.get(field.key).cloned().unwrap_or_default(),
        }
    }
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings/index.html")]
pub struct SettingsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub tab: &'static str,
    pub tabs: Vec<TabView>,
    pub fields: Vec<FieldView>,
    pub flash: Flash,
}

/// `?tab=` plus the usual flash parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    pub tab: Option<String>,
    #[serde(flatten)]
    pub flash: Flash,
}

fn tab_views(active: ConfigTab) -> Vec<TabView> {
    ConfigTab::ALL
        .iter()
        .map(|&tab| TabView {
            key: tab.as_str(),
            label: tab.label(),
            active: tab == active,
        })
        .collect()
}

fn tab_path(tab: ConfigTab) -> String {
    format!("{SETTINGS_PATH}?tab={}", tab.as_str())
}

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin/configuracion", get(index).post(save))
}

/// GET /admin/configuracion?tab=
#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<SettingsQuery>,
) -> Result<SettingsTemplate> {
    let tab = ConfigTab::parse(query.tab.as_deref());
    let stored = app_config::get_all(state.pool()).await?;

    Ok(SettingsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: SETTINGS_PATH,
        tab: tab.as_str(),
        tabs: tab_views(tab),
        fields: tab.fields().iter().map(|f| FieldView::new(f, &stored)).collect(),
        flash: query.flash.normalized(),
    })
}

/// Save the fields of one tab.
///
/// POST /admin/configuracion?tab=
#[instrument(skip(state, _admin, form))]
async fn save(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<SettingsQuery>,
    Form(form): Form<HashMap<String, String>>,
) -> Redirect {
    let tab = ConfigTab::parse(query.tab.as_deref());
    let values = tab.collect_values(&form);

    match app_config::upsert_many(state.pool(), &values).await {
        Ok(()) => {
            tracing::info!(tab = tab.as_str(), keys = values.len(), "Site configuration saved");
            state.publish_site_changes().await;
            redirect_success(&tab_path(tab), "Configuración guardada")
        }
        Err(e) => {
            tracing::error!(error = %e, tab = tab.as_str(), "Failed to save configuration");
            redirect_error(&tab_path(tab), "No se pudo guardar la configuración")
        }
    }
}
