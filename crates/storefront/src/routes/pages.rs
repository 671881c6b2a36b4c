//! About and contact pages.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use bultex_core::{SiteImage, SiteSection, SiteSnapshot};

use crate::filters;
use crate::state::AppState;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub site: Arc<SiteSnapshot>,
    pub current_path: &'static str,
    pub about_image: Option<SiteImage>,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/contact.html")]
pub struct ContactTemplate {
    pub site: Arc<SiteSnapshot>,
    pub current_path: &'static str,
}

/// Display the about page.
#[instrument(skip(state))]
pub async fn about(State(state): State<AppState>) -> impl IntoResponse {
    let site = state.site();
    let about_image = site.first_image(SiteSection::About).cloned();

    AboutTemplate {
        site,
        current_path: "/nosotros",
        about_image,
    }
}

/// Display the contact page.
#[instrument(skip(state))]
pub async fn contact(State(state): State<AppState>) -> impl IntoResponse {
    ContactTemplate {
        site: state.site(),
        current_path: "/contacto",
    }
}
