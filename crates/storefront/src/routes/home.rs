//! Home page route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use bultex_core::{SiteImage, SiteSection, SiteSnapshot};

use crate::filters;
use crate::state::AppState;

/// A selling point shown next to the features image.
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

const FEATURES: &[Feature] = &[
    Feature {
        title: "Durabilidad Garantizada",
        description: "Telas de alta resistencia diseñadas para el trabajo rudo industrial.",
    },
    Feature {
        title: "Personalización Total",
        description: "Bordado y estampado de logotipos para fortalecer tu identidad corporativa.",
    },
    Feature {
        title: "Envíos a todo México",
        description: "Logística eficiente para entregar tus uniformes donde los necesites.",
    },
    Feature {
        title: "Calidad Premium",
        description: "Confección detallada y materiales que cumplen normas de seguridad.",
    },
];

/// Home page template.
///
/// Sections without configured images render without imagery.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub site: Arc<SiteSnapshot>,
    pub current_path: &'static str,
    pub hero_images: Vec<SiteImage>,
    pub hero_side: Option<SiteImage>,
    pub feature_image: Option<SiteImage>,
    pub features: &'static [Feature],
}

impl HomeTemplate {
    fn new(site: Arc<SiteSnapshot>) -> Self {
        let hero_images = site.images_for(SiteSection::Hero).cloned().collect();
        let hero_side = site.first_image(SiteSection::HeroSide).cloned();
        let feature_image = site.first_image(SiteSection::Features).cloned();

        Self {
            site,
            current_path: "/",
            hero_images,
            hero_side,
            feature_image,
            features: FEATURES,
        }
    }
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    HomeTemplate::new(state.site())
}
