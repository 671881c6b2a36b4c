//! Site image management, grouped by page section.
//!
//! Every change is pushed to the shared site snapshot so the storefront
//! picks it up without a restart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use tracing::instrument;

use bultex_core::{DEFAULT_IMAGE_ALT, SiteImage, SiteImageId, SiteSection};

use crate::db::{NewSiteImage, SiteImageRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::storage::{delete_by_url, object_key};
use crate::services::{ObjectStore, buckets};
use crate::state::AppState;

use super::form::MultipartForm;
use super::{AdminUserView, Flash, redirect_error, redirect_success};

const LIST_PATH: &str = "/admin/imagenes";

/// One stored image.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub id: String,
    pub url: String,
    pub alt: String,
    pub title: String,
    pub subtitle: String,
    pub display_order: i32,
    pub is_active: bool,
}

impl From<&SiteImage> for ImageView {
    fn from(image: &SiteImage) -> Self {
        Self {
            id: image.id.to_string(),
            url: image.url.clone(),
            alt: image.alt.clone(),
            title: image.title.clone().unwrap_or_default(),
            subtitle: image.subtitle.clone().unwrap_or_default(),
            display_order: image.display_order,
            is_active: image.is_active,
        }
    }
}

/// A section with its images, in display order.
#[derive(Debug, Clone)]
pub struct SectionView {
    pub key: &'static str,
    pub label: &'static str,
    pub images: Vec<ImageView>,
}

/// Group images under every known section, empty sections included.
#[must_use]
pub fn group_by_section(images: &[SiteImage]) -> Vec<SectionView> {
    SiteSection::ALL
        .iter()
        .map(|&section| {
            let mut in_section: Vec<&SiteImage> =
                images.iter().filter(|image| image.section == section).collect();
            in_section.sort_by_key(|image| image.display_order);

            SectionView {
                key: section.as_str(),
                label: section.label(),
                images: in_section.into_iter().map(ImageView::from).collect(),
            }
        })
        .collect()
}

/// Image management template.
#[derive(Template, WebTemplate)]
#[template(path = "images/index.html")]
pub struct ImagesTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub sections: Vec<SectionView>,
    pub flash: Flash,
}

/// Validated text fields of an image upload; the URL is filled in after
/// the upload succeeds.
///
/// # Errors
///
/// Returns the message shown in the banner.
pub fn parse_image_fields(
    form: &MultipartForm,
) -> std::result::Result<NewSiteImage, &'static str> {
    let section = form
        .text("section")
        .and_then(SiteSection::parse)
        .ok_or("Sección inválida")?;
    let display_order = match form.value("display_order") {
        Some(value) => value
            .parse::<i32>()
            .ok()
            .filter(|order| *order >= 0)
            .ok_or("El orden debe ser un número entero mayor o igual a 0")?,
        None => 0,
    };

    Ok(NewSiteImage {
        section,
        url: String::new(),
        alt: form
            .value("alt")
            .unwrap_or_else(|| DEFAULT_IMAGE_ALT.to_string()),
        title: form.value("title"),
        subtitle: form.value("subtitle"),
        display_order,
    })
}

/// Build the images router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/imagenes", get(index).post(upload))
        .route("/admin/imagenes/{id}/estado", post(toggle))
        .route("/admin/imagenes/{id}/eliminar", post(delete))
}

/// GET /admin/imagenes
#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<Flash>,
) -> Result<ImagesTemplate> {
    let images = SiteImageRepository::new(state.pool()).list().await?;

    Ok(ImagesTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        sections: group_by_section(&images),
        flash: flash.normalized(),
    })
}

/// Upload an image into a section.
///
/// POST /admin/imagenes
#[instrument(skip(state, _admin, multipart))]
async fn upload(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    multipart: Multipart,
) -> Redirect {
    let form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable image form");
            return redirect_error(LIST_PATH, "No se pudo leer el formulario");
        }
    };
    let mut image = match parse_image_fields(&form) {
        Ok(image) => image,
        Err(message) => return redirect_error(LIST_PATH, message),
    };
    let file = match form.image("image") {
        Ok(Some(file)) => file,
        Ok(None) => return redirect_error(LIST_PATH, "Selecciona una imagen"),
        Err(e) => return redirect_error(LIST_PATH, &e.to_string()),
    };

    let storage = state.storage();
    let path = object_key(image.section.as_str(), &file.content_type);
    image.url = match storage.upload(buckets::SITE_IMAGES, &path, file).await {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, "Site image upload failed");
            return redirect_error(LIST_PATH, "No se pudo subir la imagen");
        }
    };

    match SiteImageRepository::new(state.pool()).create(&image).await {
        Ok(id) => {
            tracing::info!(image_id = %id, section = %image.section, "Site image added");
            state.publish_site_changes().await;
            redirect_success(LIST_PATH, "Imagen subida")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to insert site image");
            delete_by_url(storage, buckets::SITE_IMAGES, &image.url).await;
            redirect_error(LIST_PATH, "No se pudo guardar la imagen")
        }
    }
}

/// POST /admin/imagenes/{id}/estado
#[instrument(skip(state, _admin))]
async fn toggle(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<SiteImageId>,
) -> Redirect {
    match SiteImageRepository::new(state.pool()).toggle_active(id).await {
        Ok(active) => {
            state.publish_site_changes().await;
            redirect_success(
                LIST_PATH,
                if active { "Imagen activada" } else { "Imagen desactivada" },
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to toggle site image");
            redirect_error(LIST_PATH, "No se pudo cambiar el estado")
        }
    }
}

/// POST /admin/imagenes/{id}/eliminar
#[instrument(skip(state, _admin))]
async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<SiteImageId>,
) -> Redirect {
    match SiteImageRepository::new(state.pool()).delete(id).await {
        Ok(url) => {
            delete_by_url(state.storage(), buckets::SITE_IMAGES, &url).await;
            state.publish_site_changes().await;
            redirect_success(LIST_PATH, "Imagen eliminada")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete site image");
            redirect_error(LIST_PATH, "No se pudo eliminar la imagen")
        }
    }
}
