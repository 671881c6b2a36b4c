//! Downloadable PDF catalog management.
//!
//! A catalog is a PDF in the `catalogs` bucket plus an optional thumbnail.
//! New files are uploaded before the row is written and the files they
//! replace are removed only after it is; deleting a catalog removes both.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Multipart, Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use bultex_core::{Catalog, CatalogId, format_file_size};

use crate::db::{CatalogRepository, CatalogUpdate, NewCatalog};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::storage::{StagedFiles, delete_by_url, object_key};
use crate::services::{ObjectStore, Upload, buckets};
use crate::state::AppState;

use super::form::MultipartForm;
use super::{AdminUserView, Flash, redirect_error, redirect_success};

const LIST_PATH: &str = "/admin/catalogos";

/// Catalog row in the list.
#[derive(Debug, Clone)]
pub struct CatalogRowView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub file_url: String,
    pub file_name: String,
    pub file_size: String,
    pub thumbnail_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: String,
}

impl From<&Catalog> for CatalogRowView {
    fn from(catalog: &Catalog) -> Self {
        Self {
            id: catalog.id.to_string(),
            title: catalog.title.clone(),
            description: catalog.description.clone().unwrap_or_default(),
            file_url: catalog.file_url.clone(),
            file_name: catalog.file_name.clone(),
            file_size: format_file_size(u64::try_from(catalog.file_size).unwrap_or(0)),
            thumbnail_url: catalog.thumbnail_url.clone(),
            display_order: catalog.display_order,
            is_active: catalog.is_active,
            created_at: catalog.created_at.format("%d/%m/%Y").to_string(),
        }
    }
}

/// Catalog list template.
#[derive(Template, WebTemplate)]
#[template(path = "catalogs/index.html")]
pub struct CatalogsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub catalogs: Vec<CatalogRowView>,
    pub flash: Flash,
}

/// New/edit catalog template. `catalog` is `None` for a new one.
#[derive(Template, WebTemplate)]
#[template(path = "catalogs/form.html")]
pub struct CatalogFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub catalog: Option<CatalogRowView>,
    pub flash: Flash,
}

/// Validated text fields of a catalog form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFields {
    pub title: String,
    pub description: Option<String>,
    /// Only present on the edit form.
    pub display_order: Option<i32>,
    pub is_active: bool,
}

impl CatalogFields {
    /// Validate the text fields.
    ///
    /// # Errors
    ///
    /// Returns the message shown in the form banner.
    pub fn parse(form: &MultipartForm) -> std::result::Result<Self, &'static str> {
        let title = form.value("title").ok_or("El título es requerido")?;
        let display_order = form
            .value("display_order")
            .map(|v| parse_display_order(&v))
            .transpose()?;

        Ok(Self {
            title,
            description: form.value("description"),
            display_order,
            is_active: form.checked("is_active"),
        })
    }
}

fn parse_display_order(value: &str) -> std::result::Result<i32, &'static str> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|order| *order >= 0)
        .ok_or("El orden debe ser un número entero mayor o igual a 0")
}

fn stored_size(upload: &Upload) -> i64 {
    i64::try_from(upload.size()).unwrap_or(i64::MAX)
}

/// Display order form.
#[derive(Debug, Deserialize)]
pub struct OrderForm {
    pub display_order: String,
}

/// Build the catalogs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/catalogos", get(index).post(create))
        .route("/admin/catalogos/nuevo", get(new_form))
        .route("/admin/catalogos/{id}", get(edit_form).post(update))
        .route("/admin/catalogos/{id}/estado", post(toggle))
        .route("/admin/catalogos/{id}/orden", post(reorder))
        .route("/admin/catalogos/{id}/eliminar", post(delete))
}

/// Catalog list, inactive ones included.
///
/// GET /admin/catalogos
#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<Flash>,
) -> Result<CatalogsTemplate> {
    let catalogs = CatalogRepository::new(state.pool()).list().await?;

    Ok(CatalogsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        catalogs: catalogs.iter().map(CatalogRowView::from).collect(),
        flash: flash.normalized(),
    })
}

/// GET /admin/catalogos/nuevo
async fn new_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<Flash>,
) -> CatalogFormTemplate {
    CatalogFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        catalog: None,
        flash: flash.normalized(),
    }
}

/// GET /admin/catalogos/{id}
#[instrument(skip(state, admin))]
async fn edit_form(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CatalogId>,
    Query(flash): Query<Flash>,
) -> Result<CatalogFormTemplate> {
    let catalog = CatalogRepository::new(state.pool()).get(id).await?;

    Ok(CatalogFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        catalog: Some(CatalogRowView::from(&catalog)),
        flash: flash.normalized(),
    })
}

/// Upload a new catalog.
///
/// POST /admin/catalogos
#[instrument(skip(state, _admin, multipart))]
async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    multipart: Multipart,
) -> Redirect {
    const FORM_PATH: &str = "/admin/catalogos/nuevo";

    let form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable catalog form");
            return redirect_error(FORM_PATH, "No se pudo leer el formulario");
        }
    };
    let fields = match CatalogFields::parse(&form) {
        Ok(fields) => fields,
        Err(message) => return redirect_error(FORM_PATH, message),
    };
    let pdf = match form.pdf("file") {
        Ok(Some(pdf)) => pdf,
        Ok(None) => return redirect_error(FORM_PATH, "Selecciona un archivo PDF"),
        Err(e) => return redirect_error(FORM_PATH, &e.to_string()),
    };
    let thumbnail = match form.image("thumbnail") {
        Ok(thumbnail) => thumbnail,
        Err(e) => return redirect_error(FORM_PATH, &e.to_string()),
    };

    let storage = state.storage();
    let mut staged = StagedFiles::new(buckets::CATALOGS);
    let file_url = match staged
        .stage(storage, None, &object_key("pdfs", &pdf.content_type), pdf)
        .await
    {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, "Catalog PDF upload failed");
            return redirect_error(FORM_PATH, "No se pudo subir el PDF");
        }
    };

    let thumbnail_url = match thumbnail {
        Some(upload) => {
            let path = object_key("thumbnails", &upload.content_type);
            match staged.stage(storage, None, &path, upload).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!(error = %e, "Catalog thumbnail upload failed");
                    staged.discard(storage).await;
                    return redirect_error(FORM_PATH, "No se pudo subir la miniatura");
                }
            }
        }
        None => None,
    };

    let new_catalog = NewCatalog {
        title: fields.title,
        description: fields.description,
        file_url,
        file_name: pdf.file_name.clone(),
        file_size: stored_size(pdf),
        thumbnail_url,
    };

    match CatalogRepository::new(state.pool()).create(&new_catalog).await {
        Ok(id) => {
            staged.commit(storage).await;
            tracing::info!(catalog_id = %id, "Catalog uploaded");
            redirect_success(LIST_PATH, "Catálogo subido")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to insert catalog");
            staged.discard(storage).await;
            redirect_error(FORM_PATH, "No se pudo guardar el catálogo")
        }
    }
}

/// Edit a catalog; the PDF and thumbnail are replaced only when sent.
///
/// POST /admin/catalogos/{id}
#[instrument(skip(state, _admin, multipart))]
async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CatalogId>,
    multipart: Multipart,
) -> Redirect {
    let form_path = format!("{LIST_PATH}/{id}");
    let repo = CatalogRepository::new(state.pool());

    let existing = match repo.get(id).await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!(error = %e, "Catalog to update not found");
            return redirect_error(LIST_PATH, "El catálogo ya no existe");
        }
    };

    let form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable catalog form");
            return redirect_error(&form_path, "No se pudo leer el formulario");
        }
    };
    let fields = match CatalogFields::parse(&form) {
        Ok(fields) => fields,
        Err(message) => return redirect_error(&form_path, message),
    };
    let (pdf, thumbnail) = match (form.pdf("file"), form.image("thumbnail")) {
        (Ok(pdf), Ok(thumbnail)) => (pdf, thumbnail),
        (Err(e), _) | (_, Err(e)) => return redirect_error(&form_path, &e.to_string()),
    };

    let mut update = CatalogUpdate::from_catalog(&existing);
    update.title = fields.title;
    update.description = fields.description;
    update.is_active = fields.is_active;
    if let Some(order) = fields.display_order {
        update.display_order = order;
    }

    let storage = state.storage();
    let staged = match stage_replacements(storage, &existing, &mut update, pdf, thumbnail).await {
        Ok(staged) => staged,
        Err(message) => return redirect_error(&form_path, message),
    };

    match repo.update(id, &update).await {
        Ok(()) => {
            staged.commit(storage).await;
            redirect_success(LIST_PATH, "Catálogo actualizado")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to update catalog");
            staged.discard(storage).await;
            redirect_error(&form_path, "No se pudo guardar el catálogo")
        }
    }
}

/// Upload the replacement PDF and thumbnail and point `update` at them.
///
/// Nothing the row currently references is touched. If any upload fails the
/// ones already made are removed and the visitor-facing message is returned.
async fn stage_replacements<S: ObjectStore>(
    store: &S,
    existing: &Catalog,
    update: &mut CatalogUpdate,
    pdf: Option<&Upload>,
    thumbnail: Option<&Upload>,
) -> std::result::Result<StagedFiles, &'static str> {
    let mut staged = StagedFiles::new(buckets::CATALOGS);
    if let Some(upload) = pdf {
        let path = object_key("pdfs", &upload.content_type);
        match staged.stage(store, Some(&existing.file_url), &path, upload).await {
            Ok(url) => {
                update.file_url = url;
                update.file_name = upload.file_name.clone();
                update.file_size = stored_size(upload);
            }
            Err(e) => {
                tracing::error!(error = %e, "Catalog PDF upload failed");
                return Err("No se pudo subir el PDF");
            }
        }
    }
    if let Some(upload) = thumbnail {
        let path = object_key("thumbnails", &upload.content_type);
        match staged
            .stage(store, existing.thumbnail_url.as_deref(), &path, upload)
            .await
        {
            Ok(url) => update.thumbnail_url = Some(url),
            Err(e) => {
                tracing::error!(error = %e, "Catalog thumbnail upload failed");
                staged.discard(store).await;
                return Err("No se pudo subir la miniatura");
            }
        }
    }
    Ok(staged)
}

/// Flip the active flag.
///
/// POST /admin/catalogos/{id}/estado
#[instrument(skip(state, _admin))]
async fn toggle(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CatalogId>,
) -> Redirect {
    match CatalogRepository::new(state.pool()).toggle_active(id).await {
        Ok(true) => redirect_success(LIST_PATH, "Catálogo activado"),
        Ok(false) => redirect_success(LIST_PATH, "Catálogo desactivado"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to toggle catalog");
            redirect_error(LIST_PATH, "No se pudo cambiar el estado")
        }
    }
}

/// Set the display order.
///
/// POST /admin/catalogos/{id}/orden
#[instrument(skip(state, _admin, form))]
async fn reorder(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CatalogId>,
    Form(form): Form<OrderForm>,
) -> Redirect {
    let order = match parse_display_order(&form.display_order) {
        Ok(order) => order,
        Err(message) => return redirect_error(LIST_PATH, message),
    };

    match CatalogRepository::new(state.pool()).set_display_order(id, order).await {
        Ok(()) => redirect_success(LIST_PATH, "Orden actualizado"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to reorder catalog");
            redirect_error(LIST_PATH, "No se pudo cambiar el orden")
        }
    }
}

/// Delete the row, then its stored files.
///
/// POST /admin/catalogos/{id}/eliminar
#[instrument(skip(state, _admin))]
async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CatalogId>,
) -> Redirect {
    match CatalogRepository::new(state.pool()).delete(id).await {
        Ok(catalog) => {
            delete_catalog_files(state.storage(), &catalog).await;
            redirect_success(LIST_PATH, "Catálogo eliminado")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete catalog");
            redirect_error(LIST_PATH, "No se pudo eliminar el catálogo")
        }
    }
}

/// Remove a deleted catalog's PDF and thumbnail. Failures are logged.
async fn delete_catalog_files<S: ObjectStore>(store: &S, catalog: &Catalog) {
    delete_by_url(store, buckets::CATALOGS, &catalog.file_url).await;
    if let Some(url) = &catalog.thumbnail_url {
        delete_by_url(store, buckets::CATALOGS, url).await;
    }
}
