//! Category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use tracing::instrument;

use bultex_core::{Category, CategoryId, slugify};

use crate::db::categories::CategoryWithCount;
use crate::db::{CategoryInput, CategoryRepository, RepositoryError};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::buckets;
use crate::services::storage::{StagedFiles, delete_by_url, object_key};
use crate::state::AppState;

use super::form::MultipartForm;
use super::{AdminUserView, Flash, redirect_error, redirect_success};

const LIST_PATH: &str = "/admin/categorias";

const DUPLICATE_SLUG: &str = "Ya existe una categoría con ese slug";

/// Category row in the list.
#[derive(Debug, Clone)]
pub struct CategoryRowView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub product_count: i64,
}

impl From<&CategoryWithCount> for CategoryRowView {
    fn from(row: &CategoryWithCount) -> Self {
        Self {
            id: row.category.id.to_string(),
            name: row.category.name.clone(),
            slug: row.category.slug.clone(),
            image_url: row.category.image_url.clone(),
            product_count: row.product_count,
        }
    }
}

/// Values shown in the category form.
#[derive(Debug, Clone, Default)]
pub struct CategoryFormView {
    pub id: Option<String>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: Option<String>,
}

impl From<&Category> for CategoryFormView {
    fn from(category: &Category) -> Self {
        Self {
            id: Some(category.id.to_string()),
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone().unwrap_or_default(),
            image_url: category.image_url.clone(),
        }
    }
}

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub categories: Vec<CategoryRowView>,
    pub flash: Flash,
}

/// New/edit category template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub category: CategoryFormView,
    pub flash: Flash,
}

/// Validate a category form.
///
/// An empty slug is generated from the name; a typed slug is normalized the
/// same way.
///
/// # Errors
///
/// Returns the message shown in the form banner.
pub fn parse_category(
    form: &MultipartForm,
    image_url: Option<String>,
) -> std::result::Result<CategoryInput, &'static str> {
    let name = form.value("name").ok_or("El nombre es requerido")?;
    let slug = slugify(&form.value("slug").unwrap_or_else(|| name.clone()));
    if slug.trim_matches('-').is_empty() {
        return Err("El slug solo puede contener letras, números y guiones");
    }

    Ok(CategoryInput {
        name,
        slug,
        description: form.value("description"),
        image_url,
    })
}

fn write_error_message(error: &RepositoryError) -> &'static str {
    match error {
        RepositoryError::Conflict(_) => DUPLICATE_SLUG,
        RepositoryError::NotFound => "La categoría ya no existe",
        _ => "Error al guardar la categoría",
    }
}

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/categorias", get(index).post(create))
        .route("/admin/categorias/nueva", get(new_form))
        .route("/admin/categorias/{id}", get(edit_form).post(update))
        .route("/admin/categorias/{id}/eliminar", post(delete))
}

/// Category list with product counts.
///
/// GET /admin/categorias
#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<Flash>,
) -> Result<CategoriesTemplate> {
    let categories = CategoryRepository::new(state.pool()).list_with_counts().await?;

    Ok(CategoriesTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        categories: categories.iter().map(CategoryRowView::from).collect(),
        flash: flash.normalized(),
    })
}

/// New category form.
///
/// GET /admin/categorias/nueva
async fn new_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<Flash>,
) -> CategoryFormTemplate {
    CategoryFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        category: CategoryFormView::default(),
        flash: flash.normalized(),
    }
}

/// Edit category form.
///
/// GET /admin/categorias/{id}
#[instrument(skip(state, admin))]
async fn edit_form(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
    Query(flash): Query<Flash>,
) -> Result<CategoryFormTemplate> {
    let category = CategoryRepository::new(state.pool()).get(id).await?;

    Ok(CategoryFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        category: CategoryFormView::from(&category),
        flash: flash.normalized(),
    })
}

/// Create a category.
///
/// POST /admin/categorias
#[instrument(skip(state, _admin, multipart))]
async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    multipart: Multipart,
) -> Redirect {
    const FORM_PATH: &str = "/admin/categorias/nueva";

    let form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable category form");
            return redirect_error(FORM_PATH, "No se pudo leer el formulario");
        }
    };
    // Validate before uploading anything
    if let Err(message) = parse_category(&form, None) {
        return redirect_error(FORM_PATH, message);
    }
    let image = match form.image("image") {
        Ok(image) => image,
        Err(e) => return redirect_error(FORM_PATH, &e.to_string()),
    };

    let storage = state.storage();
    let mut staged = StagedFiles::new(buckets::CATEGORIES);
    let image_url = match image {
        Some(upload) => {
            let path = object_key("images", &upload.content_type);
            match staged.stage(storage, None, &path, upload).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!(error = %e, "Category image upload failed");
                    return redirect_error(FORM_PATH, "No se pudo subir la imagen");
                }
            }
        }
        None => None,
    };

    let input = match parse_category(&form, image_url) {
        Ok(input) => input,
        Err(message) => {
            staged.discard(storage).await;
            return redirect_error(FORM_PATH, message);
        }
    };

    match CategoryRepository::new(state.pool()).create(&input).await {
        Ok(_) => {
            staged.commit(storage).await;
            redirect_success(LIST_PATH, "Categoría creada")
        }
        Err(e) => {
            if !matches!(e, RepositoryError::Conflict(_)) {
                tracing::error!(error = %e, "Failed to create category");
            }
            staged.discard(storage).await;
            redirect_error(FORM_PATH, write_error_message(&e))
        }
    }
}

/// Update a category, replacing its image when a new one is sent.
///
/// POST /admin/categorias/{id}
#[instrument(skip(state, _admin, multipart))]
async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
    multipart: Multipart,
) -> Redirect {
    let form_path = format!("{LIST_PATH}/{id}");
    let repo = CategoryRepository::new(state.pool());

    let existing = match repo.get(id).await {
        Ok(category) => category,
        Err(e) => {
            tracing::warn!(error = %e, "Category to update not found");
            return redirect_error(LIST_PATH, "La categoría ya no existe");
        }
    };

    let form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable category form");
            return redirect_error(&form_path, "No se pudo leer el formulario");
        }
    };
    if let Err(message) = parse_category(&form, None) {
        return redirect_error(&form_path, message);
    }

    let storage = state.storage();
    let mut staged = StagedFiles::new(buckets::CATEGORIES);
    let image_url = match form.image("image") {
        Ok(Some(upload)) => {
            let path = object_key("images", &upload.content_type);
            match staged
                .stage(storage, existing.image_url.as_deref(), &path, upload)
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!(error = %e, "Category image upload failed");
                    return redirect_error(&form_path, "No se pudo subir la imagen");
                }
            }
        }
        Ok(None) => existing.image_url,
        Err(e) => return redirect_error(&form_path, &e.to_string()),
    };

    let input = match parse_category(&form, image_url) {
        Ok(input) => input,
        Err(message) => {
            staged.discard(storage).await;
            return redirect_error(&form_path, message);
        }
    };

    match repo.update(id, &input).await {
        Ok(()) => {
            staged.commit(storage).await;
            redirect_success(LIST_PATH, "Categoría actualizada")
        }
        Err(e) => {
            if !matches!(e, RepositoryError::Conflict(_)) {
                tracing::error!(error = %e, "Failed to update category");
            }
            staged.discard(storage).await;
            redirect_error(&form_path, write_error_message(&e))
        }
    }
}

/// Delete a category. Its products stay, without a category.
///
/// POST /admin/categorias/{id}/eliminar
#[instrument(skip(state, _admin))]
async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
) -> Redirect {
    match CategoryRepository::new(state.pool()).delete(id).await {
        Ok(image_url) => {
            if let Some(url) = image_url {
                delete_by_url(state.storage(), buckets::CATEGORIES, &url).await;
            }
            redirect_success(LIST_PATH, "Categoría eliminada")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete category");
            redirect_error(LIST_PATH, "No se pudo eliminar la categoría")
        }
    }
}
