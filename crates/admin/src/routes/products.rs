//! Product management.
//!
//! Product images go to the `products` bucket. Replacing an image uploads
//! the new file first and removes the old one only after the row is saved.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use tracing::instrument;

use bultex_core::{Category, CategoryId, Price, Product, ProductId};

use crate::db::{CategoryRepository, ProductInput, ProductRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::buckets;
use crate::services::storage::{StagedFiles, delete_by_url, object_key};
use crate::state::AppState;

use super::form::MultipartForm;
use super::{AdminUserView, Flash, redirect_error, redirect_success};

const LIST_PATH: &str = "/admin/productos";

// =============================================================================
// Templates
// =============================================================================

/// Product row in the list.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub name: String,
    pub category_name: String,
    pub price: String,
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category_name: product.category_name().unwrap_or_default().to_string(),
            price: product.price.to_string(),
            image_url: product.image_url.clone(),
            is_active: product.is_active,
        }
    }
}

/// Values shown in the product form.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub price: String,
    pub category_id: String,
    pub marketplace_url: String,
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl From<&Product> for ProductFormView {
    fn from(product: &Product) -> Self {
        Self {
            id: Some(product.id.to_string()),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_input_value(),
            category_id: product.category_id.map(|id| id.to_string()).unwrap_or_default(),
            marketplace_url: product.marketplace_url.clone().unwrap_or_default(),
            image_url: product.image_url.clone(),
            is_active: product.is_active,
        }
    }
}

/// Category choice in the form's select box.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
}

impl From<&Category> for CategoryOption {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
        }
    }
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub products: Vec<ProductRowView>,
    pub flash: Flash,
}

/// New/edit product template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub product: ProductFormView,
    pub categories: Vec<CategoryOption>,
    pub flash: Flash,
}

// =============================================================================
// Form parsing
// =============================================================================

/// Validated product fields, without the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category_id: Option<CategoryId>,
    pub marketplace_url: Option<String>,
    pub is_active: bool,
}

impl ProductFields {
    /// Validate the text fields of a product form.
    ///
    /// # Errors
    ///
    /// Returns the message shown in the form banner.
    pub fn parse(form: &MultipartForm) -> std::result::Result<Self, &'static str> {
        let name = form.value("name").ok_or("El nombre es requerido")?;
        let price = Price::parse(form.text("price").unwrap_or_default())
            .map_err(|_| "El precio debe ser un número mayor o igual a 0")?;
        let category_id = form
            .value("category_id")
            .map(|raw| CategoryId::parse(&raw))
            .transpose()
            .map_err(|_| "Categoría inválida")?;

        Ok(Self {
            name,
            description: form.value("description"),
            price,
            category_id,
            marketplace_url: form.value("marketplace_url"),
            is_active: form.checked("is_active"),
        })
    }

    fn into_input(self, image_url: Option<String>) -> ProductInput {
        ProductInput {
            name: self.name,
            description: self.description,
            price: self.price,
            category_id: self.category_id,
            marketplace_url: self.marketplace_url,
            image_url,
            is_active: self.is_active,
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/productos", get(index).post(create))
        .route("/admin/productos/nuevo", get(new_form))
        .route("/admin/productos/{id}", get(edit_form).post(update))
        .route("/admin/productos/{id}/estado", post(toggle))
        .route("/admin/productos/{id}/eliminar", post(delete))
}

// =============================================================================
// Handlers
// =============================================================================

/// Product list.
///
/// GET /admin/productos
#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<Flash>,
) -> Result<ProductsTemplate> {
    let products = ProductRepository::new(state.pool()).list().await?;

    Ok(ProductsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        products: products.iter().map(ProductRowView::from).collect(),
        flash: flash.normalized(),
    })
}

async fn category_options(state: &AppState) -> Result<Vec<CategoryOption>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(categories.iter().map(CategoryOption::from).collect())
}

/// New product form.
///
/// GET /admin/productos/nuevo
#[instrument(skip(state, admin))]
async fn new_form(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<Flash>,
) -> Result<ProductFormTemplate> {
    Ok(ProductFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        product: ProductFormView {
            is_active: true,
            ..ProductFormView::default()
        },
        categories: category_options(&state).await?,
        flash: flash.normalized(),
    })
}

/// Edit product form.
///
/// GET /admin/productos/{id}
#[instrument(skip(state, admin))]
async fn edit_form(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    Query(flash): Query<Flash>,
) -> Result<ProductFormTemplate> {
    let product = ProductRepository::new(state.pool()).get(id).await?;

    Ok(ProductFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: LIST_PATH,
        product: ProductFormView::from(&product),
        categories: category_options(&state).await?,
        flash: flash.normalized(),
    })
}

/// Create a product, uploading its image first.
///
/// POST /admin/productos
#[instrument(skip(state, _admin, multipart))]
async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    multipart: Multipart,
) -> Redirect {
    const FORM_PATH: &str = "/admin/productos/nuevo";

    let form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable product form");
            return redirect_error(FORM_PATH, "No se pudo leer el formulario");
        }
    };
    let fields = match ProductFields::parse(&form) {
        Ok(fields) => fields,
        Err(message) => return redirect_error(FORM_PATH, message),
    };
    let image = match form.image("image") {
        Ok(image) => image,
        Err(e) => return redirect_error(FORM_PATH, &e.to_string()),
    };

    let storage = state.storage();
    let mut staged = StagedFiles::new(buckets::PRODUCTS);
    let image_url = match image {
        Some(upload) => {
            let path = object_key("images", &upload.content_type);
            match staged.stage(storage, None, &path, upload).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!(error = %e, "Product image upload failed");
                    return redirect_error(FORM_PATH, "No se pudo subir la imagen");
                }
            }
        }
        None => None,
    };

    let input = fields.into_input(image_url);
    match ProductRepository::new(state.pool()).create(&input).await {
        Ok(id) => {
            staged.commit(storage).await;
            tracing::info!(product_id = %id, "Product created");
            redirect_success(LIST_PATH, "Producto creado")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create product");
            staged.discard(storage).await;
            redirect_error(FORM_PATH, "Error al guardar el producto")
        }
    }
}

/// Update a product, replacing its image when a new one is sent.
///
/// POST /admin/productos/{id}
#[instrument(skip(state, _admin, multipart))]
async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Redirect {
    let form_path = format!("{LIST_PATH}/{id}");
    let repo = ProductRepository::new(state.pool());

    let existing = match repo.get(id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(error = %e, "Product to update not found");
            return redirect_error(LIST_PATH, "El producto ya no existe");
        }
    };

    let form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable product form");
            return redirect_error(&form_path, "No se pudo leer el formulario");
        }
    };
    let fields = match ProductFields::parse(&form) {
        Ok(fields) => fields,
        Err(message) => return redirect_error(&form_path, message),
    };

    let storage = state.storage();
    let mut staged = StagedFiles::new(buckets::PRODUCTS);
    let image_url = match form.image("image") {
        Ok(Some(upload)) => {
            let path = object_key("images", &upload.content_type);
            match staged
                .stage(storage, existing.image_url.as_deref(), &path, upload)
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!(error = %e, "Product image upload failed");
                    return redirect_error(&form_path, "No se pudo subir la imagen");
                }
            }
        }
        Ok(None) => existing.image_url,
        Err(e) => return redirect_error(&form_path, &e.to_string()),
    };

    match repo.update(id, &fields.into_input(image_url)).await {
        Ok(()) => {
            staged.commit(storage).await;
            redirect_success(LIST_PATH, "Producto actualizado")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to update product");
            staged.discard(storage).await;
            redirect_error(&form_path, "Error al guardar el producto")
        }
    }
}

/// Flip a product's visibility on the public catalog.
///
/// POST /admin/productos/{id}/estado
#[instrument(skip(state, _admin))]
async fn toggle(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Redirect {
    match ProductRepository::new(state.pool()).toggle_active(id).await {
        Ok(true) => redirect_success(LIST_PATH, "Producto activado"),
        Ok(false) => redirect_success(LIST_PATH, "Producto desactivado"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to toggle product");
            redirect_error(LIST_PATH, "No se pudo cambiar el estado del producto")
        }
    }
}

/// Delete a product and then its image.
///
/// POST /admin/productos/{id}/eliminar
#[instrument(skip(state, _admin))]
async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Redirect {
    match ProductRepository::new(state.pool()).delete(id).await {
        Ok(image_url) => {
            if let Some(url) = image_url {
                delete_by_url(state.storage(), buckets::PRODUCTS, &url).await;
            }
            redirect_success(LIST_PATH, "Producto eliminado")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete product");
            redirect_error(LIST_PATH, "No se pudo eliminar el producto")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bultex_core::{CategoryRef, random_uuid};
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_parse_full_form() {
        let category = random_uuid().to_string();
        let form = MultipartForm::from_fields(&[
            ("name", " Overol de mezclilla "),
            ("description", "Con reflejante"),
            ("price", "$1,250.50"),
            ("category_id", category.as_str()),
            ("marketplace_url", ""),
            ("is_active", "on"),
        ]);

        let fields = ProductFields::parse(&form).unwrap();
        assert_eq!(fields.name, "Overol de mezclilla");
        assert_eq!(fields.price.to_input_value(), "1250.50");
        assert_eq!(fields.category_id.unwrap().to_string(), category);
        assert_eq!(fields.marketplace_url, None);
        assert!(fields.is_active);
    }

    #[test]
    fn test_parse_requires_name() {
        let form = MultipartForm::from_fields(&[("name", "  "), ("price", "10")]);
        assert_eq!(ProductFields::parse(&form), Err("El nombre es requerido"));
    }

    #[test]
    fn test_parse_rejects_negative_price() {
        let form = MultipartForm::from_fields(&[("name", "Bata"), ("price", "-5")]);
        assert_eq!(
            ProductFields::parse(&form),
            Err("El precio debe ser un número mayor o igual a 0")
        );
    }

    #[test]
    fn test_parse_without_category_or_checkbox() {
        let form = MultipartForm::from_fields(&[("name", "Bata"), ("price", "0"), ("category_id", "")]);
        let fields = ProductFields::parse(&form).unwrap();
        assert_eq!(fields.category_id, None);
        assert!(!fields.is_active);
    }

    #[test]
    fn test_row_view_shows_category() {
        let category_id = CategoryId::new(random_uuid());
        let product = Product {
            id: ProductId::new(random_uuid()),
            name: "Camisa".to_string(),
            description: None,
            price: Price::parse("350").unwrap(),
            category_id: Some(category_id),
            category: Some(CategoryRef {
                id: category_id,
                name: "Camisas".to_string(),
                slug: "camisas".to_string(),
            }),
            image_url: None,
            marketplace_url: None,
            is_active: true,
            created_at: Utc::now(),
        };

        let row = ProductRowView::from(&product);
        assert_eq!(row.category_name, "Camisas");
        assert_eq!(row.price, "$350.00");
        assert_eq!(ProductFormView::from(&product).price, "350.00");
    }
}
