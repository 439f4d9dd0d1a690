//! Admin panel route handlers.
//!
//! Product create and edit are multipart form posts answered with a redirect
//! and a flash notice. Product fetch and delete are JSON endpoints used by
//! the dashboard script.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use petlandia_core::ProductId;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAdmin, push_flash};
use crate::models::{Flash, Product};
use crate::routes::PageContext;
use crate::services::{CatalogError, CatalogService, ImageUpload, ProductForm};
use crate::state::AppState;

// =============================================================================
// View / Response Types
// =============================================================================

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub products: Vec<Product>,
}

/// Product fields as returned by `GET /admin/product/{id}`.
#[derive(Debug, Serialize)]
pub struct ProductJson {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: u32,
    pub image_url: Option<String>,
}

impl From<Product> for ProductJson {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price.amount(),
            stock: product.stock,
            image_url: product.image_url,
        }
    }
}

/// Response of `DELETE /admin/product/{id}`.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Fields of a product create/edit form.
#[derive(Debug, Default)]
struct ProductSubmission {
    product_id: Option<String>,
    form: ProductForm,
    image: Option<ImageUpload>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Read a product form. A file input left empty yields no image.
async fn read_submission(
    mut multipart: Multipart,
) -> std::result::Result<ProductSubmission, MultipartError> {
    let mut submission = ProductSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await?;
                if !file_name.is_empty() {
                    submission.image = Some(ImageUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "product_id" => submission.product_id = Some(field.text().await?),
            "name" => submission.form.name = field.text().await?,
            "description" => submission.form.description = field.text().await?,
            "price" => submission.form.price = field.text().await?,
            "stock" => submission.form.stock = field.text().await?,
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(submission)
}

/// Turn a failed catalog operation into a flash notice, reporting server errors.
fn failure_flash(action: &str, err: CatalogError) -> Flash {
    let err = AppError::from(err);
    if err.status().is_server_error() {
        let event_id = sentry::capture_error(&err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "Failed to {action} product");
    } else {
        tracing::info!(error = %err, "Rejected {action} product");
    }
    Flash::danger(format!("Error trying to {action} the product: {}", err.public_message()))
}

// =============================================================================
// Routes
// =============================================================================

/// Admin dashboard with the product table.
#[instrument(skip(admin, state, session), fields(user_id = %admin.id))]
pub async fn dashboard(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    let products = CatalogService::new(state.pool(), state.uploads())
        .list_products()
        .await;
    let mut page = PageContext::load(&state, &session, Some(admin)).await;

    let products = products.unwrap_or_else(|e| {
        tracing::error!("Failed to list products: {e}");
        page.flashes.push(Flash::danger("Products could not be loaded"));
        Vec::new()
    });

    DashboardTemplate { page, products }
}

/// Create a product from the dashboard form.
#[instrument(skip(admin, state, session, multipart), fields(user_id = %admin.id))]
pub async fn add_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Response {
    let flash = match read_submission(multipart).await {
        Ok(submission) => match CatalogService::new(state.pool(), state.uploads())
            .add_product(&submission.form, submission.image.as_ref())
            .await
        {
            Ok(product) => {
                let product_id = product.id.to_string();
                add_breadcrumb(
                    "catalog",
                    "Created product",
                    Some(&[("product_id", product_id.as_str())]),
                );
                Flash::success("Product added successfully")
            }
            Err(e) => failure_flash("add", e),
        },
        Err(e) => {
            tracing::info!(error = %e, "Unreadable product form");
            Flash::danger(format!("Error trying to add the product: {}", e.body_text()))
        }
    };

    push_flash(&session, flash).await;
    Redirect::to("/admin").into_response()
}

/// Update a product from the dashboard edit form.
#[instrument(skip(admin, state, session, multipart), fields(user_id = %admin.id))]
pub async fn edit_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Response {
    let flash = match read_submission(multipart).await {
        Ok(submission) => {
            let catalog = CatalogService::new(state.pool(), state.uploads());
            let result = match submission.product_id.as_deref().map(str::parse::<ProductId>) {
                Some(Ok(id)) => {
                    catalog
                        .edit_product(id, &submission.form, submission.image.as_ref())
                        .await
                }
                _ => Err(CatalogError::Validation("missing or invalid product id".to_owned())),
            };

            match result {
                Ok(product) => {
                    let product_id = product.id.to_string();
                    add_breadcrumb(
                        "catalog",
                        "Updated product",
                        Some(&[("product_id", product_id.as_str())]),
                    );
                    Flash::success("Product updated successfully")
                }
                Err(e) => failure_flash("update", e),
            }
        }
        Err(e) => {
            tracing::info!(error = %e, "Unreadable product form");
            Flash::danger(format!("Error trying to update the product: {}", e.body_text()))
        }
    };

    push_flash(&session, flash).await;
    Redirect::to("/admin").into_response()
}

/// Product fields for the edit dialog.
#[instrument(skip(_admin, state))]
pub async fn get_product(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductJson>> {
    let product = CatalogService::new(state.pool(), state.uploads())
        .get_product(id)
        .await?;

    Ok(Json(product.into()))
}

/// Delete a product together with every cart line referencing it.
#[instrument(skip(admin, state), fields(user_id = %admin.id))]
pub async fn delete_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<DeleteResponse>> {
    let deletion = CatalogService::new(state.pool(), state.uploads())
        .delete_product(id)
        .await?;

    let product_id = id.to_string();
    let cart_lines_removed = deletion.cart_lines_removed.to_string();
    add_breadcrumb(
        "catalog",
        "Deleted product",
        Some(&[
            ("product_id", product_id.as_str()),
            ("cart_lines_removed", cart_lines_removed.as_str()),
        ]),
    );

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Product \"{}\" deleted", deletion.product.name),
    }))
}
