//! Cart route handlers.
//!
//! The cart page is server-rendered; add, update and remove are small JSON
//! endpoints called from `static/js/main.js`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use petlandia_core::ProductId;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, push_flash};
use crate::models::{Cart, Flash};
use crate::routes::PageContext;
use crate::services::{CartService, QuantityChange};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /cart/update/{id}`.
#[derive(Debug, Deserialize)]
pub struct QuantityChangeRequest {
    /// Signed amount to add to the current quantity.
    #[serde(default)]
    pub change: i64,
}

/// Response of `POST /cart/add/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartResponse {
    pub success: bool,
    /// Distinct lines in the cart after the add.
    pub cart_count: u32,
}

/// Response of the update and remove endpoints.
#[derive(Debug, Serialize)]
pub struct CartMutationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// New quantity, absent when the line is gone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub cart: Cart,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let user_id = user.id;
    let cart = CartService::new(state.pool()).view_cart(user_id).await;
    let mut page = PageContext::load(&state, &session, Some(user)).await;

    let cart = cart.unwrap_or_else(|e| {
        tracing::error!("Failed to load cart: {e}");
        page.flashes.push(Flash::danger("Your cart could not be loaded"));
        Cart::default()
    });

    CartTemplate { page, cart }
}

/// Add one unit of a product to the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<AddToCartResponse>> {
    let cart_count = CartService::new(state.pool())
        .add_to_cart(user.id, product_id)
        .await?;

    Ok(Json(AddToCartResponse {
        success: true,
        cart_count,
    }))
}

/// Change the quantity of a cart line.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
    payload: std::result::Result<Json<QuantityChangeRequest>, JsonRejection>,
) -> Result<Json<CartMutationResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let change = CartService::new(state.pool())
        .update_quantity(user.id, product_id, request.change)
        .await?;

    let response = match change {
        QuantityChange::Updated(quantity) => CartMutationResponse {
            success: true,
            message: None,
            quantity: Some(quantity),
        },
        QuantityChange::Removed => CartMutationResponse {
            success: true,
            message: Some("Item removed from cart".to_owned()),
            quantity: None,
        },
    };

    Ok(Json(response))
}

/// Remove a line from the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartMutationResponse>> {
    CartService::new(state.pool())
        .remove_from_cart(user.id, product_id)
        .await?;

    Ok(Json(CartMutationResponse {
        success: true,
        message: None,
        quantity: None,
    }))
}

/// Checkout is not implemented; send the user back to the cart.
pub async fn checkout(RequireAuth(_user): RequireAuth, session: Session) -> Response {
    push_flash(&session, Flash::info("Checkout is not available yet")).await;
    Redirect::to("/cart").into_response()
}
