//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Product;
use crate::routes::PageContext;
use crate::services::CatalogService;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
    /// Every product in the catalog.
    pub products: Vec<Product>,
}

/// Display the product list.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let products = CatalogService::new(state.pool(), state.uploads())
        .list_products()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to list products: {e}");
            Vec::new()
        });

    IndexTemplate {
        page: PageContext::load(&state, &session, user).await,
        products,
    }
}
