//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                     - Product list
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (database)
//!
//! # Auth
//! GET    /login                - Login page
//! POST   /login                - Login action (honours ?next=)
//! GET    /logout               - Logout action
//!
//! # Admin (administrator only)
//! GET    /admin                - Dashboard
//! POST   /admin/product/add    - Create product (multipart, redirect + flash)
//! POST   /admin/product/edit   - Update product (multipart, redirect + flash)
//! GET    /admin/product/{id}   - Product fields (JSON)
//! DELETE /admin/product/{id}   - Delete product and its cart lines (JSON)
//!
//! # Cart (logged in)
//! GET    /cart                 - Cart page
//! POST   /cart/add/{id}        - Add one unit (JSON)
//! POST   /cart/update/{id}     - Change quantity by {"change": n} (JSON)
//! POST   /cart/remove/{id}     - Remove line (JSON)
//! GET    /checkout             - Not available yet, redirects to cart
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod home;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::take_flashes;
use crate::models::{CurrentUser, Flash};
use crate::services::CartService;
use crate::state::AppState;

/// Data every page layout needs: the navigation state and pending notices.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub current_user: Option<CurrentUser>,
    pub cart_count: u32,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Collect layout data, consuming pending flash notices.
    pub async fn load(state: &AppState, session: &Session, current_user: Option<CurrentUser>) -> Self {
        let cart_count = match &current_user {
            Some(user) => CartService::new(state.pool())
                .cart_count(user.id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to count cart lines for navigation");
                    0
                }),
            None => 0,
        };

        Self {
            current_user,
            cart_count,
            flashes: take_flashes(session).await,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(|u| u.is_admin)
    }
}

/// Create the admin routes router.
///
/// Product forms carry image uploads, so the body limit is raised to
/// `max_upload_bytes` for this router only.
pub fn admin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/product/add", post(admin::add_product))
        .route("/product/edit", post(admin::edit_product))
        .route(
            "/product/{id}",
            get(admin::get_product).delete(admin::delete_product),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{id}", post(cart::add))
        .route("/update/{id}", post(cart::update))
        .route("/remove/{id}", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/checkout", get(cart::checkout))
        .nest("/admin", admin_routes(max_upload_bytes))
        .nest("/cart", cart_routes())
}
