//! Integration tests for Petlandia.
//!
//! Every test builds its own [`TestContext`]: a private in-memory SQLite
//! database with the schema applied, and a temporary upload directory.
//! HTTP tests drive the real router through `tower::ServiceExt::oneshot`,
//! so no server or external database is needed.
//!
//! ```bash
//! cargo test -p petlandia-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use petlandia_core::{ProductId, UserId};
use petlandia_storefront::{
    app,
    config::StorefrontConfig,
    db,
    models::{Product, User},
    services::{AuthService, CatalogService, ProductForm, UploadStore},
    state::AppState,
};

/// Password given to every user created by the factories.
pub const TEST_PASSWORD: &str = "password123";

/// Isolated database and upload directory for one test.
pub struct TestContext {
    pub pool: SqlitePool,
    pub uploads: UploadStore,
    dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = db::create_memory_pool().await.unwrap();
        db::migrate(&pool).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::new(dir.path().join("products"));
        uploads.ensure_dir().await.unwrap();

        Self { pool, uploads, dir }
    }

    /// Configuration pointing the static and upload directories at the
    /// temporary directory.
    pub fn config(&self) -> StorefrontConfig {
        let static_dir = self.dir.path().to_string_lossy().into_owned();
        let upload_dir = self.uploads.dir().to_string_lossy().into_owned();

        StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_DATABASE_URL" => Some("sqlite::memory:".to_owned()),
            "STOREFRONT_STATIC_DIR" => Some(static_dir.clone()),
            "STOREFRONT_UPLOAD_DIR" => Some(upload_dir.clone()),
            _ => None,
        })
        .unwrap()
    }

    /// The full application router backed by this context's database.
    pub fn router(&self) -> Router {
        app(AppState::new(self.config(), self.pool.clone()))
    }

    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(&self.pool, &self.uploads)
    }

    pub async fn create_user(&self, username: &str, is_admin: bool) -> User {
        AuthService::new(&self.pool)
            .create_user(
                username,
                &format!("{username}@example.com"),
                TEST_PASSWORD,
                is_admin,
            )
            .await
            .unwrap()
    }

    pub async fn create_product(&self, name: &str, price: &str, stock: u32) -> Product {
        self.catalog()
            .add_product(&product_form(name, price, &stock.to_string()), None)
            .await
            .unwrap()
    }

    /// Raw number of cart rows referencing a product, across all users.
    pub async fn cart_rows_for(&self, product_id: ProductId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM cart_item WHERE product_id = ?")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Quantity of a user's line, if present.
    pub async fn quantity(&self, user_id: UserId, product_id: ProductId) -> Option<i64> {
        sqlx::query_scalar("SELECT quantity FROM cart_item WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap()
    }

    pub async fn product_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Log in through `POST /login` and return the session cookie.
    pub async fn login(&self, router: &Router, username: &str) -> String {
        let response = router
            .clone()
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(format!(
                        "username={username}&password={TEST_PASSWORD}"
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("login did not set a session cookie")
    }
}

pub fn product_form(name: &str, price: &str, stock: &str) -> ProductForm {
    ProductForm {
        name: name.to_owned(),
        description: format!("{name} description"),
        price: price.to_owned(),
        stock: stock.to_owned(),
    }
}

/// `name=value` of the session cookie set by a response.
pub fn session_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("petlandia_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

pub fn location<B>(response: &Response<B>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
