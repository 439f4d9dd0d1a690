//! Petlandia storefront library.
//!
//! Product catalog, per-user shopping cart and an administrator panel served
//! as server-rendered pages plus a handful of JSON endpoints. The crate is a
//! library so the binary, the CLI and the integration tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Build the full application router.
///
/// Layers run outermost first: tracing, security headers, request ID, then
/// the session layer closest to the handlers. Sentry layers are added by the
/// binary so tests do not need a Sentry hub.
pub fn app(state: AppState) -> Router {
    let config = state.config();
    let session_layer = middleware::create_session_layer(state.pool(), config);

    Router::new()
        .merge(routes::routes(config.max_upload_bytes))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(session_layer)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
