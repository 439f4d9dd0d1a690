//! Session middleware configuration.
//!
//! Sets up SQLite-backed sessions using tower-sessions. Sessions end with
//! the browser session unless the user asked to be remembered at login.

use sqlx::SqlitePool;
use tower_sessions::{Expiry, SessionManagerLayer, cookie::time::Duration};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "petlandia_session";

/// Inactivity expiry for "remember me" sessions (30 days).
pub const REMEMBER_ME_DAYS: i64 = 30;

/// Expiry applied when the user ticks "remember me".
#[must_use]
pub const fn remember_me_expiry() -> Expiry {
    Expiry::OnInactivity(Duration::days(REMEMBER_ME_DAYS))
}

/// Create the session layer with the SQLite store.
///
/// The `tower_sessions` table is created by [`crate::db::migrate`].
#[must_use]
pub fn create_session_layer(
    pool: &SqlitePool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<SqliteStore> {
    let store = SqliteStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnSessionEnd)
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
