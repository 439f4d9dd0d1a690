//! User management commands.
//!
//! Users are never created through the web interface; this is the only way
//! to add accounts besides the default administrator seeded on start-up.

use petlandia_storefront::services::{
    AuthService,
    auth::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME},
};

use super::{CommandError, connect};

/// Create a user account.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_user(
    username: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> Result<i64, CommandError> {
    let pool = connect().await?;

    tracing::info!("Creating user: {} ({})", username, email);
    let user = AuthService::new(&pool)
        .create_user(username, email, password, is_admin)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}, Admin: {}",
        user.id,
        user.username,
        user.is_admin
    );

    pool.close().await;
    Ok(user.id.as_i64())
}

/// Create the default administrator unless it already exists.
pub async fn bootstrap(password: Option<&str>) -> Result<(), CommandError> {
    let pool = connect().await?;

    let created = AuthService::new(&pool)
        .bootstrap_admin(password.unwrap_or(DEFAULT_ADMIN_PASSWORD))
        .await?;

    match created {
        Some(user) => tracing::info!("Administrator '{}' created (ID {})", user.username, user.id),
        None => tracing::info!("Administrator '{}' already exists", DEFAULT_ADMIN_USERNAME),
    }

    pool.close().await;
    Ok(())
}
