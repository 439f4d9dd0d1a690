//! Database migration command.
//!
//! Applies the embedded schema from `crates/storefront/migrations/` and
//! creates the `tower_sessions` table. Safe to run repeatedly.

use petlandia_storefront::db;

use super::{CommandError, connect};

/// Run storefront database migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    pool.close().await;
    Ok(())
}
