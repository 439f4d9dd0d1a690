//! CLI subcommands.

pub mod admin;
pub mod migrate;

use petlandia_storefront::{config::StorefrontConfig, db};
use sqlx::SqlitePool;
use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] petlandia_storefront::config::ConfigError),

    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] db::MigrationError),

    #[error(transparent)]
    Auth(#[from] petlandia_storefront::services::AuthError),
}

/// Open the storefront database configured in the environment.
async fn connect() -> Result<SqlitePool, CommandError> {
    let config = StorefrontConfig::from_env()?;

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&config.database_url).await?)
}
