//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit local development.
//!
//! - `STOREFRONT_DATABASE_URL` - SQLite connection string, falls back to
//!   `DATABASE_URL` (default: `sqlite://petlandia.db?mode=rwc`)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 5000)
//! - `STOREFRONT_BASE_URL` - Public URL; `https://` enables secure cookies
//!   (default: `http://localhost:5000`)
//! - `STOREFRONT_STATIC_DIR` - Directory served under `/static`
//!   (default: `crates/storefront/static`)
//! - `STOREFRONT_UPLOAD_DIR` - Product image directory
//!   (default: `<static dir>/img/products`)
//! - `STOREFRONT_MAX_UPLOAD_BYTES` - Request body limit for product forms
//!   (default: 5 MiB)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://petlandia.db?mode=rwc";
const DEFAULT_STATIC_DIR: &str = "crates/storefront/static";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// SQLite database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Directory product images are written to
    pub upload_dir: PathBuf,
    /// Maximum accepted body size for product forms
    pub max_upload_bytes: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("STOREFRONT_DATABASE_URL")
            .or_else(|| get("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

        let host = parse_var(
            "STOREFRONT_HOST",
            get("STOREFRONT_HOST"),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        )?;
        let port = parse_var("STOREFRONT_PORT", get("STOREFRONT_PORT"), 5000)?;
        let base_url =
            get("STOREFRONT_BASE_URL").unwrap_or_else(|| "http://localhost:5000".to_owned());

        let static_dir = get("STOREFRONT_STATIC_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from);
        let upload_dir = get("STOREFRONT_UPLOAD_DIR")
            .map_or_else(|| static_dir.join("img").join("products"), PathBuf::from);

        let max_upload_bytes = parse_var(
            "STOREFRONT_MAX_UPLOAD_BYTES",
            get("STOREFRONT_MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        Ok(Self {
            database_url: SecretString::from(database_url),
            host,
            port,
            base_url,
            static_dir,
            upload_dir,
            max_upload_bytes,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to a default when unset.
fn parse_var<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url.expose_secret(), DEFAULT_DATABASE_URL);
        assert_eq!(config.port, 5000);
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(
            config.upload_dir,
            PathBuf::from("crates/storefront/static/img/products")
        );
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.sentry_dsn.is_none());
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_database_url_fallback() {
        let config = config_from(&[("DATABASE_URL", "sqlite://fallback.db")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "sqlite://fallback.db");

        let config = config_from(&[
            ("DATABASE_URL", "sqlite://fallback.db"),
            ("STOREFRONT_DATABASE_URL", "sqlite://primary.db"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "sqlite://primary.db");
    }

    #[test]
    fn test_upload_dir_follows_static_dir() {
        let config = config_from(&[("STOREFRONT_STATIC_DIR", "/srv/static")]).unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("/srv/static/img/products"));

        let config = config_from(&[
            ("STOREFRONT_STATIC_DIR", "/srv/static"),
            ("STOREFRONT_UPLOAD_DIR", "/var/uploads"),
        ])
        .unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("/var/uploads"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = config_from(&[("STOREFRONT_PORT", "not-a-port")]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_socket_addr() {
        let config = config_from(&[("STOREFRONT_HOST", "0.0.0.0"), ("STOREFRONT_PORT", "8080")])
            .unwrap();

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_secure_cookies_from_base_url() {
        let config = config_from(&[("STOREFRONT_BASE_URL", "https://petlandia.example")]).unwrap();
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_config_debug_redacts_database_url() {
        let config = config_from(&[(
            "STOREFRONT_DATABASE_URL",
            "sqlite:///var/lib/secret_location.db",
        )])
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret_location"));
    }
}
