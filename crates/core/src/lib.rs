//! Petlandia Core - Shared domain types.
//!
//! Used by:
//! - `storefront` - The web storefront (catalog, cart, admin panel)
//! - `cli` - Command-line tools for migrations and user management
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! Database encoding for IDs is available behind the `sqlite` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
