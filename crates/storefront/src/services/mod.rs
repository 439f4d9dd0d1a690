//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password login, user creation, administrator guard
//! - `catalog` - Product CRUD and the product image lifecycle
//! - `cart` - Per-user cart lines and quantity rules
//! - `uploads` - Product image files on disk
//!
//! Services borrow the pool from `AppState` for the duration of one request.
//! Multi-step mutations own a transaction that is rolled back on drop.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService, QuantityChange};
pub use catalog::{CatalogError, CatalogService, ProductDeletion, ProductForm};
pub use uploads::{ImageUpload, UploadError, UploadStore};
