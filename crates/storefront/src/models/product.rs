//! Product domain types.

use chrono::{DateTime, Utc};

use petlandia_core::{Price, ProductId};

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Public URL path of the product image, e.g. `/static/img/products/cat.png`.
    pub image_url: Option<String>,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

/// Validated field values for creating or overwriting a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
}
