//! Catalog management: product CRUD and the product image lifecycle.
//!
//! Every mutating operation here is administrator-only; callers check
//! [`crate::services::auth::require_admin`] before reaching this service.
//!
//! Image files are keyed by their sanitized upload name only. Two products
//! uploaded with the same name share one file, so replacing or deleting one
//! product's image also removes the other's. A failed insert only cleans up
//! an image file that it created itself.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::instrument;

use petlandia_core::{Price, ProductId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{NewProduct, Product};
use crate::services::uploads::{ImageUpload, UploadError, UploadStore};

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Submitted product fields are invalid. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// No product with this ID.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// Image could not be stored.
    #[error("image upload failed: {0}")]
    Upload(#[from] UploadError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Raw product fields as submitted by the admin form.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
}

impl ProductForm {
    /// Parse and validate the raw fields.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` describing the first invalid field.
    pub fn validate(&self) -> Result<NewProduct, CatalogError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CatalogError::Validation("product name is required".to_owned()));
        }

        let price = Price::parse(&self.price)
            .map_err(|e| CatalogError::Validation(format!("invalid price: {e}")))?;

        let stock = self.stock.trim().parse::<u32>().map_err(|_| {
            CatalogError::Validation(format!(
                "invalid stock '{}': must be a whole number of zero or more",
                self.stock.trim()
            ))
        })?;

        Ok(NewProduct {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            price,
            stock,
        })
    }
}

/// Outcome of a product deletion.
#[derive(Debug, Clone)]
pub struct ProductDeletion {
    /// The product as it was before deletion.
    pub product: Product,
    /// Number of cart lines removed along with it.
    pub cart_lines_removed: u64,
}

/// Catalog service.
pub struct CatalogService<'a> {
    pool: &'a SqlitePool,
    products: ProductRepository<'a>,
    uploads: &'a UploadStore,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, uploads: &'a UploadStore) -> Self {
        Self {
            pool,
            products: ProductRepository::new(pool),
            uploads,
        }
    }

    /// List every product in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list().await?)
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Create a product, saving its image first if one was uploaded.
    ///
    /// Fields are validated before anything touches disk or database, so a
    /// rejected submission leaves no trace.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for invalid fields,
    /// `CatalogError::Upload` if the image cannot be stored, or a repository
    /// error.
    #[instrument(skip(self, form, image), fields(name = %form.name))]
    pub async fn add_product(
        &self,
        form: &ProductForm,
        image: Option<&ImageUpload>,
    ) -> Result<Product, CatalogError> {
        let fields = form.validate()?;

        // (url, whether this call created the file)
        let saved = match image {
            Some(upload) => {
                let prepared = UploadStore::prepare(upload)?;
                let existed = self.uploads.exists(&prepared).await;
                Some((self.uploads.write(&prepared).await?, !existed))
            }
            None => None,
        };
        let image_url = saved.as_ref().map(|(url, _)| url.as_str());

        match self.products.create(&fields, image_url).await {
            Ok(product) => {
                tracing::info!(product_id = %product.id, "Product created");
                Ok(product)
            }
            Err(e) => {
                if let Some((url, true)) = &saved {
                    self.uploads.remove_logged(url).await;
                }
                Err(e.into())
            }
        }
    }

    /// Overwrite a product's fields, replacing its image if a new one was
    /// uploaded.
    ///
    /// The new filename is checked first, so a rejected upload leaves the
    /// product and its current image untouched. The previous image file is
    /// then removed before the new one is written; failure to remove it is
    /// logged and does not abort the edit. If the write itself fails the
    /// product's image reference is cleared, since the old file is gone.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for invalid fields,
    /// `CatalogError::NotFound` if the product doesn't exist,
    /// `CatalogError::Upload` if the new image cannot be stored, or a
    /// repository error.
    #[instrument(skip(self, form, image))]
    pub async fn edit_product(
        &self,
        id: ProductId,
        form: &ProductForm,
        image: Option<&ImageUpload>,
    ) -> Result<Product, CatalogError> {
        let fields = form.validate()?;
        let existing = self.get_product(id).await?;

        let image_url = match image {
            Some(upload) => {
                let prepared = UploadStore::prepare(upload)?;
                if let Some(old) = &existing.image_url {
                    self.uploads.remove_logged(old).await;
                }
                match self.uploads.write(&prepared).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        if let Err(clear) = self.products.clear_image(id).await {
                            tracing::warn!(product_id = %id, error = %clear, "Failed to clear stale image reference");
                        }
                        return Err(e.into());
                    }
                }
            }
            None => existing.image_url,
        };

        let product = self
            .products
            .update(id, &fields, image_url.as_deref())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::NotFound(id),
                other => CatalogError::Repository(other),
            })?;

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Delete a product together with every cart line that references it.
    ///
    /// Cart lines and the product row are removed in one transaction; if any
    /// step fails nothing is removed. The image file is deleted only after
    /// the commit, and a failure there is logged without undoing the delete.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist, or a
    /// repository error (in which case the transaction was rolled back).
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<ProductDeletion, CatalogError> {
        let mut tx = self.pool.begin().await?;

        let product = ProductRepository::find_in(&mut *tx, id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        let cart_lines_removed = CartRepository::delete_for_product_in(&mut *tx, id).await?;

        if !ProductRepository::delete_in(&mut *tx, id).await? {
            return Err(CatalogError::NotFound(id));
        }

        tx.commit().await?;

        if let Some(url) = &product.image_url {
            self.uploads.remove_logged(url).await;
        }

        tracing::info!(product_id = %id, cart_lines_removed, "Product deleted");
        Ok(ProductDeletion {
            product,
            cart_lines_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str, stock: &str) -> ProductForm {
        ProductForm {
            name: name.to_owned(),
            description: "  Crunchy kibble  ".to_owned(),
            price: price.to_owned(),
            stock: stock.to_owned(),
        }
    }

    #[test]
    fn test_validate_accepts_valid_fields() {
        let fields = form(" Kibble ", "12.50", "7").validate();
        let Ok(fields) = fields else {
            panic!("expected valid form");
        };
        assert_eq!(fields.name, "Kibble");
        assert_eq!(fields.description, "Crunchy kibble");
        assert_eq!(fields.price.to_string(), "12.50");
        assert_eq!(fields.stock, 7);
    }

    #[test]
    fn test_validate_allows_zero_price_and_stock() {
        assert!(form("Free sample", "0", "0").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        for (price, stock) in [("abc", "1"), ("-1", "1"), ("", "1"), ("1", "-1"), ("1", "2.5"), ("1", "")] {
            assert!(
                matches!(
                    form("Kibble", price, stock).validate(),
                    Err(CatalogError::Validation(_))
                ),
                "price={price:?} stock={stock:?}"
            );
        }
    }

    #[test]
    fn test_validate_requires_name() {
        assert!(matches!(
            form("   ", "1", "1").validate(),
            Err(CatalogError::Validation(_))
        ));
    }
}
