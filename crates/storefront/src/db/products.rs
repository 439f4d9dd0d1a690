//! Product repository for database operations.
//!
//! Methods ending in `_in` run on a caller-supplied connection so that they
//! can take part in a transaction owned by a service.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use petlandia_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::{NewProduct, Product};

/// Columns selected for every product read, in `ProductRow` order.
pub(super) const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image_url, stock, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: String,
    image_url: Option<String>,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid stock {} for product {}",
                row.stock, row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            image_url: row.image_url,
            stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List every product in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::find_in(&mut conn, id).await
    }

    /// Get a product by ID on the given connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn find_in(
        conn: &mut SqliteConnection,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        fields: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO product (name, description, price, image_url, stock, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price.to_storage())
        .bind(image_url)
        .bind(i64::from(fields.stock))
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Overwrite every editable field of a product and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        fields: &NewProduct,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE product
            SET name = ?, description = ?, price = ?, image_url = ?, stock = ?, updated_at = ?
            WHERE id = ?
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price.to_storage())
        .bind(image_url)
        .bind(i64::from(fields.stock))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map_or(Err(RepositoryError::NotFound), Product::try_from)
    }

    /// Drop the image reference of a product whose file is gone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn clear_image(&self, id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE product SET image_url = NULL WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete a product row on the given connection.
    ///
    /// Cart lines must already be gone; the foreign key rejects the delete
    /// otherwise.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_in(
        conn: &mut SqliteConnection,
        id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
