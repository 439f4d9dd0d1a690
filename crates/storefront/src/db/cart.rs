//! Cart line repository for database operations.
//!
//! Methods ending in `_in` run on a caller-supplied connection so that they
//! can take part in a transaction owned by a service.

use sqlx::{SqliteConnection, SqlitePool};

use petlandia_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use super::products::ProductRow;
use crate::models::{CartItem, CartLine, Product};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i64,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid quantity {} for cart item {}",
                    row.quantity, row.id
                ))
            })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    product: ProductRow,
    quantity: i64,
}

/// Repository for cart line database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get every cart line of a user joined with its product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT p.id, p.name, p.description, p.price, p.image_url, p.stock,
                   p.created_at, p.updated_at, c.quantity
            FROM cart_item c
            JOIN product p ON p.id = c.product_id
            WHERE c.user_id = ?
            ORDER BY c.id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let product = Product::try_from(row.product)?;
                let quantity = u32::try_from(row.quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "invalid quantity {} for product {}",
                        row.quantity, product.id
                    ))
                })?;
                Ok(CartLine { product, quantity })
            })
            .collect()
    }

    /// Get the cart line for a (user, product) pair on the given connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_in(
        conn: &mut SqliteConnection,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, user_id, product_id, quantity
            FROM cart_item
            WHERE user_id = ? AND product_id = ?
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await?;

        row.map(CartItem::try_from).transpose()
    }

    /// Insert a line with quantity 1, or add 1 to the existing line.
    ///
    /// A single upsert statement, so concurrent adds cannot lose an increment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails (including
    /// a foreign-key violation for a missing product).
    pub async fn increment_in(
        conn: &mut SqliteConnection,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_item (user_id, product_id, quantity)
            VALUES (?, ?, 1)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = quantity + 1
            RETURNING id, user_id, product_id, quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(conn)
        .await?;

        CartItem::try_from(row)
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_quantity_in(
        conn: &mut SqliteConnection,
        id: CartItemId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cart_item SET quantity = ? WHERE id = ?")
            .bind(i64::from(quantity))
            .bind(id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a single line by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete_in(conn: &mut SqliteConnection, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_item WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete the line for a (user, product) pair.
    ///
    /// # Returns
    ///
    /// Returns `true` if a line was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_item WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every line referencing a product, across all users.
    ///
    /// # Returns
    ///
    /// The number of lines deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_for_product_in(
        conn: &mut SqliteConnection,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_item WHERE product_id = ?")
            .bind(product_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Number of distinct lines in a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_lines_in(
        conn: &mut SqliteConnection,
        user_id: UserId,
    ) -> Result<u32, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cart_item WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(conn)
            .await?;

        u32::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("invalid line count {count}")))
    }

    /// Number of distinct lines in a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_lines(&self, user_id: UserId) -> Result<u32, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::count_lines_in(&mut conn, user_id).await
    }
}
