//! Cart management.
//!
//! A cart line is absent, or present with a positive quantity:
//!
//! ```text
//! absent  --add-->                 1
//! n       --update(d), n+d > 0-->  n+d
//! n       --update(d), n+d == 0--> absent
//! n       --remove-->              absent
//! n       --product deleted-->     absent
//! ```

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::instrument;

use petlandia_core::{ProductId, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::Cart;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product to add does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The user has no cart line for this product.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),

    /// The change would take the quantity below zero.
    #[error("cannot change quantity {current} by {delta}")]
    InvalidQuantity { current: u32, delta: i64 },

    /// The cart total does not fit in a decimal.
    #[error("cart total overflowed")]
    TotalOverflow,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Result of a quantity update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now holds this quantity.
    Updated(u32),
    /// The quantity reached zero and the line was deleted.
    Removed,
}

/// Cart service.
pub struct CartService<'a> {
    pool: &'a SqlitePool,
    cart: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            cart: CartRepository::new(pool),
        }
    }

    /// Add one unit of a product to the user's cart.
    ///
    /// # Returns
    ///
    /// The number of distinct lines in the cart afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product doesn't exist, or a
    /// repository error.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, user_id: UserId, product_id: ProductId) -> Result<u32, CartError> {
        let mut tx = self.pool.begin().await?;

        if ProductRepository::find_in(&mut *tx, product_id).await?.is_none() {
            return Err(CartError::ProductNotFound(product_id));
        }

        let item = CartRepository::increment_in(&mut *tx, user_id, product_id).await?;
        let count = CartRepository::count_lines_in(&mut *tx, user_id).await?;

        tx.commit().await?;

        tracing::debug!(quantity = item.quantity, cart_count = count, "Added to cart");
        Ok(count)
    }

    /// Change the quantity of an existing line by `delta`.
    ///
    /// Never creates a line. A result of zero deletes the line; a negative
    /// result is rejected and the line is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the user has no line for the
    /// product, `CartError::InvalidQuantity` if the result would be negative,
    /// or a repository error.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        delta: i64,
    ) -> Result<QuantityChange, CartError> {
        let mut tx = self.pool.begin().await?;

        let item = CartRepository::find_in(&mut *tx, user_id, product_id)
            .await?
            .ok_or(CartError::LineNotFound(product_id))?;

        let invalid = || CartError::InvalidQuantity {
            current: item.quantity,
            delta,
        };
        let new_quantity = i64::from(item.quantity).checked_add(delta).ok_or_else(invalid)?;

        let change = match new_quantity {
            0 => {
                CartRepository::delete_in(&mut *tx, item.id).await?;
                QuantityChange::Removed
            }
            n if n > 0 => {
                let quantity = u32::try_from(n).map_err(|_| invalid())?;
                CartRepository::set_quantity_in(&mut *tx, item.id, quantity).await?;
                QuantityChange::Updated(quantity)
            }
            _ => return Err(invalid()),
        };

        tx.commit().await?;

        tracing::debug!(?change, "Cart quantity changed");
        Ok(change)
    }

    /// Delete the user's line for a product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if there was no such line, or a
    /// repository error.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, user_id: UserId, product_id: ProductId) -> Result<(), CartError> {
        if self.cart.remove(user_id, product_id).await? {
            Ok(())
        } else {
            Err(CartError::LineNotFound(product_id))
        }
    }

    /// Read the user's cart. The total is computed from the current lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::TotalOverflow` if the total cannot be represented,
    /// or a repository error if the query fails.
    pub async fn view_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        let cart = Cart::new(self.cart.lines(user_id).await?);
        if cart.total().is_none() {
            return Err(CartError::TotalOverflow);
        }
        Ok(cart)
    }

    /// Number of distinct lines in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn cart_count(&self, user_id: UserId) -> Result<u32, CartError> {
        Ok(self.cart.count_lines(user_id).await?)
    }
}
