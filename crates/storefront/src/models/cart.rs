//! Cart domain types.

use rust_decimal::Decimal;

use petlandia_core::{CartItemId, ProductId, UserId};

use super::Product;

/// A stored cart line: one (user, product, quantity) tuple.
///
/// Invariant: `quantity > 0`. A line that would drop to zero is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart line joined with its product, for display.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Price times quantity, `None` on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.product.price.line_total(self.quantity)
    }
}

/// A user's cart as read from the store.
///
/// The total is derived from the lines on every read and never stored.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Sum of `price * quantity` over all lines, `None` on overflow.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.subtotal()?))
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
