//! Non-negative catalog prices using decimal arithmetic.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reasons a price input is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price is required")]
    Empty,
    #[error("price '{0}' is not a number")]
    NotANumber(String),
    #[error("price cannot be negative")]
    Negative,
    #[error("price cannot exceed {}", Price::MAX)]
    TooLarge,
}

/// A product price: a decimal amount that is never negative.
///
/// Stored as canonical decimal text so that no binary floating point ever
/// touches a total.
///
/// ```
/// use petlandia_core::Price;
///
/// let price = Price::parse("10.5").unwrap();
/// assert_eq!(price.to_string(), "10.50");
/// assert_eq!(price.line_total(3).unwrap().to_string(), "31.5");
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("1000000000").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Highest accepted price, 999 999 999.99.
    pub const MAX: Self = Self(Decimal::from_parts(1_215_752_191, 23, 0, false, 2));

    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero and
    /// [`PriceError::TooLarge`] for amounts above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount.normalize()))
    }

    /// Parse user input such as `"12"`, `"12.99"` or `"1.2e1"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the input is blank, not a number, negative
    /// or above [`Price::MAX`].
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount = Decimal::from_str(input)
            .or_else(|_| Decimal::from_scientific(input))
            .map_err(|_| PriceError::NotANumber(input.to_owned()))?;
        Self::new(amount)
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity, `None` on overflow.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }

    /// Canonical text used for storage (no trailing zeros).
    #[must_use]
    pub fn to_storage(&self) -> String {
        self.0.to_string()
    }
}

/// Displays with exactly two decimal places.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}
