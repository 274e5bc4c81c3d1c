//! Checkout error types.

use thiserror::Error;

use campus_mart_core::{Money, ProductId};

use crate::db::RepositoryError;

/// Errors that can end a checkout.
///
/// Every variant leaves stock and the transaction log untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SaleError {
    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line asks for a negative number of units.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity {
        product_id: ProductId,
        quantity: i32,
    },

    /// A product has fewer units left than the cart asks for.
    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    /// The cart adds up to more than a transaction record can hold.
    #[error("Sale total exceeds {0}")]
    TotalTooLarge(Money),

    /// The database rejected part of the unit of work.
    #[error("Transaction failed: {0}")]
    Persistence(String),
}

impl SaleError {
    /// Whether the cart itself is at fault, as opposed to the store.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Persistence(_))
    }
}

impl From<RepositoryError> for SaleError {
    fn from(err: RepositoryError) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<sqlx::Error> for SaleError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
