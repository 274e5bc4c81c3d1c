//! Product catalog domain types.

use chrono::{DateTime, Utc};

use campus_mart_core::{Money, ProductId};

/// A product on the shelf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    /// Unit price.
    pub price: Money,
    /// Units on hand, never negative.
    pub stock: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether this product counts toward the low-stock warning.
    #[must_use]
    pub const fn is_low_stock(&self, threshold: i32) -> bool {
        self.stock < threshold
    }
}

/// Validated fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: Money,
    pub stock: i32,
    pub description: Option<String>,
}

/// Which products a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductFilter {
    /// Every product.
    #[default]
    All,
    /// Only products with stock above zero.
    InStock,
}
