//! Checkout processing.
//!
//! A sale is one database transaction: lock the cart's product rows, plan
//! the sale against that snapshot, write the stock deductions and the
//! transaction record, then commit. Returning early at any step drops the
//! uncommitted `sqlx::Transaction`, which rolls everything back.

mod error;
pub mod plan;

pub use error::SaleError;
pub use plan::{SalePlan, StockDeduction, plan_sale, validate_cart};

use std::collections::BTreeSet;

use sqlx::PgPool;
use tracing::instrument;

use campus_mart_core::{CartLine, Money, ProductId, TransactionId};

use crate::db::{products, transactions};

/// Result of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleReceipt {
    pub transaction_id: TransactionId,
    pub total: Money,
    pub item_count: i32,
    /// Cart product IDs that matched no product and were left out.
    pub skipped: Vec<ProductId>,
}

/// Checkout service.
pub struct SalesService<'a> {
    pool: &'a PgPool,
}

impl<'a> SalesService<'a> {
    /// Create a new sales service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Sell the cart's contents.
    ///
    /// Concurrent checkouts touching the same products serialize on the row
    /// locks, so two sales can never both pass the stock check against the
    /// same units.
    ///
    /// # Errors
    ///
    /// Returns `SaleError::EmptyCart`, `SaleError::InvalidQuantity`,
    /// `SaleError::InsufficientStock` or `SaleError::TotalTooLarge` when the
    /// cart cannot be sold, and
    /// `SaleError::Persistence` when the database fails. In every error case
    /// nothing is written.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn process_sale(&self, lines: &[CartLine]) -> Result<SaleReceipt, SaleError> {
        validate_cart(lines)?;

        let ids: Vec<ProductId> = lines
            .iter()
            .map(|line| line.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut tx = self.pool.begin().await?;

        let locked = products::lock_for_sale(&mut *tx, &ids).await?;
        let plan = plan_sale(lines, &locked).inspect_err(|e| {
            if let SaleError::InsufficientStock(name) = e {
                tracing::info!(product = %name, "Sale refused: insufficient stock");
            }
        })?;

        for product_id in &plan.skipped {
            tracing::warn!(%product_id, "Skipping unknown product in cart");
        }

        for deduction in &plan.deductions {
            products::decrement_stock(&mut *tx, deduction.product_id, deduction.quantity).await?;
        }

        let record = transactions::insert(&mut *tx, plan.total, plan.item_count).await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %record.id,
            total = %record.total,
            item_count = record.item_count,
            "Sale recorded"
        );

        Ok(SaleReceipt {
            transaction_id: record.id,
            total: record.total,
            item_count: record.item_count,
            skipped: plan.skipped,
        })
    }
}
