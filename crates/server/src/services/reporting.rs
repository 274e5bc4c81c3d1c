//! Read-only store figures for the dashboard and the advisor.

use sqlx::PgPool;
use tracing::instrument;

use campus_mart_core::Money;

use crate::db::{ProductRepository, RepositoryError, TransactionRepository};
use crate::models::Transaction;

/// Products with fewer units than this count as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Number of transactions shown on the dashboard.
pub const RECENT_TRANSACTIONS_LIMIT: i64 = 10;

/// Dashboard figures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardSummary {
    pub total_revenue: Money,
    pub transaction_count: i64,
    pub total_stock_units: i64,
    pub low_stock_count: i64,
    /// Newest first.
    pub recent_transactions: Vec<Transaction>,
}

/// Reporting service.
pub struct ReportingService<'a> {
    products: ProductRepository<'a>,
    transactions: TransactionRepository<'a>,
}

impl<'a> ReportingService<'a> {
    /// Create a new reporting service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            transactions: TransactionRepository::new(pool),
        }
    }

    /// Gather the dashboard figures.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any of the queries fail.
    #[instrument(skip(self))]
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, RepositoryError> {
        let (revenue, stock, recent) = tokio::try_join!(
            self.transactions.revenue_summary(),
            self.products.stock_summary(LOW_STOCK_THRESHOLD),
            self.transactions.recent(RECENT_TRANSACTIONS_LIMIT),
        )?;

        Ok(DashboardSummary {
            total_revenue: revenue.revenue,
            transaction_count: revenue.transaction_count,
            total_stock_units: stock.total_units,
            low_stock_count: stock.low_stock_count,
            recent_transactions: recent,
        })
    }

    /// Names of low-stock products, lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    #[instrument(skip(self))]
    pub async fn low_stock_names(&self, limit: i64) -> Result<Vec<String>, RepositoryError> {
        self.products
            .low_stock_names(LOW_STOCK_THRESHOLD, limit)
            .await
    }

    /// Total revenue and number of transactions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn revenue(&self) -> Result<crate::db::RevenueSummary, RepositoryError> {
        self.transactions.revenue_summary().await
    }
}
