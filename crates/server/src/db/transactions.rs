//! Sale record repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use campus_mart_core::{Money, TransactionId};

use super::RepositoryError;
use crate::models::Transaction;

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i32,
    total: Decimal,
    item_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = RepositoryError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let total = Money::new(row.total).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid total for transaction {}: {e}", row.id))
        })?;

        Ok(Self {
            id: TransactionId::new(row.id),
            total,
            item_count: row.item_count,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RevenueRow {
    revenue: Decimal,
    transaction_count: i64,
}

/// Lifetime sales figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevenueSummary {
    /// Sum of all transaction totals.
    pub revenue: Money,
    /// Number of recorded transactions.
    pub transaction_count: i64,
}

/// Repository for reading sale records.
pub struct TransactionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepository<'a> {
    /// Create a new transaction repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Most recent transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Transaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r"
            SELECT id, total, item_count, created_at
            FROM transactions
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Total revenue and transaction count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the sum is invalid.
    pub async fn revenue_summary(&self) -> Result<RevenueSummary, RepositoryError> {
        let row = sqlx::query_as::<_, RevenueRow>(
            r"
            SELECT COALESCE(SUM(total), 0) AS revenue,
                   COUNT(*) AS transaction_count
            FROM transactions
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let revenue = Money::new(row.revenue).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid revenue sum: {e}"))
        })?;

        Ok(RevenueSummary {
            revenue,
            transaction_count: row.transaction_count,
        })
    }
}

/// Record a completed sale inside the caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(
    conn: &mut PgConnection,
    total: Money,
    item_count: i32,
) -> Result<Transaction, RepositoryError> {
    let row = sqlx::query_as::<_, TransactionRow>(
        r"
        INSERT INTO transactions (total, item_count)
        VALUES ($1, $2)
        RETURNING id, total, item_count, created_at
        ",
    )
    .bind(total.amount())
    .bind(item_count)
    .fetch_one(&mut *conn)
    .await?;

    row.try_into()
}
