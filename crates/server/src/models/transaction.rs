//! Completed sale records.

use chrono::{DateTime, Utc};

use campus_mart_core::{Money, TransactionId};

/// One completed checkout.
///
/// Only totals are kept; the individual cart lines are not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    /// Sum of `price × quantity` over the sold lines.
    pub total: Money,
    /// Sum of quantities over the sold lines.
    pub item_count: i32,
    pub created_at: DateTime<Utc>,
}
