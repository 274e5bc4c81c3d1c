//! Store account domain types.

use chrono::{DateTime, Utc};

use campus_mart_core::{Email, UserId, UserRole, Username};

/// A store account (domain type).
///
/// The password hash is deliberately absent; it is only ever read by the
/// repository method that serves credential checks.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Permission level.
    pub role: UserRole,
    /// Optional contact address.
    pub email: Option<Email>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
