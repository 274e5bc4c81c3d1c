//! First-run administrator provisioning.
//!
//! There is no built-in default account. On an empty users table the server
//! creates an administrator from `BOOTSTRAP_ADMIN_USERNAME` and
//! `BOOTSTRAP_ADMIN_PASSWORD` if both are set, and otherwise logs how to
//! create one with the CLI.

use sqlx::PgPool;
use tracing::instrument;

use campus_mart_core::{UserId, UserRole};

use crate::config::BootstrapAdmin;
use crate::db::UserRepository;
use crate::services::{AuthError, AuthService};

/// What first-run provisioning did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Accounts already exist; nothing was done.
    AlreadyProvisioned,
    /// The table is empty and no bootstrap credentials are configured.
    NoAccounts,
    /// An administrator was created.
    Created(UserId),
}

/// Create the bootstrap administrator when the users table is empty.
///
/// # Errors
///
/// Returns `AuthError` if the users table cannot be read or the configured
/// credentials are rejected (invalid username, weak password).
#[instrument(skip_all)]
pub async fn ensure_admin(
    pool: &PgPool,
    admin: Option<&BootstrapAdmin>,
) -> Result<BootstrapOutcome, AuthError> {
    if UserRepository::new(pool).count().await? > 0 {
        return Ok(BootstrapOutcome::AlreadyProvisioned);
    }

    let Some(admin) = admin else {
        tracing::warn!(
            "No user accounts exist; create one with `cm-cli user create <username> --role admin`"
        );
        return Ok(BootstrapOutcome::NoAccounts);
    };

    match AuthService::new(pool)
        .create_user(&admin.username, admin.password.clone(), UserRole::Admin, None)
        .await
    {
        Ok(user) => {
            tracing::info!(username = %user.username, "Created bootstrap administrator");
            Ok(BootstrapOutcome::Created(user.id))
        }
        // Another instance won the race on the same empty table.
        Err(AuthError::UserAlreadyExists) => Ok(BootstrapOutcome::AlreadyProvisioned),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::test_state;

    #[tokio::test]
    async fn unreachable_database_is_an_error() {
        let state = test_state();
        let result = ensure_admin(state.pool(), None).await;
        assert!(matches!(result, Err(AuthError::Repository(_))));
    }
}
