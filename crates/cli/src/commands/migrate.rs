//! Database migration command.
//!
//! Applies the server's embedded migrations from `crates/server/migrations/`.
//! The server also applies them at startup; this command exists for deploy
//! pipelines that migrate before rolling out.

use campus_mart_server::db;

use super::{CliError, connect};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
