//! Command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use campus_mart_server::db;
use campus_mart_server::services::{AuthError, CatalogError};

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Account operation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Reading an input file or stdin failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An input file is not valid YAML for the expected shape.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A CSV input file could not be read as records.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Argument rejected before touching the database.
    #[error("{0}")]
    InvalidInput(String),
}

/// Database URL from the environment, as the server reads it.
fn database_url() -> Result<SecretString, CliError> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    ["CAMPUS_MART_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .map(SecretString::from)
        .ok_or(CliError::MissingEnvVar("CAMPUS_MART_DATABASE_URL"))
}

/// Connect to the database named by the environment.
async fn connect() -> Result<PgPool, CliError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
