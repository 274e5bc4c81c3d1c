//! Account provisioning commands.

use std::io::BufRead;
use std::path::Path;

use clap::ValueEnum;
use secrecy::SecretString;
use serde::Deserialize;

use campus_mart_core::UserRole;
use campus_mart_server::services::{AuthError, AuthService};

use super::{CliError, connect};

/// Layout of a user import file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportFormat {
    /// A `users:` list with optional `email` and `role`.
    Yaml,
    /// Headerless `id,username,password[,email]` rows; `id` is ignored.
    Csv,
}

impl ImportFormat {
    /// CSV for a `.csv` extension, YAML otherwise.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Yaml,
        }
    }
}

/// Top-level shape of a user import file.
#[derive(Debug, Deserialize)]
struct UserFile {
    #[serde(default)]
    users: Vec<UserEntry>,
}

/// One account in an import file.
#[derive(Deserialize)]
struct UserEntry {
    username: String,
    password: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: UserRole,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish()
    }
}

/// Counts reported at the end of an import.
#[derive(Debug, Default, PartialEq, Eq)]
struct ImportReport {
    imported: usize,
    skipped: usize,
    failed: usize,
}

fn parse_user_file(contents: &str) -> Result<Vec<UserEntry>, CliError> {
    let file: UserFile = serde_yaml::from_str(contents)?;
    Ok(file.users)
}

/// Rows with fewer than three columns are skipped, as is a leading
/// `id,username,password` header. Imported accounts get the staff role.
fn parse_user_csv(contents: &str) -> Result<Vec<UserEntry>, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut users = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let (Some(username), Some(password)) = (record.get(1), record.get(2)) else {
            tracing::debug!(row = index + 1, "Skipping short row");
            continue;
        };
        if index == 0 && username.eq_ignore_ascii_case("username") {
            continue;
        }
        users.push(UserEntry {
            username: username.to_owned(),
            password: password.to_owned(),
            email: record.get(3).filter(|email| !email.is_empty()).map(str::to_owned),
            role: UserRole::default(),
        });
    }
    Ok(users)
}

async fn load_users(path: &Path, format: Option<ImportFormat>) -> Result<Vec<UserEntry>, CliError> {
    let format = format.unwrap_or_else(|| ImportFormat::from_path(path));
    let contents = tokio::fs::read_to_string(path).await?;
    match format {
        ImportFormat::Yaml => parse_user_file(&contents),
        ImportFormat::Csv => parse_user_csv(&contents),
    }
}

/// First line of `reader`, without the line ending.
fn read_password(mut reader: impl BufRead) -> Result<SecretString, CliError> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::InvalidInput(
            "no password given on stdin".to_owned(),
        ));
    }
    Ok(SecretString::from(password.to_owned()))
}

/// Create a single account.
///
/// # Errors
///
/// Returns an error for an unknown role, an empty or weak password, a taken
/// username, or a database failure.
pub async fn create(username: &str, role: &str, email: Option<&str>) -> Result<(), CliError> {
    let role: UserRole = role.parse().map_err(CliError::InvalidInput)?;
    let password = read_password(std::io::stdin().lock())?;

    let pool = connect().await?;
    let user = AuthService::new(&pool)
        .create_user(username, password, role, email)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, %role, "User created");
    Ok(())
}

/// Create every account listed in `path`.
///
/// Without an explicit `format` the file extension decides. Existing usernames are skipped; entries that fail validation are logged
/// and counted but do not stop the import.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the database
/// is unreachable.
pub async fn import(path: &Path, format: Option<ImportFormat>) -> Result<(), CliError> {
    let entries = load_users(path, format).await?;
    tracing::info!(count = entries.len(), file = %path.display(), "Importing users");

    let pool = connect().await?;
    let auth = AuthService::new(&pool);
    let mut report = ImportReport::default();

    for entry in entries {
        let result = auth
            .create_user(
                &entry.username,
                SecretString::from(entry.password),
                entry.role,
                entry.email.as_deref(),
            )
            .await;

        match result {
            Ok(user) => {
                tracing::info!(username = %user.username, role = %user.role, "Imported user");
                report.imported += 1;
            }
            Err(AuthError::UserAlreadyExists) => {
                tracing::info!(username = %entry.username, "User exists, skipping");
                report.skipped += 1;
            }
            Err(AuthError::Repository(e)) => return Err(AuthError::Repository(e).into()),
            Err(e) => {
                tracing::warn!(username = %entry.username, error = %e, "Could not import user");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        imported = report.imported,
        skipped = report.skipped,
        failed = report.failed,
        "Import complete"
    );
    Ok(())
}

/// Hash any stored password that is still plain text.
///
/// # Errors
///
/// Returns an error if the database is unreachable or hashing fails.
pub async fn rehash() -> Result<(), CliError> {
    let pool = connect().await?;
    let report = AuthService::new(&pool).rehash_legacy_passwords().await?;

    tracing::info!(
        upgraded = report.upgraded,
        unchanged = report.unchanged,
        "Password rehash complete"
    );
    Ok(())
}
