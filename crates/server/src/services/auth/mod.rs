//! Authentication service.
//!
//! Username and password login against Argon2id hashes. Hashing and
//! verification are CPU-heavy, so both run on the blocking thread pool.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::instrument;

use campus_mart_core::{Email, UserRole, Username};

use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

/// Outcome of upgrading stored passwords to Argon2 hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RehashReport {
    /// Accounts whose stored value was replaced by a hash.
    pub upgraded: usize,
    /// Accounts that already held an Argon2 hash.
    pub unchanged: usize,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is unknown or
    /// malformed, or the password does not match.
    /// Returns `AuthError::Repository` if the lookup fails.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: SecretString,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let record = self
            .users
            .get_with_hash_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_hash = record.password_hash;
        tokio::task::spawn_blocking(move || {
            verify_password(password.expose_secret(), &password_hash)
        })
        .await
        .map_err(|_| AuthError::Hash)??;

        Ok(record.user)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::InvalidEmail` for
    /// malformed input.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        username: &str,
        password: SecretString,
        role: UserRole,
        email: Option<&str>,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        let email = Email::parse_optional(email)?;
        validate_password(password.expose_secret())?;

        let password_hash = hash_password_blocking(password).await?;

        self.users
            .create(&username, &password_hash, role, email.as_ref())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Replace every stored password that is not an Argon2 hash with a hash
    /// of that value.
    ///
    /// Accounts imported from older data may hold their password as plain
    /// text; after this runs, none do.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if reading or writing fails, or
    /// `AuthError::Hash` if hashing fails.
    #[instrument(skip(self))]
    pub async fn rehash_legacy_passwords(&self) -> Result<RehashReport, AuthError> {
        let mut report = RehashReport::default();

        for record in self.users.list_with_hashes().await? {
            if is_argon2_hash(&record.password_hash) {
                report.unchanged += 1;
                continue;
            }

            let hash = hash_password_blocking(SecretString::from(record.password_hash)).await?;
            self.users
                .update_password_hash(record.user.id, &hash)
                .await?;
            tracing::info!(username = %record.user.username, "Upgraded stored password to Argon2");
            report.upgraded += 1;
        }

        Ok(report)
    }
}

/// Whether a stored value is an Argon2 PHC string.
#[must_use]
pub fn is_argon2_hash(value: &str) -> bool {
    PasswordHash::new(value).is_ok_and(|hash| hash.algorithm.as_str().starts_with("argon2"))
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

async fn hash_password_blocking(password: SecretString) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(password.expose_secret()))
        .await
        .map_err(|_| AuthError::Hash)?
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Hash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(is_argon2_hash(&hash));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse battery", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_plaintext_is_not_a_hash() {
        assert!(!is_argon2_hash("admin123"));
        assert!(!is_argon2_hash(""));
        assert!(matches!(
            verify_password("admin123", "admin123"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_blocking_hash_verifies() {
        let hash = hash_password_blocking(SecretString::from("till-password"))
            .await
            .unwrap();
        assert!(verify_password("till-password", &hash).is_ok());
    }
}
