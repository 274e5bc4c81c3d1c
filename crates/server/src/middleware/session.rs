//! Session middleware configuration.
//!
//! `PostgreSQL`-backed sessions using tower-sessions, with a signed cookie,
//! SameSite=Strict and a 24 hour inactivity expiry.

use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "campus_mart_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// The cookie signing key could not be derived from the configured secret.
#[derive(Debug, thiserror::Error)]
#[error("session secret is unusable as a signing key: {0}")]
pub struct SessionKeyError(String);

/// Create the session layer over an already-migrated `PostgreSQL` store.
///
/// # Errors
///
/// Returns `SessionKeyError` if the session secret is shorter than the 64
/// bytes a signing key needs.
pub fn create_session_layer(
    store: PostgresStore,
    config: &AppConfig,
) -> Result<SessionManagerLayer<PostgresStore, tower_sessions::service::SignedCookie>, SessionKeyError>
{
    use secrecy::ExposeSecret;

    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|e| SessionKeyError(e.to_string()))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
