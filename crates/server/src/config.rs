//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CAMPUS_MART_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SESSION_SECRET` - Session cookie signing secret (min 64 chars, high entropy)
//!
//! ## Optional
//! - `CAMPUS_MART_HOST` - Bind address (default: 127.0.0.1)
//! - `CAMPUS_MART_PORT` - Listen port (default: 5000)
//! - `CAMPUS_MART_BASE_URL` - Public URL (default: `http://localhost:5000`)
//! - `CAMPUS_MART_STATIC_DIR` - Directory served under `/static` (default: the crate's `static/`)
//! - `GROQ_API_KEY` - Completion API key (falls back to `API_KEY`); AI features are off without it
//! - `AI_BASE_URL` - OpenAI-compatible API root (default: `https://api.groq.com/openai/v1`)
//! - `AI_MODEL` - Completion model (default: `llama3-70b-8192`)
//! - `AI_TIMEOUT_SECS` - Completion request timeout (default: 30)
//! - `BOOTSTRAP_ADMIN_USERNAME` / `BOOTSTRAP_ADMIN_PASSWORD` - First-run admin account
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

const DEFAULT_AI_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_AI_MODEL: &str = "llama3-70b-8192";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "dev_key",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used to decide whether cookies are `Secure`
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Session cookie signing secret
    pub session_secret: SecretString,
    /// Completion API settings; `None` disables AI features
    pub ai: Option<AiConfig>,
    /// First-run administrator credentials
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Completion API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AiConfig {
    /// API key
    pub api_key: SecretString,
    /// API root, e.g. `https://api.groq.com/openai/v1`
    pub base_url: Url,
    /// Model identifier sent with every request
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Credentials for the administrator created on an empty database.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let database_url = env
            .optional("CAMPUS_MART_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("CAMPUS_MART_DATABASE_URL".to_string()))?;

        let host = env
            .or_default("CAMPUS_MART_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CAMPUS_MART_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("CAMPUS_MART_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CAMPUS_MART_PORT".to_string(), e.to_string()))?;
        let base_url = env.or_default("CAMPUS_MART_BASE_URL", &format!("http://localhost:{port}"));

        let static_dir = PathBuf::from(env.or_default("CAMPUS_MART_STATIC_DIR", DEFAULT_STATIC_DIR));

        let session_secret = SecretString::from(env.required("SESSION_SECRET")?);
        validate_session_secret(&session_secret, "SESSION_SECRET")?;
        validate_secret_strength(session_secret.expose_secret(), "SESSION_SECRET")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            static_dir,
            session_secret,
            ai: AiConfig::from_env(&env)?,
            bootstrap_admin: BootstrapAdmin::from_env(&env)?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            log_format: match env.optional("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl AiConfig {
    fn from_env<F>(env: &Env<'_, F>) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (key_var, api_key) = match env.optional("GROQ_API_KEY") {
            Some(key) => ("GROQ_API_KEY", key),
            None => match env.optional("API_KEY") {
                Some(key) => ("API_KEY", key),
                None => return Ok(None),
            },
        };
        validate_secret_strength(&api_key, key_var)?;

        let raw_url = env.or_default("AI_BASE_URL", DEFAULT_AI_BASE_URL);
        let base_url = Url::parse(raw_url.trim_end_matches('/'))
            .map_err(|e| ConfigError::InvalidEnvVar("AI_BASE_URL".to_string(), e.to_string()))?;

        let timeout_secs = env
            .or_default("AI_TIMEOUT_SECS", &DEFAULT_AI_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar("AI_TIMEOUT_SECS".to_string(), e.to_string()))?;

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            base_url,
            model: env.or_default("AI_MODEL", DEFAULT_AI_MODEL),
            timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

impl BootstrapAdmin {
    fn from_env<F>(env: &Env<'_, F>) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (
            env.optional("BOOTSTRAP_ADMIN_USERNAME"),
            env.optional("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Ok(Some(Self {
                username,
                password: SecretString::from(password),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(
                "BOOTSTRAP_ADMIN_PASSWORD".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(
                "BOOTSTRAP_ADMIN_USERNAME".to_string(),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup that treats blank values as unset.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Validate that a session secret meets minimum length requirements.
///
/// The cookie signing key needs 64 bytes of material.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// 64+ characters of varied ASCII, accepted by every secret check.
    pub(crate) const STRONG_SECRET: &str =
        "Qm7#vT2$kL9!pX4@zR8^wN1&bH6*cJ3%fG5(dS0)yU2+eA7=iO4~lK9?nM1;tV8:";

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_source(|key| map.get(key).cloned())
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/campus_mart"),
            ("SESSION_SECRET", STRONG_SECRET),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.base_url, "http://localhost:5000");
        assert!(config.static_dir.ends_with("static"));
        assert!(!config.is_secure());
        assert!(config.ai.is_none());
        assert!(config.bootstrap_admin.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_prefixed_database_url_wins() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://fallback/db"),
            ("CAMPUS_MART_DATABASE_URL", "postgres://primary/db"),
            ("SESSION_SECRET", STRONG_SECRET),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://primary/db");
    }

    #[test]
    fn test_missing_database_url() {
        let err = config_from(&[("SESSION_SECRET", STRONG_SECRET)]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "CAMPUS_MART_DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("SESSION_SECRET", STRONG_SECRET),
            ("CAMPUS_MART_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref v, _) if v == "CAMPUS_MART_PORT"));
    }

    #[test]
    fn test_ai_config_from_fallback_key() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("SESSION_SECRET", STRONG_SECRET),
            ("API_KEY", "gsk_Zq81LmN4vB7cX2wE9rT5yU3i"),
            ("AI_BASE_URL", "http://127.0.0.1:9999/v1/"),
        ])
        .unwrap();

        let ai = config.ai.unwrap();
        assert_eq!(ai.model, DEFAULT_AI_MODEL);
        assert_eq!(ai.base_url.as_str(), "http://127.0.0.1:9999/v1");
        assert_eq!(ai.timeout, Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS));
    }

    #[test]
    fn test_ai_config_debug_redacts_key() {
        let ai = AiConfig {
            api_key: SecretString::from("gsk_super_private_value"),
            base_url: Url::parse(DEFAULT_AI_BASE_URL).unwrap(),
            model: DEFAULT_AI_MODEL.to_string(),
            timeout: Duration::from_secs(5),
        };
        let debug_output = format!("{ai:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("llama3-70b-8192"));
        assert!(!debug_output.contains("gsk_super_private_value"));
    }

    #[test]
    fn test_bootstrap_admin_needs_both_halves() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("SESSION_SECRET", STRONG_SECRET),
            ("BOOTSTRAP_ADMIN_USERNAME", "manager"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "BOOTSTRAP_ADMIN_PASSWORD"));
    }

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(STRONG_SECRET) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_validate_secret_strength_rejects_original_dev_key() {
        let result = validate_secret_strength("dev_key_campusmart_123", "SESSION_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(40), "SESSION_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "SESSION_SECRET").is_err());
        let secret = SecretString::from(STRONG_SECRET);
        assert!(validate_session_secret(&secret, "SESSION_SECRET").is_ok());
    }
}
