//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::llm::{LlmClient, LlmError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the database pool and the optional completion client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    llm: Option<LlmClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The completion client is built only when an API key is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion client cannot be constructed.
    pub fn new(config: &AppConfig, pool: PgPool) -> Result<Self, LlmError> {
        let llm = config.ai.as_ref().map(LlmClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner { pool, llm }),
        })
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The completion client, if AI features are enabled.
    #[must_use]
    pub fn llm(&self) -> Option<&LlmClient> {
        self.inner.llm.as_ref()
    }
}
