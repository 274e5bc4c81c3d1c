//! AI-written product copy and business summaries.
//!
//! Every operation here returns display text. A missing API key or a failed
//! call produces a fixed fallback sentence instead of an error, so the
//! inventory and dashboard pages work the same with or without a provider.

use sqlx::PgPool;
use tracing::instrument;

use campus_mart_core::Money;

use crate::db::RepositoryError;
use crate::llm::{LlmClient, LlmError, Message};
use crate::services::reporting::ReportingService;

/// Returned by every operation when no API key is configured.
pub const NOT_CONFIGURED: &str = "AI API Key not configured.";
/// Returned when a description cannot be generated.
pub const DESCRIPTION_FALLBACK: &str = "Could not generate description.";
/// Returned when the business summary cannot be produced.
pub const ANALYSIS_FALLBACK: &str = "Analysis unavailable.";

/// Number of low-stock product names included in the summary prompt.
pub const LOW_STOCK_SAMPLE: i64 = 5;

/// Store figures fed to the summary prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessSnapshot {
    pub revenue: Money,
    pub transaction_count: i64,
    pub low_stock: Vec<String>,
}

/// Prompt asking for a one-sentence product blurb.
#[must_use]
pub fn description_prompt(name: &str, category: &str) -> String {
    format!(
        "Write a short, catchy, 1-sentence description for a university store product.\n\
         Product: {name}\n\
         Category: {category}\n\
         Keep it appealing to students."
    )
}

/// Prompt asking for action items based on the store figures.
#[must_use]
pub fn analysis_prompt(snapshot: &BusinessSnapshot) -> String {
    let low_stock = if snapshot.low_stock.is_empty() {
        "None".to_string()
    } else {
        snapshot.low_stock.join(", ")
    };

    format!(
        "Analyze this retail data for CampusMart:\n\
         - Total Revenue: {revenue}\n\
         - Total Transactions: {count}\n\
         - Low Stock Items: {low_stock}\n\
         \n\
         Provide a concise (max 3 bullet points) business insight summary focusing on \
         action items for the store manager.",
        revenue = snapshot.revenue,
        count = snapshot.transaction_count,
    )
}

#[derive(Debug, thiserror::Error)]
enum AnalysisError {
    #[error("loading store figures: {0}")]
    Figures(#[from] RepositoryError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Advisor service.
pub struct AdvisorService<'a> {
    pool: &'a PgPool,
    llm: Option<&'a LlmClient>,
}

impl<'a> AdvisorService<'a> {
    /// Create a new advisor; `llm` is `None` when no API key is configured.
    #[must_use]
    pub const fn new(pool: &'a PgPool, llm: Option<&'a LlmClient>) -> Self {
        Self { pool, llm }
    }

    /// Draft a one-sentence description for a product.
    #[instrument(skip(self))]
    pub async fn generate_description(&self, name: &str, category: &str) -> String {
        let Some(llm) = self.llm else {
            return NOT_CONFIGURED.to_string();
        };

        match llm
            .complete(vec![Message::user(description_prompt(name, category))])
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Description generation failed");
                DESCRIPTION_FALLBACK.to_string()
            }
        }
    }

    /// Summarize revenue, transaction volume and low stock as action items.
    #[instrument(skip(self))]
    pub async fn analyze_business(&self) -> String {
        let Some(llm) = self.llm else {
            return NOT_CONFIGURED.to_string();
        };

        match self.try_analyze(llm).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Business analysis failed");
                ANALYSIS_FALLBACK.to_string()
            }
        }
    }

    async fn try_analyze(&self, llm: &LlmClient) -> Result<String, AnalysisError> {
        let reporting = ReportingService::new(self.pool);
        let (revenue, low_stock) = tokio::try_join!(
            reporting.revenue(),
            reporting.low_stock_names(LOW_STOCK_SAMPLE),
        )?;

        let snapshot = BusinessSnapshot {
            revenue: revenue.revenue,
            transaction_count: revenue.transaction_count,
            low_stock,
        };

        Ok(llm
            .complete(vec![Message::user(analysis_prompt(&snapshot))])
            .await?)
    }
}
