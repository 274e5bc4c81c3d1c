//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    middleware::RequireAuth,
    models::{CurrentUser, Transaction},
    services::{DashboardSummary, ReportingService},
    state::AppState,
};

/// Logged-in user as shown in the navigation bar.
#[derive(Debug, Clone)]
pub struct NavUserView {
    pub username: String,
    pub role: String,
    pub is_admin: bool,
}

impl From<&CurrentUser> for NavUserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            username: user.username.to_string(),
            role: user.role.to_string(),
            is_admin: user.role.is_admin(),
        }
    }
}

/// Dashboard figures, preformatted for display.
#[derive(Debug, Clone)]
pub struct MetricsView {
    pub revenue: String,
    pub transactions: i64,
    pub stock_units: i64,
    pub low_stock: i64,
}

/// Recent sale row.
#[derive(Debug, Clone)]
pub struct TransactionView {
    pub id: String,
    pub total: String,
    pub item_count: i32,
    pub recorded_at: String,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            total: tx.total.to_string(),
            item_count: tx.item_count,
            recorded_at: tx.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: NavUserView,
    pub current_path: &'static str,
    pub metrics: MetricsView,
    pub recent: Vec<TransactionView>,
}

impl DashboardTemplate {
    fn new(user: &CurrentUser, summary: &DashboardSummary) -> Self {
        Self {
            user: NavUserView::from(user),
            current_path: "/dashboard",
            metrics: MetricsView {
                revenue: summary.total_revenue.to_string(),
                transactions: summary.transaction_count,
                stock_units: summary.total_stock_units,
                low_stock: summary.low_stock_count,
            },
            recent: summary
                .recent_transactions
                .iter()
                .map(TransactionView::from)
                .collect(),
        }
    }
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

/// Dashboard page handler.
#[instrument(skip(user, state), fields(user_id = %user.id))]
async fn dashboard(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<DashboardTemplate, AppError> {
    let summary = ReportingService::new(state.pool())
        .dashboard_summary()
        .await?;

    Ok(DashboardTemplate::new(&user, &summary))
}
