//! AI advisory API.
//!
//! Both endpoints always answer 200 with display text; provider problems
//! are folded into fallback sentences by the advisor service.

use axum::{
    Json, Router, extract::State, extract::rejection::JsonRejection, routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::ApiError, middleware::RequireAuth, services::AdvisorService, state::AppState,
};

/// Build the advisor router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/generate-description", post(generate_description))
        .route("/api/analyze-business", post(analyze_business))
}

/// Request for a product description.
#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub insight: String,
}

/// Draft a one-sentence product description.
///
/// # Errors
///
/// Returns 400 only when the body is not valid JSON.
#[instrument(skip(_user, state, payload))]
pub async fn generate_description(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    payload: Result<Json<DescriptionRequest>, JsonRejection>,
) -> Result<Json<DescriptionResponse>, ApiError> {
    let Json(request) = payload?;

    let description = AdvisorService::new(state.pool(), state.llm())
        .generate_description(request.name.trim(), request.category.trim())
        .await;

    Ok(Json(DescriptionResponse { description }))
}

/// Summarize the store's figures as action items.
#[instrument(skip(_user, state))]
pub async fn analyze_business(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> Json<InsightResponse> {
    let insight = AdvisorService::new(state.pool(), state.llm())
        .analyze_business()
        .await;

    Json(InsightResponse { insight })
}
