//! JSON API route handlers.
//!
//! All endpoints require a logged-in session and answer errors with an
//! `{"error": ...}` body.

pub mod advisor;
pub mod sales;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(sales::router())
        .merge(advisor::router())
}
