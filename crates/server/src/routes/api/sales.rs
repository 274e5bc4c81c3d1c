//! Checkout API.

use axum::{
    Json, Router, extract::State, extract::rejection::JsonRejection, routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use campus_mart_core::{CartLine, Money, ProductId, TransactionId};

use crate::{
    error::ApiError,
    middleware::RequireAuth,
    services::{SaleReceipt, SalesService},
    state::AppState,
};

/// Build the checkout router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/transaction", post(create_transaction))
}

/// Request body for a checkout.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

/// Response for a completed checkout.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub success: bool,
    pub id: TransactionId,
    pub total: Money,
    pub item_count: i32,
    /// Cart IDs that matched no product.
    pub skipped: Vec<ProductId>,
}

impl From<SaleReceipt> for TransactionResponse {
    fn from(receipt: SaleReceipt) -> Self {
        Self {
            success: true,
            id: receipt.transaction_id,
            total: receipt.total,
            item_count: receipt.item_count,
            skipped: receipt.skipped,
        }
    }
}

/// Sell a cart.
///
/// # Errors
///
/// 400 for an empty cart, a negative quantity or insufficient stock; 500 if
/// the sale could not be written. Nothing is written in either case.
#[instrument(skip(user, state, payload), fields(user_id = %user.id))]
pub async fn create_transaction(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(request) = payload?;

    let receipt = SalesService::new(state.pool())
        .process_sale(&request.items)
        .await?;

    Ok(Json(receipt.into()))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::routes::test_support::{body_string, login_cookie, test_app};

    fn json_post(body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/api/transaction").header("content-type", "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    async fn error_of(response: axum::response::Response) -> String {
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).expect("json body");
        body["error"].as_str().expect("error field").to_string()
    }

    #[test]
    fn test_response_wire_format() {
        let response = TransactionResponse::from(SaleReceipt {
            transaction_id: TransactionId::new(9),
            total: Money::from_cents(700),
            item_count: 2,
            skipped: vec![ProductId::new(99)],
        });
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["id"], 9);
        assert_eq!(json["total"], "7.00");
        assert_eq!(json["item_count"], 2);
        assert_eq!(json["skipped"], serde_json::json!([99]));
    }

    #[tokio::test]
    async fn test_requires_session() {
        let response = test_app(MemoryStore::default())
            .oneshot(json_post(r#"{"items": []}"#, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(response).await, "Authentication required");
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let store = MemoryStore::default();
        let cookie = login_cookie(&store).await;

        let response = test_app(store)
            .oneshot(json_post(r#"{"items": []}"#, Some(&cookie)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(response).await, "Cart is empty");
    }

    #[tokio::test]
    async fn test_missing_items_counts_as_empty_cart() {
        let store = MemoryStore::default();
        let cookie = login_cookie(&store).await;

        let response = test_app(store)
            .oneshot(json_post("{}", Some(&cookie)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_of(response).await, "Cart is empty");
    }

    #[tokio::test]
    async fn test_negative_quantity_is_rejected() {
        let store = MemoryStore::default();
        let cookie = login_cookie(&store).await;

        let response = test_app(store)
            .oneshot(json_post(
                r#"{"items": [{"id": 1, "quantity": -2}]}"#,
                Some(&cookie),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let store = MemoryStore::default();
        let cookie = login_cookie(&store).await;

        let response = test_app(store)
            .oneshot(json_post(r#"{"items": "lots"}"#, Some(&cookie)))
            .await
            .expect("response");
        assert!(response.status().is_client_error());
        assert!(!error_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_database_is_server_error() {
        let store = MemoryStore::default();
        let cookie = login_cookie(&store).await;

        let response = test_app(store)
            .oneshot(json_post(
                r#"{"items": [{"id": 1, "quantity": 1}]}"#,
                Some(&cookie),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error_of(response).await.starts_with("Transaction failed: "));
    }
}
