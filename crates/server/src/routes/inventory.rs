//! Inventory management route handlers.
//!
//! Every mutation answers with a redirect back to `/inventory` carrying a
//! flash message in the query string.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use tracing::instrument;

use campus_mart_core::ProductId;

use crate::{
    error::AppError,
    filters,
    middleware::RequireAuth,
    models::{CurrentUser, Product, ProductFilter},
    services::{CatalogError, CatalogService, LOW_STOCK_THRESHOLD, ProductInput},
    state::AppState,
};

use super::dashboard::NavUserView;
use super::{MessageQuery, redirect_with_message};

/// Categories offered as suggestions in the product form.
pub const SUGGESTED_CATEGORIES: [&str; 5] = [
    "Snacks",
    "Beverages",
    "Stationery",
    "Electronics",
    "Personal Care",
];

/// Product row for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub category: String,
    /// Display price, e.g. `$3.50`.
    pub price: String,
    /// Price as entered in the edit form, e.g. `3.50`.
    pub price_input: String,
    pub stock: i32,
    pub description: String,
    pub is_low_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            price_input: format!("{:.2}", product.price.amount()),
            stock: product.stock,
            description: product.description.clone().unwrap_or_default(),
            is_low_stock: product.is_low_stock(LOW_STOCK_THRESHOLD),
        }
    }
}

/// Inventory page template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory.html")]
pub struct InventoryTemplate {
    pub user: NavUserView,
    pub current_path: &'static str,
    pub products: Vec<ProductView>,
    pub categories: &'static [&'static str],
    pub low_stock_count: usize,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl InventoryTemplate {
    fn new(user: &CurrentUser, products: &[Product], query: MessageQuery) -> Self {
        let products: Vec<ProductView> = products.iter().map(ProductView::from).collect();
        let low_stock_count = products.iter().filter(|p| p.is_low_stock).count();

        Self {
            user: NavUserView::from(user),
            current_path: "/inventory",
            products,
            categories: &SUGGESTED_CATEGORIES,
            low_stock_count,
            error: query.error,
            success: query.success,
        }
    }
}

/// Build the inventory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(index).post(create))
        .route("/inventory/{id}", post(update))
        .route("/inventory/delete/{id}", post(delete))
}

/// Inventory page handler.
#[instrument(skip(user, state, query))]
async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<InventoryTemplate, AppError> {
    let products = CatalogService::new(state.pool())
        .list_products(ProductFilter::All)
        .await?;

    Ok(InventoryTemplate::new(&user, &products, query))
}

/// Turn a catalog outcome into the redirect back to the inventory page.
fn flash(result: Result<String, CatalogError>) -> Result<Redirect, AppError> {
    match result {
        Ok(message) => Ok(redirect_with_message("/inventory", "success", &message)),
        Err(CatalogError::Validation(message)) => {
            Ok(redirect_with_message("/inventory", "error", &message))
        }
        Err(CatalogError::NotFound) => Ok(redirect_with_message(
            "/inventory",
            "error",
            "Product not found",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Create a product.
#[instrument(skip(_user, state, form))]
async fn create(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<ProductInput>,
) -> Result<Redirect, AppError> {
    let result = CatalogService::new(state.pool())
        .create_product(&form)
        .await
        .map(|_| format!("Added {}", form.name.trim()));
    flash(result)
}

/// Replace a product's fields, including restocking.
#[instrument(skip(_user, state, form))]
async fn update(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ProductInput>,
) -> Result<Redirect, AppError> {
    let result = CatalogService::new(state.pool())
        .update_product(ProductId::new(id), &form)
        .await
        .map(|product| format!("Updated {}", product.name));
    flash(result)
}

/// Delete a product.
#[instrument(skip(_user, state))]
async fn delete(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let result = CatalogService::new(state.pool())
        .delete_product(ProductId::new(id))
        .await
        .map(|()| "Product deleted".to_string());
    flash(result)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use campus_mart_core::{Money, UserId, UserRole, Username};

    use super::*;
    use crate::routes::test_support::{location, login_cookie, test_app};

    fn product(id: i32, name: &str, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            category: "Snacks".to_string(),
            price: Money::from_cents(150),
            stock,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(uri).header("content-type", "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    #[test]
    fn test_product_view_formats_prices() {
        let view = ProductView::from(&product(3, "Granola Bar", 4));
        assert_eq!(view.price, "$1.50");
        assert_eq!(view.price_input, "1.50");
        assert!(view.is_low_stock);
        assert_eq!(view.description, "");
    }

    #[test]
    fn test_template_counts_low_stock() {
        let user = CurrentUser {
            id: UserId::new(1),
            username: Username::parse("till1").expect("username"),
            role: UserRole::Staff,
        };
        let products = [product(1, "Granola Bar", 100), product(2, "USB-C Cable", 9)];
        let html = InventoryTemplate::new(
            &user,
            &products,
            MessageQuery {
                error: Some("name: cannot be empty".to_string()),
                success: None,
            },
        );
        assert_eq!(html.low_stock_count, 1);

        let rendered = html.render().expect("render");
        assert!(rendered.contains(r#"action="/inventory/2""#));
        assert!(rendered.contains(r#"action="/inventory/delete/2""#));
        assert!(rendered.contains("name: cannot be empty"));
    }

    #[tokio::test]
    async fn test_create_requires_login() {
        let response = test_app(MemoryStore::default())
            .oneshot(form_post("/inventory", "name=Pen", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));
    }

    #[tokio::test]
    async fn test_invalid_price_redirects_with_error() {
        let store = MemoryStore::default();
        let cookie = login_cookie(&store).await;

        let response = test_app(store)
            .oneshot(form_post(
                "/inventory",
                "name=Pen&category=Stationery&price=abc&stock=5",
                Some(&cookie),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            Some("/inventory?error=price%3A+%27abc%27+is+not+a+valid+amount")
        );
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_on_update() {
        let store = MemoryStore::default();
        let cookie = login_cookie(&store).await;

        let response = test_app(store)
            .oneshot(form_post(
                "/inventory/4",
                "name=USB-C+Cable&category=Electronics&price=12.99&stock=-3",
                Some(&cookie),
            ))
            .await
            .expect("response");
        assert_eq!(
            location(&response),
            Some("/inventory?error=stock%3A+cannot+be+negative")
        );
    }
}
