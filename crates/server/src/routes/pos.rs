//! Point-of-sale page.
//!
//! The page lists in-stock products; the cart itself lives in the browser
//! (`static/pos.js`) and is submitted to `POST /api/transaction`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    middleware::RequireAuth,
    models::{Product, ProductFilter},
    services::CatalogService,
    state::AppState,
};

use super::dashboard::NavUserView;

/// Product tile on the till.
#[derive(Debug, Clone)]
pub struct PosProductView {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub price: String,
    /// Unit price without currency symbol, read by the cart script.
    pub unit_price: String,
    pub stock: i32,
}

impl From<&Product> for PosProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            unit_price: format!("{:.2}", product.price.amount()),
            stock: product.stock,
        }
    }
}

/// Point-of-sale template.
#[derive(Template, WebTemplate)]
#[template(path = "pos.html")]
pub struct PosTemplate {
    pub user: NavUserView,
    pub current_path: &'static str,
    pub products: Vec<PosProductView>,
}

/// Build the point-of-sale router.
pub fn router() -> Router<AppState> {
    Router::new().route("/pos", get(index))
}

/// Point-of-sale page handler.
#[instrument(skip(user, state))]
async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<PosTemplate, AppError> {
    let products = CatalogService::new(state.pool())
        .list_products(ProductFilter::InStock)
        .await?;

    Ok(PosTemplate {
        user: NavUserView::from(&user),
        current_path: "/pos",
        products: products.iter().map(PosProductView::from).collect(),
    })
}
