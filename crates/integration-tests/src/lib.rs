//! Integration tests for CampusMart.
//!
//! The tests drive a running server over HTTP and use the same database to
//! set up fixtures and check results.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the server against a scratch database
//! CAMPUS_MART_DATABASE_URL=postgres://localhost/campus_mart_test cargo run -p campus-mart-server
//!
//! # In another shell, with the same database URL
//! CAMPUS_MART_DATABASE_URL=postgres://localhost/campus_mart_test \
//!     cargo test -p campus-mart-integration-tests -- --ignored
//! ```
//!
//! `CAMPUS_MART_TEST_URL` points the client at a server other than
//! `http://localhost:5000`.
//!
//! Every fixture uses a fresh UUID-based name, so runs do not interfere with
//! each other or with existing data. Tests that count `transactions` rows
//! hold [`sales_lock`] so no other sale in the process lands in between.

use reqwest::{Client, Response, StatusCode, redirect::Policy};
use secrecy::SecretString;
use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use campus_mart_core::{ProductId, UserRole};
use campus_mart_server::db;
use campus_mart_server::services::{AuthService, CatalogService, ProductInput};

/// Password given to every fixture account.
pub const TEST_PASSWORD: &str = "integration-pass-1";

static SALES: Mutex<()> = Mutex::const_new(());

/// Serialize tests that make sales and count the transaction log.
pub async fn sales_lock() -> MutexGuard<'static, ()> {
    SALES.lock().await
}

/// HTTP client plus database handle for one test.
pub struct TestContext {
    /// Cookie-keeping client that does not follow redirects.
    pub client: Client,
    /// Server root, without a trailing slash.
    pub base_url: String,
    /// Pool on the server's database.
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the database and build a fresh client.
    ///
    /// # Panics
    ///
    /// Panics if no database URL is configured or the database is down.
    pub async fn new() -> Self {
        let _ = dotenvy::dotenv();

        let base_url = std::env::var("CAMPUS_MART_TEST_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string())
            .trim_end_matches('/')
            .to_string();

        let database_url = std::env::var("CAMPUS_MART_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("CAMPUS_MART_DATABASE_URL or DATABASE_URL must be set");
        let pool = db::create_pool(&SecretString::from(database_url))
            .await
            .expect("Failed to connect to test database");

        Self {
            client: new_client(),
            base_url,
            pool,
        }
    }

    /// Absolute URL for a server path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Create a staff account with a unique name and return the name.
    ///
    /// # Panics
    ///
    /// Panics if the account cannot be created.
    pub async fn create_user(&self) -> String {
        let username = format!("it-{}", Uuid::new_v4().simple());
        AuthService::new(&self.pool)
            .create_user(
                &username,
                SecretString::from(TEST_PASSWORD),
                UserRole::Staff,
                None,
            )
            .await
            .expect("Failed to create test user");
        username
    }

    /// Submit the login form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to send login request")
    }

    /// Create a fixture user and log this client in as them.
    ///
    /// # Panics
    ///
    /// Panics if login does not redirect to the dashboard.
    pub async fn logged_in() -> Self {
        let ctx = Self::new().await;
        let username = ctx.create_user().await;
        let resp = ctx.login(&username, TEST_PASSWORD).await;
        assert_eq!(location(&resp), Some("/dashboard"));
        ctx
    }

    /// Insert a product with a unique name directly through the catalog
    /// service.
    ///
    /// # Panics
    ///
    /// Panics if the product is rejected.
    pub async fn create_product(&self, price: &str, stock: i32) -> (ProductId, String) {
        let name = format!("IT Product {}", Uuid::new_v4().simple());
        let id = CatalogService::new(&self.pool)
            .create_product(&ProductInput {
                name: name.clone(),
                category: "Test".to_string(),
                price: price.to_string(),
                stock: stock.to_string(),
                description: None,
            })
            .await
            .expect("Failed to create test product");
        (id, name)
    }

    /// Current stock of a product, or `None` if it no longer exists.
    ///
    /// # Panics
    ///
    /// Panics if the query fails.
    pub async fn stock_of(&self, id: ProductId) -> Option<i32> {
        sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .expect("Failed to read product stock")
    }

    /// Number of rows in the transaction log.
    ///
    /// # Panics
    ///
    /// Panics if the query fails.
    pub async fn transaction_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count transactions")
    }

    /// `(total, item_count)` of a recorded transaction, total as text.
    ///
    /// # Panics
    ///
    /// Panics if the query fails.
    pub async fn transaction(&self, id: i64) -> Option<(String, i32)> {
        let id = i32::try_from(id).expect("Transaction id out of range");
        sqlx::query_as("SELECT total::TEXT, item_count FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .expect("Failed to read transaction")
    }

    /// POST a cart to the checkout API.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn checkout(&self, items: &serde_json::Value) -> Response {
        self.client
            .post(self.url("/api/transaction"))
            .json(&serde_json::json!({ "items": items }))
            .send()
            .await
            .expect("Failed to send checkout request")
    }
}

/// Client with a cookie jar that leaves redirects to the caller.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized.
#[must_use]
pub fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(resp: &Response) -> Option<&str> {
    if !resp.status().is_redirection() {
        return None;
    }
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Whether a response is the see-other redirect the form handlers send.
#[must_use]
pub fn is_see_other(resp: &Response) -> bool {
    resp.status() == StatusCode::SEE_OTHER
}
