//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Username/password authentication and account management
//! - `catalog` - Product create, list, update and delete
//! - `sales` - Checkout: stock checks, deductions and the transaction record
//! - `reporting` - Dashboard aggregates
//! - `advisor` - AI product descriptions and business insights

pub mod advisor;
pub mod auth;
pub mod catalog;
pub mod reporting;
pub mod sales;

pub use advisor::AdvisorService;
pub use auth::{AuthError, AuthService};
pub use catalog::{CatalogError, CatalogService, ProductInput};
pub use reporting::{DashboardSummary, LOW_STOCK_THRESHOLD, ReportingService};
pub use sales::{SaleError, SaleReceipt, SalesService};
