//! Domain models for the store.
//!
//! Validated types returned by repositories and consumed by services and
//! templates. Row types stay private to `crate::db`.

pub mod product;
pub mod session;
pub mod transaction;
pub mod user;

pub use product::{NewProduct, Product, ProductFilter};
pub use session::{CurrentUser, keys as session_keys};
pub use transaction::Transaction;
pub use user::User;
