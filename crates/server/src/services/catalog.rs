//! Product catalog management.

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use campus_mart_core::{Money, ProductId};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::{NewProduct, Product, ProductFilter};

/// Maximum product name length (`products.name VARCHAR(100)`).
pub const MAX_NAME_LENGTH: usize = 100;
/// Maximum category length (`products.category VARCHAR(50)`).
pub const MAX_CATEGORY_LENGTH: usize = 50;
/// Smallest price the catalog refuses, in cents (`products.price NUMERIC(10,2)`).
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Submitted fields failed validation.
    #[error("{0}")]
    Validation(String),

    /// No product has the requested ID.
    #[error("product not found")]
    NotFound,

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Raw product fields as submitted by the inventory form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub category: String,
    pub price: String,
    pub stock: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProductInput {
    /// Validate and normalize the submitted fields.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<NewProduct, CatalogError> {
        let name = required_text("name", &self.name, MAX_NAME_LENGTH)?;
        let category = required_text("category", &self.category, MAX_CATEGORY_LENGTH)?;

        let price: Money = self
            .price
            .parse()
            .map_err(|e| CatalogError::Validation(format!("price: {e}")))?;
        if price >= Money::from_cents(MAX_PRICE_CENTS) {
            return Err(CatalogError::Validation(format!(
                "price: must be less than {}",
                Money::from_cents(MAX_PRICE_CENTS)
            )));
        }

        let stock: i32 = self.stock.trim().parse().map_err(|_| {
            CatalogError::Validation(format!("stock: '{}' is not a whole number", self.stock))
        })?;
        if stock < 0 {
            return Err(CatalogError::Validation(
                "stock: cannot be negative".to_string(),
            ));
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned);

        Ok(NewProduct {
            name,
            category,
            price,
            stock,
            description,
        })
    }
}

fn required_text(field: &str, value: &str, max: usize) -> Result<String, CatalogError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CatalogError::Validation(format!("{field}: cannot be empty")));
    }
    if value.chars().count() > max {
        return Err(CatalogError::Validation(format!(
            "{field}: must be at most {max} characters"
        )));
    }
    Ok(value.to_owned())
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for invalid input and
    /// `CatalogError::Repository` if the insert fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<ProductId, CatalogError> {
        let product = input.validate()?;
        let created = self.products.create(&product).await?;
        tracing::info!(product_id = %created.id, "Product created");
        Ok(created.id)
    }

    /// List products ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list(filter).await?)
    }

    /// Replace a product's fields, including its stock level.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for invalid input,
    /// `CatalogError::NotFound` if the product does not exist, and
    /// `CatalogError::Repository` if the update fails.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, CatalogError> {
        let product = input.validate()?;
        let updated = self.products.update(id, &product).await?;
        tracing::info!(stock = updated.stock, "Product updated");
        Ok(updated)
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist and
    /// `CatalogError::Repository` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.products.delete(id).await?;
        tracing::info!("Product deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str, category: &str, price: &str, stock: &str) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            category: category.to_string(),
            price: price.to_string(),
            stock: stock.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_validate_trims_and_parses() {
        let mut form = input("  Granola Bar ", "Snacks", "1.50", " 100 ");
        form.description = Some("   ".to_string());

        let product = form.validate().unwrap();
        assert_eq!(product.name, "Granola Bar");
        assert_eq!(product.price, Money::from_cents(150));
        assert_eq!(product.stock, 100);
        assert_eq!(product.description, None);
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let err = input(" ", "Snacks", "1.00", "1").validate().unwrap_err();
        assert_eq!(err.to_string(), "name: cannot be empty");

        let err = input("Pen", "", "1.00", "1").validate().unwrap_err();
        assert_eq!(err.to_string(), "category: cannot be empty");
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        for (price, stock) in [("abc", "1"), ("-1", "1"), ("1.001", "1"), ("1", "x"), ("1", "-3"), ("1", "2.5"), ("100000000", "1"), ("123456789.00", "1")] {
            let result = input("Pen", "Stationery", price, stock).validate();
            assert!(
                matches!(result, Err(CatalogError::Validation(_))),
                "price={price} stock={stock}"
            );
        }
    }

    #[test]
    fn test_validate_price_limit() {
        let ok = input("Pen", "Stationery", "99999999.99", "1").validate().unwrap();
        assert_eq!(ok.price, Money::from_cents(MAX_PRICE_CENTS - 1));

        let Err(CatalogError::Validation(msg)) =
            input("Pen", "Stationery", "$100000000.00", "1").validate()
        else {
            panic!("expected a validation error");
        };
        assert!(msg.starts_with("price:"), "{msg}");
    }

    #[test]
    fn test_validate_rejects_overlong_name() {
        let long = "n".repeat(MAX_NAME_LENGTH + 1);
        assert!(input(&long, "Snacks", "1", "1").validate().is_err());
    }

    #[test]
    fn test_repository_not_found_maps_to_catalog_not_found() {
        assert!(matches!(
            CatalogError::from(RepositoryError::NotFound),
            CatalogError::NotFound
        ));
    }
}
