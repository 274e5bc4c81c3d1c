//! Product catalog repository.
//!
//! Plain reads and writes go through [`ProductRepository`]. The two
//! functions used by checkout, [`lock_for_sale`] and [`decrement_stock`],
//! take a connection so they run inside the caller's transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use campus_mart_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductFilter};

const PRODUCT_COLUMNS: &str =
    "id, name, category, price, stock, description, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    category: String,
    price: Decimal,
    stock: i32,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn decode_price(id: i32, price: Decimal) -> Result<Money, RepositoryError> {
    Money::new(price).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid price for product {id}: {e}"))
    })
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            price: decode_price(row.id, row.price)?,
            name: row.name,
            category: row.category,
            stock: row.stock,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A product row held under `FOR UPDATE` during checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct LockedProductRow {
    id: i32,
    name: String,
    price: Decimal,
    stock: i32,
}

impl TryFrom<LockedProductRow> for LockedProduct {
    type Error = RepositoryError;

    fn try_from(row: LockedProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            price: decode_price(row.id, row.price)?,
            name: row.name,
            stock: row.stock,
        })
    }
}

/// Aggregate stock figures for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct StockSummary {
    /// Sum of `stock` over all products.
    pub total_units: i64,
    /// Number of products below the low-stock threshold.
    pub low_stock_count: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products ordered by name, then ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE (NOT $1 OR stock > 0)
            ORDER BY name, id
            "
        ))
        .bind(filter == ProductFilter::InStock)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (name, category, price, stock, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(product.description.as_deref())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products
            SET name = $2, category = $3, price = $4, stock = $5,
                description = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(product.description.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Total units on hand and the number of products below `threshold`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_summary(&self, threshold: i32) -> Result<StockSummary, RepositoryError> {
        let summary = sqlx::query_as::<_, StockSummary>(
            r"
            SELECT COALESCE(SUM(stock), 0)::BIGINT AS total_units,
                   COUNT(*) FILTER (WHERE stock < $1) AS low_stock_count
            FROM products
            ",
        )
        .bind(threshold)
        .fetch_one(self.pool)
        .await?;

        Ok(summary)
    }

    /// Names of products below `threshold`, lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock_names(
        &self,
        threshold: i32,
        limit: i64,
    ) -> Result<Vec<String>, RepositoryError> {
        let names = sqlx::query_scalar::<_, String>(
            r"
            SELECT name
            FROM products
            WHERE stock < $1
            ORDER BY stock, name
            LIMIT $2
            ",
        )
        .bind(threshold)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(names)
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Lock the given product rows for the rest of the transaction.
///
/// Rows are locked in ascending ID order so that concurrent checkouts over
/// overlapping carts cannot deadlock. IDs with no row are simply absent from
/// the result.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
pub async fn lock_for_sale(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<LockedProduct>, RepositoryError> {
    let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
    let rows = sqlx::query_as::<_, LockedProductRow>(
        r"
        SELECT id, name, price, stock
        FROM products
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(raw_ids)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

/// Remove `quantity` units from a locked product.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the row is gone or holds fewer than
/// `quantity` units.
/// Returns `RepositoryError::Database` if the update fails.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE products
        SET stock = stock - $2, updated_at = NOW()
        WHERE id = $1 AND stock >= $2
        ",
    )
    .bind(id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() != 1 {
        return Err(RepositoryError::Conflict(format!(
            "product {id} cannot give up {quantity} units"
        )));
    }
    Ok(())
}
