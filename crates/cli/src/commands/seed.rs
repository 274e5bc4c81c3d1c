//! Seed data commands.
//!
//! Products go through the same validation as the inventory form, so a bad
//! price or negative stock in a catalog file is rejected the same way.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use campus_mart_server::models::ProductFilter;
use campus_mart_server::services::{CatalogError, CatalogService, ProductInput};

use super::{CliError, connect};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<SeedProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct SeedProduct {
    name: String,
    category: String,
    /// Kept as text so the amount is parsed exactly.
    price: String,
    stock: i64,
    #[serde(default)]
    description: Option<String>,
}

impl SeedProduct {
    fn new(name: &str, category: &str, price: &str, stock: i64, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            category: category.to_owned(),
            price: price.to_owned(),
            stock,
            description: Some(description.to_owned()),
        }
    }

    fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            category: self.category.clone(),
            price: self.price.clone(),
            stock: self.stock.to_string(),
            description: self.description.clone(),
        }
    }
}

/// Starter catalog for a fresh store.
fn starter_catalog() -> Vec<SeedProduct> {
    vec![
        SeedProduct::new(
            "College Ruled Notebook",
            "Stationery",
            "3.50",
            50,
            "Standard 100-page notebook for all your class notes.",
        ),
        SeedProduct::new(
            "Energy Drink - Blue",
            "Beverages",
            "2.99",
            24,
            "Sugar-free energy boost for late night study sessions.",
        ),
        SeedProduct::new(
            "Granola Bar",
            "Snacks",
            "1.50",
            100,
            "Healthy oat and honey granola bar.",
        ),
        SeedProduct::new(
            "USB-C Cable",
            "Electronics",
            "12.99",
            10,
            "Fast charging durable cable, 1 meter length.",
        ),
    ]
}

fn parse_catalog_file(contents: &str) -> Result<Vec<SeedProduct>, CliError> {
    let file: CatalogFile = serde_yaml::from_str(contents)?;
    Ok(file.products)
}

async fn load_catalog(path: Option<&Path>) -> Result<Vec<SeedProduct>, CliError> {
    match path {
        Some(path) => parse_catalog_file(&tokio::fs::read_to_string(path).await?),
        None => Ok(starter_catalog()),
    }
}

/// Entries whose name is not already taken, first occurrence wins.
fn missing_products(catalog: Vec<SeedProduct>, existing: &HashSet<String>) -> Vec<SeedProduct> {
    let mut seen = HashSet::new();
    catalog
        .into_iter()
        .filter(|product| !existing.contains(&product.name) && seen.insert(product.name.clone()))
        .collect()
}

/// Insert products from `path`, or the starter catalog, skipping names that
/// already exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an entry fails
/// validation, or the database is unreachable.
pub async fn products(path: Option<&Path>) -> Result<(), CliError> {
    let catalog = load_catalog(path).await?;

    let pool = connect().await?;
    let service = CatalogService::new(&pool);

    let existing: HashSet<String> = service
        .list_products(ProductFilter::All)
        .await?
        .into_iter()
        .map(|product| product.name)
        .collect();

    let total = catalog.len();
    let pending = missing_products(catalog, &existing);
    let skipped = total - pending.len();

    for product in &pending {
        match service.create_product(&product.to_input()).await {
            Ok(id) => tracing::info!(product_id = %id, name = %product.name, "Seeded product"),
            Err(CatalogError::Validation(msg)) => {
                return Err(CliError::InvalidInput(format!("{}: {msg}", product.name)));
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(created = pending.len(), skipped, "Product seeding complete");
    Ok(())
}
