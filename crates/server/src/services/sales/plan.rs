//! In-memory checkout planning.
//!
//! Given a cart and a snapshot of the locked product rows, decide what the
//! sale will do without touching the database. The service applies the
//! resulting plan inside the same transaction that produced the snapshot.

use std::collections::{BTreeMap, HashMap};

use campus_mart_core::{CartLine, Money, ProductId};

use super::SaleError;
use crate::db::LockedProduct;

/// Smallest sale total refused, in cents (`transactions.total NUMERIC(18,2)`).
pub const MAX_TOTAL_CENTS: i64 = 1_000_000_000_000_000_000;

/// Units to remove from one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDeduction {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// The effect of a checkout, computed before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SalePlan {
    /// One entry per product, ascending by ID, zero quantities omitted.
    pub deductions: Vec<StockDeduction>,
    /// `Σ price × quantity` over the known lines.
    pub total: Money,
    /// `Σ quantity` over the known lines.
    pub item_count: i32,
    /// Cart product IDs with no matching row, in first-seen order.
    pub skipped: Vec<ProductId>,
}

/// Reject carts that can be refused without looking at the store.
///
/// # Errors
///
/// Returns `SaleError::EmptyCart` for an empty cart and
/// `SaleError::InvalidQuantity` for the first negative quantity.
pub fn validate_cart(lines: &[CartLine]) -> Result<(), SaleError> {
    if lines.is_empty() {
        return Err(SaleError::EmptyCart);
    }
    if let Some(line) = lines.iter().find(|line| line.quantity < 0) {
        return Err(SaleError::InvalidQuantity {
            product_id: line.product_id,
            quantity: line.quantity,
        });
    }
    Ok(())
}

/// Plan a checkout against locked stock.
///
/// Lines are walked in cart order. A product listed on several lines draws
/// on the same remaining stock, so the check sees the cumulative request.
///
/// # Errors
///
/// Returns the errors of [`validate_cart`],
/// `SaleError::InsufficientStock` naming the first product that runs out, and
/// `SaleError::TotalTooLarge` when the total would not fit the ledger.
pub fn plan_sale(lines: &[CartLine], stock: &[LockedProduct]) -> Result<SalePlan, SaleError> {
    validate_cart(lines)?;

    let products: HashMap<ProductId, &LockedProduct> = stock.iter().map(|p| (p.id, p)).collect();
    let mut remaining: HashMap<ProductId, i32> = stock.iter().map(|p| (p.id, p.stock)).collect();
    let mut deducted: BTreeMap<ProductId, i32> = BTreeMap::new();
    let mut plan = SalePlan::default();
    let mut line_totals = Vec::with_capacity(lines.len());

    for line in lines {
        let (Some(product), Some(left)) = (
            products.get(&line.product_id),
            remaining.get_mut(&line.product_id),
        ) else {
            if !plan.skipped.contains(&line.product_id) {
                plan.skipped.push(line.product_id);
            }
            continue;
        };

        if *left < line.quantity {
            return Err(SaleError::InsufficientStock(product.name.clone()));
        }
        if line.quantity == 0 {
            continue;
        }

        *left -= line.quantity;
        *deducted.entry(product.id).or_insert(0) += line.quantity;
        plan.item_count = plan.item_count.checked_add(line.quantity).ok_or(
            SaleError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            },
        )?;
        line_totals.push(product.price.times(line.quantity));
    }

    plan.total = line_totals.into_iter().sum();
    let cap = Money::from_cents(MAX_TOTAL_CENTS);
    if plan.total >= cap {
        return Err(SaleError::TotalTooLarge(cap));
    }
    plan.deductions = deducted
        .into_iter()
        .map(|(product_id, quantity)| StockDeduction {
            product_id,
            quantity,
        })
        .collect();

    Ok(plan)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, name: &str, cents: i64, stock: i32) -> LockedProduct {
        LockedProduct {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Money::from_cents(cents),
            stock,
        }
    }

    fn line(id: i32, quantity: i32) -> CartLine {
        CartLine::new(ProductId::new(id), quantity)
    }

    #[test]
    fn test_single_line_sale() {
        let stock = [product(1, "A", 350, 5), product(2, "B", 100, 0)];
        let plan = plan_sale(&[line(1, 2)], &stock).unwrap();

        assert_eq!(
            plan.deductions,
            vec![StockDeduction {
                product_id: ProductId::new(1),
                quantity: 2
            }]
        );
        assert_eq!(plan.total, Money::from_cents(700));
        assert_eq!(plan.item_count, 2);
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_totals_over_several_products() {
        let stock = [
            product(1, "Notebook", 350, 50),
            product(2, "Energy Drink", 299, 24),
            product(3, "Granola Bar", 150, 100),
        ];
        let plan = plan_sale(&[line(3, 4), line(1, 1), line(2, 2)], &stock).unwrap();

        // 4 × 1.50 + 3.50 + 2 × 2.99
        assert_eq!(plan.total, Money::from_cents(1548));
        assert_eq!(plan.item_count, 7);
        let ids: Vec<i32> = plan.deductions.iter().map(|d| d.product_id.as_i32()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_insufficient_stock_names_product() {
        let stock = [product(1, "A", 100, 1)];
        assert_eq!(
            plan_sale(&[line(1, 2)], &stock),
            Err(SaleError::InsufficientStock("A".to_string()))
        );
    }

    #[test]
    fn test_exact_stock_is_allowed() {
        let stock = [product(1, "USB-C Cable", 1299, 10)];
        let plan = plan_sale(&[line(1, 10)], &stock).unwrap();
        assert_eq!(plan.deductions[0].quantity, 10);
        assert_eq!(plan.total, Money::from_cents(12990));
    }

    #[test]
    fn test_duplicate_lines_share_stock() {
        let stock = [product(1, "A", 100, 3)];
        assert_eq!(
            plan_sale(&[line(1, 2), line(1, 2)], &stock),
            Err(SaleError::InsufficientStock("A".to_string()))
        );

        let plan = plan_sale(&[line(1, 2), line(1, 1)], &stock).unwrap();
        assert_eq!(
            plan.deductions,
            vec![StockDeduction {
                product_id: ProductId::new(1),
                quantity: 3
            }]
        );
        assert_eq!(plan.item_count, 3);
    }

    #[test]
    fn test_unknown_products_are_skipped() {
        let stock = [product(1, "A", 200, 5)];
        let plan = plan_sale(&[line(9, 1), line(1, 1), line(9, 4), line(8, 1)], &stock).unwrap();

        assert_eq!(plan.skipped, vec![ProductId::new(9), ProductId::new(8)]);
        assert_eq!(plan.item_count, 1);
        assert_eq!(plan.total, Money::from_cents(200));
    }

    #[test]
    fn test_all_unknown_yields_empty_plan() {
        let plan = plan_sale(&[line(4, 1)], &[]).unwrap();
        assert!(plan.deductions.is_empty());
        assert_eq!(plan.total, Money::ZERO);
        assert_eq!(plan.item_count, 0);
        assert_eq!(plan.skipped, vec![ProductId::new(4)]);
    }

    #[test]
    fn test_zero_quantity_contributes_nothing() {
        let stock = [product(1, "A", 100, 0), product(2, "B", 250, 1)];
        let plan = plan_sale(&[line(1, 0), line(2, 1)], &stock).unwrap();

        assert_eq!(plan.deductions.len(), 1);
        assert_eq!(plan.total, Money::from_cents(250));
        assert_eq!(plan.item_count, 1);
    }

    #[test]
    fn test_total_beyond_ledger_width_is_refused() {
        let stock = [product(1, "Server Rack", 9_999_999_999, i32::MAX)];

        let plan = plan_sale(&[line(1, 100_000_000)], &stock).unwrap();
        assert_eq!(plan.total, Money::from_cents(9_999_999_999 * 100_000_000));

        let err = plan_sale(&[line(1, 100_000_000), line(1, 1_000_000)], &stock).unwrap_err();
        assert_eq!(err, SaleError::TotalTooLarge(Money::from_cents(MAX_TOTAL_CENTS)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(plan_sale(&[], &[]), Err(SaleError::EmptyCart));
    }

    #[test]
    fn test_negative_quantity_rejected_before_stock_check() {
        let stock = [product(1, "A", 100, 0)];
        assert_eq!(
            plan_sale(&[line(1, 5), line(2, -1)], &stock),
            Err(SaleError::InvalidQuantity {
                product_id: ProductId::new(2),
                quantity: -1
            })
        );
    }
}
