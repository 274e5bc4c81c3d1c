//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use crate::services::LOW_STOCK_THRESHOLD;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// CSS modifier for a stock badge: `out`, `low` or `ok`.
///
/// Usage in templates: `<span class="badge badge-{{ product.stock|stock_level }}">`
#[askama::filter_fn]
pub fn stock_level(stock: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(stock_level_for(&stock.to_string()))
}

/// Quantity with a unit noun, e.g. `1 unit`, `12 units`.
///
/// Usage in templates: `{{ summary.total_stock_units|units }}`
#[askama::filter_fn]
pub fn units(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let count = count.to_string();
    let noun = if count == "1" { "unit" } else { "units" };
    Ok(format!("{count} {noun}"))
}

fn stock_level_for(stock: &str) -> &'static str {
    match stock.parse::<i64>() {
        Ok(n) if n <= 0 => "out",
        Ok(n) if n < i64::from(LOW_STOCK_THRESHOLD) => "low",
        _ => "ok",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_level_boundaries() {
        assert_eq!(stock_level_for("0"), "out");
        assert_eq!(stock_level_for("1"), "low");
        assert_eq!(stock_level_for("9"), "low");
        assert_eq!(stock_level_for("10"), "ok");
        assert_eq!(stock_level_for("not a number"), "ok");
    }
}
