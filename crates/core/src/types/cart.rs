//! Cart lines submitted by the point-of-sale page.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// One line of a checkout cart.
///
/// The wire name of `product_id` is `id`, matching the POS client's
/// `{items: [{id, quantity}]}` body. The quantity is signed so that a
/// negative value reaches validation instead of failing deserialization
/// with an opaque message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product being sold.
    #[serde(rename = "id")]
    pub product_id: ProductId,
    /// Units requested.
    pub quantity: i32,
}

impl CartLine {
    /// Create a cart line.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_pos_wire_format() {
        let lines: Vec<CartLine> =
            serde_json::from_str(r#"[{"id": 3, "quantity": 2}, {"id": 7, "quantity": 0}]"#)
                .unwrap();
        assert_eq!(
            lines,
            vec![
                CartLine::new(ProductId::new(3), 2),
                CartLine::new(ProductId::new(7), 0)
            ]
        );
    }
}
