//! Volume Discount Engine
//!
//! Tier discounts computed per product from the total active quantity of
//! that product within a sale:
//!
//! | Units of one product | Discount |
//! |----------------------|----------|
//! | 1 – 3                | 0%       |
//! | 4 – 9                | 10%      |
//! | 10 – 20              | 20%      |
//! | more than 20         | rejected |
//!
//! Planning is pure and checks every product before anything is applied,
//! so a rejected plan leaves the items untouched.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::pricing::MAX_ITEM_QUANTITY;
use crate::domain::DomainError;

use super::SaleItem;

/// Discount percentage for `quantity` units of a single product.
///
/// Quantities above the sale limit are rejected by [`plan`], not here.
pub fn tier_percentage(quantity: i32) -> Decimal {
    match quantity {
        4..=9 => Decimal::TEN,
        10..=20 => Decimal::from(20),
        _ => Decimal::ZERO,
    }
}

/// Discount decided for one product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDiscount {
    pub product_id: Uuid,
    pub total_quantity: i32,
    pub percentage: Decimal,
}

/// Compute the discount of every product with active lines.
///
/// Products appear in the order of their first active line.
pub fn plan(items: &[SaleItem]) -> Result<Vec<ProductDiscount>, DomainError> {
    let mut groups: Vec<(Uuid, i32)> = Vec::new();

    for item in items.iter().filter(|item| !item.is_cancelled()) {
        match groups.iter_mut().find(|(product_id, _)| *product_id == item.product_id()) {
            Some((_, quantity)) => *quantity += item.quantity(),
            None => groups.push((item.product_id(), item.quantity())),
        }
    }

    groups
        .into_iter()
        .map(|(product_id, total_quantity)| {
            if total_quantity > MAX_ITEM_QUANTITY {
                return Err(DomainError::invalid_state(format!(
                    "Cannot sell more than {} identical items. Product {} has {} items.",
                    MAX_ITEM_QUANTITY, product_id, total_quantity
                )));
            }
            Ok(ProductDiscount {
                product_id,
                total_quantity,
                percentage: tier_percentage(total_quantity),
            })
        })
        .collect()
}

/// Apply a plan to the active lines of each product
pub fn apply(items: &mut [SaleItem], plan: &[ProductDiscount]) -> Result<(), DomainError> {
    for discount in plan {
        for item in items
            .iter_mut()
            .filter(|item| !item.is_cancelled() && item.product_id() == discount.product_id)
        {
            item.apply_discount(discount.percentage)?;
        }
    }
    Ok(())
}
