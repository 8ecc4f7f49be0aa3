//! Pricing rules
//!
//! Bounds and arithmetic shared by sale lines and catalog prices.
//! Everything is `Decimal`; binary floating point never touches money.

use rust_decimal::Decimal;

/// Maximum units of one line (and of one product across a sale)
pub const MAX_ITEM_QUANTITY: i32 = 20;

/// Maximum unit price of a line or a catalog product
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Decimal places kept by the price and discount columns
pub const MAX_SCALE: u32 = 4;

/// Line total: `quantity * unit_price * (1 - discount / 100)`
pub fn line_total(quantity: i32, unit_price: Decimal, discount: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price * (Decimal::ONE - discount / Decimal::ONE_HUNDRED)
}

/// True when `percentage` lies in the closed range [0, 100]
pub fn is_valid_percentage(percentage: Decimal) -> bool {
    percentage >= Decimal::ZERO && percentage <= Decimal::ONE_HUNDRED
}

/// True when `value` fits [`MAX_SCALE`] decimal places; trailing zeros don't count
pub fn has_storable_scale(value: Decimal) -> bool {
    value.normalize().scale() <= MAX_SCALE
}

/// True when `price` lies in (0, MAX_UNIT_PRICE]
pub fn is_valid_unit_price(price: Decimal) -> bool {
    price > Decimal::ZERO && price <= MAX_UNIT_PRICE
}
