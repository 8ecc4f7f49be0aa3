//! SaleItem Entity
//!
//! One priced product line of a sale. The line keeps its own total
//! consistent with quantity, unit price and discount on every mutation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pricing::{self, MAX_ITEM_QUANTITY};
use crate::domain::{DomainError, ValidationFailure, Validator};

/// A line of a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    id: Uuid,
    sale_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    /// Percentage in [0, 100]
    discount: Decimal,
    total_amount: Decimal,
    is_cancelled: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl SaleItem {
    /// Create a new line with its total already computed.
    ///
    /// Values are not checked here; call [`SaleItem::validate`].
    pub fn new(
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        discount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sale_id,
            product_id,
            quantity,
            unit_price,
            discount,
            total_amount: pricing::line_total(quantity, unit_price, discount),
            is_cancelled: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Rebuild a line from its stored row
    #[allow(clippy::too_many_arguments)]
    pub fn from_db_state(
        id: Uuid,
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        discount: Decimal,
        is_cancelled: bool,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            sale_id,
            product_id,
            quantity,
            unit_price,
            discount,
            // Always derived, never trusted from storage
            total_amount: pricing::line_total(quantity, unit_price, discount),
            is_cancelled,
            created_at,
            updated_at,
        }
    }

    /// Replace every mutable field and recompute the total
    pub fn update_item_info(
        &mut self,
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        discount: Decimal,
    ) -> Result<(), DomainError> {
        self.ensure_active("Cannot update a cancelled item")?;

        self.sale_id = sale_id;
        self.product_id = product_id;
        self.quantity = quantity;
        self.unit_price = unit_price;
        self.discount = discount;
        self.touch();
        Ok(())
    }

    /// Set the discount percentage and recompute the total
    pub fn apply_discount(&mut self, percentage: Decimal) -> Result<(), DomainError> {
        if !pricing::is_valid_percentage(percentage) || !pricing::has_storable_scale(percentage) {
            return Err(DomainError::invalid_argument(format!(
                "Discount percentage must be between 0 and 100 with at most {} decimal places (got {})",
                pricing::MAX_SCALE,
                percentage
            )));
        }
        self.ensure_active("Cannot apply a discount to a cancelled item")?;

        self.discount = percentage;
        self.touch();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.ensure_active("Item is already cancelled")?;

        self.is_cancelled = true;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn reactivate(&mut self) -> Result<(), DomainError> {
        if !self.is_cancelled {
            return Err(DomainError::invalid_state("Item is not cancelled"));
        }

        self.is_cancelled = false;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Structural invariants of a line
    pub fn validate(&self) -> Vec<ValidationFailure> {
        Validator::new()
            .id(self.sale_id, "sale_id")
            .id(self.product_id, "product_id")
            .check(
                self.quantity > 0 && self.quantity <= MAX_ITEM_QUANTITY,
                "quantity",
                format!("quantity must be between 1 and {}", MAX_ITEM_QUANTITY),
            )
            .check(
                pricing::is_valid_unit_price(self.unit_price),
                "unit_price",
                format!(
                    "unit_price must be greater than 0 and at most {}",
                    pricing::MAX_UNIT_PRICE
                ),
            )
            .check(
                pricing::has_storable_scale(self.unit_price),
                "unit_price",
                format!("unit_price must have at most {} decimal places", pricing::MAX_SCALE),
            )
            .check(
                pricing::is_valid_percentage(self.discount),
                "discount",
                "discount must be between 0 and 100",
            )
            .check(
                pricing::has_storable_scale(self.discount),
                "discount",
                format!("discount must have at most {} decimal places", pricing::MAX_SCALE),
            )
            .finish()
    }

    fn ensure_active(&self, message: &str) -> Result<(), DomainError> {
        if self.is_cancelled {
            return Err(DomainError::invalid_state(message));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.total_amount = pricing::line_total(self.quantity, self.unit_price, self.discount);
        self.updated_at = Some(Utc::now());
    }

    /// Owning sale takes over the line
    pub(crate) fn attach_to(&mut self, sale_id: Uuid) {
        self.sale_id = sale_id;
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sale_id(&self) -> Uuid {
        self.sale_id
    }

    pub fn product_id(&self) -> Uuid {
        self.product_id
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(quantity: i32, unit_price: Decimal, discount: Decimal) -> SaleItem {
        SaleItem::new(Uuid::new_v4(), Uuid::new_v4(), quantity, unit_price, discount)
    }

    #[test]
    fn test_new_computes_total() {
        let line = item(5, dec!(10), Decimal::ZERO);

        assert_eq!(line.total_amount(), dec!(50));
        assert!(!line.is_cancelled());
        assert!(line.updated_at().is_none());
        assert!(line.validate().is_empty());
    }

    #[test]
    fn test_total_at_boundaries() {
        assert_eq!(item(1, dec!(10000), Decimal::ZERO).total_amount(), dec!(10000));
        assert_eq!(item(20, dec!(10000), Decimal::ZERO).total_amount(), dec!(200000));
        assert_eq!(item(20, dec!(7.5), dec!(100)).total_amount(), Decimal::ZERO);
        assert_eq!(item(1, dec!(0.01), Decimal::ZERO).total_amount(), dec!(0.01));
    }

    #[test]
    fn test_validate_reports_each_field() {
        let line = SaleItem::new(Uuid::nil(), Uuid::new_v4(), 21, dec!(10000.01), dec!(101));
        let fields: Vec<String> = line.validate().into_iter().map(|f| f.field).collect();

        assert_eq!(fields, vec!["sale_id", "quantity", "unit_price", "discount"]);
    }

    #[test]
    fn test_validate_rejects_zero_quantity_and_price() {
        let line = item(0, Decimal::ZERO, Decimal::ZERO);
        let fields: Vec<String> = line.validate().into_iter().map(|f| f.field).collect();

        assert_eq!(fields, vec!["quantity", "unit_price"]);
    }

    #[test]
    fn test_update_item_info_recomputes_total() {
        let mut line = item(2, dec!(10), Decimal::ZERO);
        let sale_id = line.sale_id();
        let product_id = Uuid::new_v4();

        line.update_item_info(sale_id, product_id, 4, dec!(25), dec!(10)).unwrap();

        assert_eq!(line.product_id(), product_id);
        assert_eq!(line.quantity(), 4);
        assert_eq!(line.total_amount(), dec!(90));
        assert!(line.updated_at().is_some());
    }

    #[test]
    fn test_update_cancelled_item_fails() {
        let mut line = item(2, dec!(10), Decimal::ZERO);
        line.cancel().unwrap();

        let result = line.update_item_info(line.sale_id(), line.product_id(), 3, dec!(10), Decimal::ZERO);

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert_eq!(line.quantity(), 2);
    }

    #[test]
    fn test_apply_discount() {
        let mut line = item(10, dec!(20), Decimal::ZERO);

        line.apply_discount(dec!(20)).unwrap();

        assert_eq!(line.discount(), dec!(20));
        assert_eq!(line.total_amount(), dec!(160));
        assert!(line.updated_at().is_some());
    }

    #[test]
    fn test_apply_discount_out_of_range() {
        let mut line = item(10, dec!(20), Decimal::ZERO);

        assert!(matches!(line.apply_discount(dec!(-1)), Err(DomainError::InvalidArgument(_))));
        assert!(matches!(line.apply_discount(dec!(100.01)), Err(DomainError::InvalidArgument(_))));
        assert!(matches!(line.apply_discount(dec!(10.00001)), Err(DomainError::InvalidArgument(_))));
        assert_eq!(line.discount(), Decimal::ZERO);
        assert!(line.updated_at().is_none());
    }

    #[test]
    fn test_apply_discount_to_cancelled_item_fails() {
        let mut line = item(10, dec!(20), Decimal::ZERO);
        line.cancel().unwrap();

        assert!(matches!(line.apply_discount(dec!(10)), Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn test_cancel_and_reactivate() {
        let mut line = item(1, dec!(5), Decimal::ZERO);

        line.cancel().unwrap();
        assert!(line.is_cancelled());
        assert_eq!(line.cancel(), Err(DomainError::invalid_state("Item is already cancelled")));

        line.reactivate().unwrap();
        assert!(!line.is_cancelled());
        assert_eq!(line.reactivate(), Err(DomainError::invalid_state("Item is not cancelled")));
    }
}
