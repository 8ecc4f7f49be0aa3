//! Command definitions
//!
//! Commands represent intentions to change the system state. Each command
//! validates its own fields before a handler touches the repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::sale::MAX_SALE_NUMBER_LEN;
use crate::aggregate::Sale;
use crate::domain::pricing::{self, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE};
use crate::domain::{SaleStatus, ValidationFailure, Validator};

/// Largest page a listing may request
pub const MAX_PAGE_SIZE: i64 = 100;

// =========================================================================
// Sale lines
// =========================================================================

/// One line of a create or update command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl SaleItemInput {
    pub fn new(product_id: Uuid, quantity: i32, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    pub fn validate(&self) -> Vec<ValidationFailure> {
        Validator::new()
            .id(self.product_id, "product_id")
            .check(
                self.quantity > 0 && self.quantity <= MAX_ITEM_QUANTITY,
                "quantity",
                format!("quantity must be between 1 and {}", MAX_ITEM_QUANTITY),
            )
            .check(
                pricing::is_valid_unit_price(self.unit_price),
                "unit_price",
                format!("unit_price must be greater than 0 and at most {}", MAX_UNIT_PRICE),
            )
            .check(
                pricing::has_storable_scale(self.unit_price),
                "unit_price",
                format!("unit_price must have at most {} decimal places", pricing::MAX_SCALE),
            )
            .finish()
    }
}

/// Header fields shared by create and update
fn validate_header(
    validator: &mut Validator,
    sale_number: &str,
    sale_date: DateTime<Utc>,
    customer_id: Uuid,
    branch_id: Uuid,
    items: &[SaleItemInput],
) {
    validator
        .text(sale_number, "sale_number", MAX_SALE_NUMBER_LEN)
        .check(
            sale_date <= Utc::now(),
            "sale_date",
            "sale_date must not be in the future",
        )
        .id(customer_id, "customer_id")
        .id(branch_id, "branch_id")
        .check(!items.is_empty(), "items", "items must contain at least one item");

    for (index, item) in items.iter().enumerate() {
        validator.nested(&format!("items[{}]", index), item.validate());
    }
}

// =========================================================================
// CreateSaleCommand
// =========================================================================

/// Command to register a new pending sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleCommand {
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub items: Vec<SaleItemInput>,
}

impl CreateSaleCommand {
    pub fn validate(&self) -> Vec<ValidationFailure> {
        let mut validator = Validator::new();
        validate_header(
            &mut validator,
            &self.sale_number,
            self.sale_date,
            self.customer_id,
            self.branch_id,
            &self.items,
        );
        validator.finish()
    }
}

// =========================================================================
// UpdateSaleCommand
// =========================================================================

/// Command to replace the header and lines of a pending sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSaleCommand {
    pub id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub items: Vec<SaleItemInput>,
}

impl UpdateSaleCommand {
    pub fn validate(&self) -> Vec<ValidationFailure> {
        let mut validator = Validator::new();
        validator.id(self.id, "id");
        validate_header(
            &mut validator,
            &self.sale_number,
            self.sale_date,
            self.customer_id,
            self.branch_id,
            &self.items,
        );
        validator.finish()
    }
}

// =========================================================================
// UpdateSaleStatusCommand
// =========================================================================

/// Command to move a sale to another status.
///
/// The target arrives as text so that an unknown status is reported as a
/// field failure together with the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSaleStatusCommand {
    pub id: Uuid,
    pub status: String,
}

impl UpdateSaleStatusCommand {
    pub fn new(id: Uuid, status: impl Into<String>) -> Self {
        Self {
            id,
            status: status.into(),
        }
    }

    /// Parsed target status, if valid
    pub fn target(&self) -> Option<SaleStatus> {
        self.status.parse().ok()
    }

    pub fn validate(&self) -> Vec<ValidationFailure> {
        let allowed: Vec<&str> = SaleStatus::ALL.iter().map(SaleStatus::as_str).collect();
        Validator::new()
            .id(self.id, "id")
            .check(
                self.target().is_some(),
                "status",
                format!("status must be one of {}", allowed.join(", ")),
            )
            .finish()
    }
}

// =========================================================================
// CancelSaleItemCommand / DeleteSaleCommand
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSaleItemCommand {
    pub sale_id: Uuid,
    pub item_id: Uuid,
}

impl CancelSaleItemCommand {
    pub fn validate(&self) -> Vec<ValidationFailure> {
        Validator::new()
            .id(self.sale_id, "sale_id")
            .id(self.item_id, "item_id")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSaleCommand {
    pub id: Uuid,
}

impl DeleteSaleCommand {
    pub fn validate(&self) -> Vec<ValidationFailure> {
        Validator::new().id(self.id, "id").finish()
    }
}

// =========================================================================
// Queries
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSalesQuery {
    pub page: i64,
    pub size: i64,
}

impl Default for ListSalesQuery {
    fn default() -> Self {
        Self { page: 1, size: 10 }
    }
}

impl ListSalesQuery {
    pub fn validate(&self) -> Vec<ValidationFailure> {
        Validator::new()
            .check(self.page >= 1, "page", "page must be at least 1")
            .check(
                (1..=MAX_PAGE_SIZE).contains(&self.size),
                "size",
                format!("size must be between 1 and {}", MAX_PAGE_SIZE),
            )
            .finish()
    }
}

// =========================================================================
// Results
// =========================================================================

/// Result of a successful status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSaleStatusResult {
    pub id: Uuid,
    pub sale_number: String,
    pub previous_status: SaleStatus,
    pub status: SaleStatus,
    pub total_amount: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of sales
#[derive(Debug, Clone)]
pub struct SalePage {
    pub sales: Vec<Sale>,
    pub page: i64,
    pub size: i64,
    pub total_count: i64,
}

impl SalePage {
    pub fn total_pages(&self) -> i64 {
        if self.size <= 0 {
            return 0;
        }
        (self.total_count + self.size - 1) / self.size
    }
}
