//! Sale Aggregate
//!
//! Sale is the aggregate root of the sales domain. It owns its lines, keeps
//! the sale total equal to the sum of the active lines, and enforces the
//! status state machine:
//!
//! ```text
//!             close()            pay()
//!   Pending ───────────► Closed ───────► Paid
//!     │  ▲                  │              │
//!     │  │ reactivate()     │ cancel()     │ cancel()
//!     │  │                  ▼              ▼
//!     │  └──────────────  Cancelled ◄──────┘
//!     └──── cancel() ─────────▲
//! ```
//!
//! `pay()` is accepted from any status but `Paid`, `cancel()` from any
//! status but `Cancelled`. Line management is only allowed while `Pending`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pricing;
use crate::domain::{DomainError, SaleStatus, ValidationFailure, Validator};

use super::{discount, Aggregate, SaleItem};

/// Maximum length of a sale number
pub const MAX_SALE_NUMBER_LEN: usize = 50;

/// Sale Aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    id: Uuid,
    /// Business identifier, unique across all sales
    sale_number: String,
    sale_date: DateTime<Utc>,
    customer_id: Uuid,
    branch_id: Uuid,
    status: SaleStatus,
    /// Sum of the totals of the non-cancelled lines
    total_amount: Decimal,
    items: Vec<SaleItem>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Create a new pending sale without lines
    pub fn new(
        sale_number: impl Into<String>,
        sale_date: DateTime<Utc>,
        customer_id: Uuid,
        branch_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sale_number: sale_number.into(),
            sale_date,
            customer_id,
            branch_id,
            status: SaleStatus::Pending,
            total_amount: Decimal::ZERO,
            items: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Rebuild a sale and its lines from stored rows
    #[allow(clippy::too_many_arguments)]
    pub fn from_db_state(
        id: Uuid,
        sale_number: String,
        sale_date: DateTime<Utc>,
        customer_id: Uuid,
        branch_id: Uuid,
        status: SaleStatus,
        items: Vec<SaleItem>,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        let mut sale = Self {
            id,
            sale_number,
            sale_date,
            customer_id,
            branch_id,
            status,
            total_amount: Decimal::ZERO,
            items,
            created_at,
            updated_at,
        };
        sale.recalculate_total();
        sale
    }

    // =========================================================================
    // Line management (Pending only)
    // =========================================================================

    /// Append a line; the line is re-attached to this sale
    pub fn add_item(&mut self, mut item: SaleItem) -> Result<(), DomainError> {
        self.ensure_pending("add items to")?;

        item.attach_to(self.id);
        self.items.push(item);
        self.touch();
        Ok(())
    }

    /// Remove a line and hand it back
    pub fn remove_item(&mut self, item_id: Uuid) -> Result<SaleItem, DomainError> {
        self.ensure_pending("remove items from")?;

        let position = self.position_of(item_id)?;
        let item = self.items.remove(position);
        self.touch();
        Ok(item)
    }

    /// Cancel a single line, keeping it in the sale
    pub fn cancel_item(&mut self, item_id: Uuid) -> Result<(), DomainError> {
        self.ensure_pending("cancel items of")?;

        let position = self.position_of(item_id)?;
        self.items[position].cancel()?;
        self.touch();
        Ok(())
    }

    /// Replace the product, quantity, price and discount of an active line
    pub fn update_item(
        &mut self,
        item_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        discount: Decimal,
    ) -> Result<(), DomainError> {
        self.ensure_pending("edit items of")?;

        let position = self.position_of(item_id)?;
        let sale_id = self.id;
        self.items[position].update_item_info(sale_id, product_id, quantity, unit_price, discount)?;
        self.touch();
        Ok(())
    }

    /// Manual discount on every active line
    pub fn apply_discount_to_all_items(&mut self, percentage: Decimal) -> Result<(), DomainError> {
        self.ensure_pending("apply discounts to")?;
        if !pricing::is_valid_percentage(percentage) || !pricing::has_storable_scale(percentage) {
            return Err(DomainError::invalid_argument(format!(
                "Discount percentage must be between 0 and 100 with at most {} decimal places (got {})",
                pricing::MAX_SCALE,
                percentage
            )));
        }

        for item in self.items.iter_mut().filter(|item| !item.is_cancelled()) {
            item.apply_discount(percentage)?;
        }
        self.touch();
        Ok(())
    }

    /// Replace the header fields
    pub fn update_details(
        &mut self,
        sale_number: impl Into<String>,
        sale_date: DateTime<Utc>,
        customer_id: Uuid,
        branch_id: Uuid,
    ) -> Result<(), DomainError> {
        self.ensure_pending("update")?;

        self.sale_number = sale_number.into();
        self.sale_date = sale_date;
        self.customer_id = customer_id;
        self.branch_id = branch_id;
        self.touch();
        Ok(())
    }

    // =========================================================================
    // Status transitions
    // =========================================================================

    /// Close a pending sale, applying the volume discounts first.
    ///
    /// When any product exceeds the per-product limit nothing is changed.
    pub fn close(&mut self) -> Result<(), DomainError> {
        if self.status != SaleStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "Only pending sales can be closed (current status: {})",
                self.status
            )));
        }
        if self.active_items().is_empty() {
            return Err(DomainError::invalid_state("Cannot close a sale without items"));
        }

        let plan = discount::plan(&self.items)?;
        discount::apply(&mut self.items, &plan)?;

        self.status = SaleStatus::Closed;
        self.touch();
        Ok(())
    }

    /// Cancel the sale and every active line
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status == SaleStatus::Cancelled {
            return Err(DomainError::invalid_state("Sale is already cancelled"));
        }

        for item in self.items.iter_mut().filter(|item| !item.is_cancelled()) {
            item.cancel()?;
        }

        self.status = SaleStatus::Cancelled;
        self.touch();
        Ok(())
    }

    pub fn pay(&mut self) -> Result<(), DomainError> {
        if self.status == SaleStatus::Paid {
            return Err(DomainError::invalid_state("Sale is already paid"));
        }

        self.status = SaleStatus::Paid;
        self.touch();
        Ok(())
    }

    /// Bring a cancelled sale back to pending, reactivating every cancelled line
    pub fn reactivate(&mut self) -> Result<(), DomainError> {
        if self.status != SaleStatus::Cancelled {
            return Err(DomainError::invalid_state(format!(
                "Only cancelled sales can be reactivated (current status: {})",
                self.status
            )));
        }

        for item in self.items.iter_mut().filter(|item| item.is_cancelled()) {
            item.reactivate()?;
        }

        self.status = SaleStatus::Pending;
        self.touch();
        Ok(())
    }

    /// Run the transition that leads to `target`.
    ///
    /// `Pending` as a target means reactivation.
    pub fn transition_to(&mut self, target: SaleStatus) -> Result<(), DomainError> {
        match target {
            SaleStatus::Closed => self.close(),
            SaleStatus::Cancelled => self.cancel(),
            SaleStatus::Paid => self.pay(),
            SaleStatus::Pending => self.reactivate(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Units across all active lines
    pub fn total_quantity(&self) -> i32 {
        self.items
            .iter()
            .filter(|item| !item.is_cancelled())
            .map(SaleItem::quantity)
            .sum()
    }

    pub fn active_items(&self) -> Vec<&SaleItem> {
        self.items.iter().filter(|item| !item.is_cancelled()).collect()
    }

    fn ensure_pending(&self, action: &str) -> Result<(), DomainError> {
        if self.status != SaleStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "Cannot {} a sale with status {}",
                action, self.status
            )));
        }
        Ok(())
    }

    fn position_of(&self, item_id: Uuid) -> Result<usize, DomainError> {
        self.items
            .iter()
            .position(|item| item.id() == item_id)
            .ok_or_else(|| {
                DomainError::invalid_argument(format!(
                    "Item {} does not belong to sale {}",
                    item_id, self.id
                ))
            })
    }

    fn recalculate_total(&mut self) {
        self.total_amount = self
            .items
            .iter()
            .filter(|item| !item.is_cancelled())
            .map(SaleItem::total_amount)
            .sum();
    }

    fn touch(&mut self) {
        self.recalculate_total();
        self.updated_at = Some(Utc::now());
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn sale_number(&self) -> &str {
        &self.sale_number
    }

    pub fn sale_date(&self) -> DateTime<Utc> {
        self.sale_date
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn branch_id(&self) -> Uuid {
        self.branch_id
    }

    pub fn status(&self) -> SaleStatus {
        self.status
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Aggregate for Sale {
    fn aggregate_type() -> &'static str {
        "Sale"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Vec<ValidationFailure> {
        let mut validator = Validator::new();
        validator
            .text(&self.sale_number, "sale_number", MAX_SALE_NUMBER_LEN)
            .check(
                self.sale_date <= Utc::now(),
                "sale_date",
                "sale_date must not be in the future",
            )
            .id(self.customer_id, "customer_id")
            .id(self.branch_id, "branch_id")
            .check(
                self.total_amount >= Decimal::ZERO,
                "total_amount",
                "total_amount must not be negative",
            );

        for (index, item) in self.items.iter().enumerate() {
            validator.nested(&format!("items[{}]", index), item.validate());
        }

        validator.finish()
    }
}
