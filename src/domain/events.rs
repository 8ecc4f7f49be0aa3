//! Domain Events
//!
//! Integration events published after a sale change has been committed.
//! Events are immutable facts; each one carries the topic it is published on.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, Sale};

use super::SaleStatus;

/// Topic names
pub mod topics {
    pub const SALE_CREATED: &str = "sale.created";
    pub const SALE_MODIFIED: &str = "sale.modified";
    pub const SALE_STATUS_CHANGED: &str = "sale.status.changed";
    pub const SALE_ITEM_CANCELLED: &str = "sale.item.cancelled";
    pub const SALE_DELETED: &str = "sale.deleted";
}

/// An event that knows where it is published
pub trait DomainEvent: Serialize {
    fn topic(&self) -> &'static str;

    /// Id of the sale the event is about
    fn sale_id(&self) -> Uuid;
}

/// A sale moved to another status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleStatusChangedEvent {
    pub sale_id: Uuid,
    pub sale_number: String,
    pub new_status: SaleStatus,
    pub total_amount: Decimal,
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_at: DateTime<Utc>,
}

impl SaleStatusChangedEvent {
    pub fn from_sale(sale: &Sale) -> Self {
        Self {
            sale_id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            new_status: sale.status(),
            total_amount: sale.total_amount(),
            customer_id: sale.customer_id(),
            branch_id: sale.branch_id(),
            updated_at: sale.updated_at(),
            published_at: Utc::now(),
        }
    }
}

impl DomainEvent for SaleStatusChangedEvent {
    fn topic(&self) -> &'static str {
        topics::SALE_STATUS_CHANGED
    }

    fn sale_id(&self) -> Uuid {
        self.sale_id
    }
}

/// A sale was registered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleCreatedEvent {
    pub sale_id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub total_amount: Decimal,
    pub item_count: usize,
    pub published_at: DateTime<Utc>,
}

impl SaleCreatedEvent {
    pub fn from_sale(sale: &Sale) -> Self {
        Self {
            sale_id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            sale_date: sale.sale_date(),
            customer_id: sale.customer_id(),
            branch_id: sale.branch_id(),
            total_amount: sale.total_amount(),
            item_count: sale.items().len(),
            published_at: Utc::now(),
        }
    }
}

impl DomainEvent for SaleCreatedEvent {
    fn topic(&self) -> &'static str {
        topics::SALE_CREATED
    }

    fn sale_id(&self) -> Uuid {
        self.sale_id
    }
}

/// Header or lines of a pending sale were edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleModifiedEvent {
    pub sale_id: Uuid,
    pub sale_number: String,
    pub total_amount: Decimal,
    pub item_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_at: DateTime<Utc>,
}

impl SaleModifiedEvent {
    pub fn from_sale(sale: &Sale) -> Self {
        Self {
            sale_id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            total_amount: sale.total_amount(),
            item_count: sale.items().len(),
            updated_at: sale.updated_at(),
            published_at: Utc::now(),
        }
    }
}

impl DomainEvent for SaleModifiedEvent {
    fn topic(&self) -> &'static str {
        topics::SALE_MODIFIED
    }

    fn sale_id(&self) -> Uuid {
        self.sale_id
    }
}

/// One line of a sale was cancelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItemCancelledEvent {
    pub sale_id: Uuid,
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub sale_total_amount: Decimal,
    pub published_at: DateTime<Utc>,
}

impl SaleItemCancelledEvent {
    /// `None` when the item is not part of the sale
    pub fn from_sale(sale: &Sale, item_id: Uuid) -> Option<Self> {
        let item = sale.items().iter().find(|item| item.id() == item_id)?;
        Some(Self {
            sale_id: sale.id(),
            item_id,
            product_id: item.product_id(),
            sale_total_amount: sale.total_amount(),
            published_at: Utc::now(),
        })
    }
}

impl DomainEvent for SaleItemCancelledEvent {
    fn topic(&self) -> &'static str {
        topics::SALE_ITEM_CANCELLED
    }

    fn sale_id(&self) -> Uuid {
        self.sale_id
    }
}

/// A sale was removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDeletedEvent {
    pub sale_id: Uuid,
    pub sale_number: String,
    pub published_at: DateTime<Utc>,
}

impl SaleDeletedEvent {
    pub fn from_sale(sale: &Sale) -> Self {
        Self {
            sale_id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            published_at: Utc::now(),
        }
    }
}

impl DomainEvent for SaleDeletedEvent {
    fn topic(&self) -> &'static str {
        topics::SALE_DELETED
    }

    fn sale_id(&self) -> Uuid {
        self.sale_id
    }
}
