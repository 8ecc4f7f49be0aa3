//! Domain module
//!
//! Core domain types and business rules shared by the aggregates.

pub mod context;
pub mod error;
pub mod events;
pub mod pricing;
pub mod status;
pub mod validation;

pub use context::OperationContext;
pub use error::DomainError;
pub use events::{
    DomainEvent, SaleCreatedEvent, SaleDeletedEvent, SaleItemCancelledEvent, SaleModifiedEvent,
    SaleStatusChangedEvent,
};
pub use status::{SaleStatus, UnknownStatus};
pub use validation::{ValidationFailure, Validator};
