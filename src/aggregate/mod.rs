//! Aggregate module
//!
//! Aggregate roots of the sales domain and their entities.

pub mod catalog;
pub mod discount;
pub mod sale;
pub mod sale_item;

pub use catalog::{Branch, Customer, Product};
pub use sale::Sale;
pub use sale_item::SaleItem;

use crate::domain::ValidationFailure;

/// Aggregate trait that all aggregates must implement
pub trait Aggregate {
    /// Get the aggregate type name (for logs and error messages)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID
    fn id(&self) -> uuid::Uuid;

    /// Structural invariants; an empty list means the aggregate is consistent
    fn validate(&self) -> Vec<ValidationFailure>;

    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
