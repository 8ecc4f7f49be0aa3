//! Repository module
//!
//! Persistence contracts for the Sale aggregate and their PostgreSQL
//! implementation. A request works inside one [`PgSession`]: the repository
//! writes through the session's transaction and the unit of work commits it.

mod error;
mod postgres;

#[cfg(test)]
pub(crate) mod memory;

pub use error::RepositoryError;
pub use postgres::{PgSaleRepository, PgSession};

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::Sale;

/// Storage of sales together with their lines
#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// Insert a new sale and its lines
    async fn create(&self, sale: Sale) -> Result<Sale, RepositoryError>;

    /// Load a sale with every line, in line order, locking it for the
    /// rest of the session
    async fn get_by_id_with_items(&self, id: Uuid) -> Result<Option<Sale>, RepositoryError>;

    /// Same as [`SaleRepository::get_by_id_with_items`] without taking locks
    async fn find_by_id_with_items(&self, id: Uuid) -> Result<Option<Sale>, RepositoryError>;

    /// Store the sale header and synchronize its lines
    async fn update(&self, sale: Sale) -> Result<Sale, RepositoryError>;

    /// Remove a sale and its lines; false when it did not exist
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    async fn exists_by_sale_number(&self, sale_number: &str) -> Result<bool, RepositoryError>;

    /// One page of sales, newest sale date first, plus the total count
    async fn list(&self, page: i64, size: i64) -> Result<(Vec<Sale>, i64), RepositoryError>;
}

/// Transactional boundary of one request
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Make every write of the request durable.
    ///
    /// `Ok(false)` means nothing was committed.
    async fn commit(&self) -> Result<bool, RepositoryError>;
}

/// Offset of the first row of `page` (1-based)
pub fn page_offset(page: i64, size: i64) -> i64 {
    (page.max(1) - 1) * size
}
