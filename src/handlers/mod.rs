//! Command Handlers module
//!
//! Handlers orchestrate one use case each: validate the command, load the
//! Sale aggregate, run the domain operation, persist, commit the unit of
//! work, then publish an event on a best-effort basis.

mod cancel_sale_item_handler;
mod commands;
mod create_sale_handler;
mod delete_sale_handler;
mod sale_queries;
mod update_sale_handler;
mod update_sale_status_handler;


pub use cancel_sale_item_handler::CancelSaleItemHandler;
pub use commands::*;
pub use create_sale_handler::CreateSaleHandler;
pub use delete_sale_handler::DeleteSaleHandler;
pub use sale_queries::SaleQueries;
pub use update_sale_handler::UpdateSaleHandler;
pub use update_sale_status_handler::UpdateSaleStatusHandler;

use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::{Aggregate, Sale};
use crate::error::{AppError, AppResult};
use crate::publisher::EventPublisher;
use crate::repository::{SaleRepository, UnitOfWork};

/// Collaborators shared by the sale handlers of one request
#[derive(Clone)]
pub struct SaleServices {
    pub sales: Arc<dyn SaleRepository>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl SaleServices {
    pub fn new(
        sales: Arc<dyn SaleRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            sales,
            unit_of_work,
            publisher,
        }
    }

    /// Load a sale with its lines or fail with `NotFound`
    pub(crate) async fn load(&self, id: Uuid) -> AppResult<Sale> {
        self.sales
            .get_by_id_with_items(id)
            .await?
            .ok_or_else(|| AppError::not_found(Sale::aggregate_type(), id))
    }

    /// Commit the unit of work; anything but a confirmed commit is fatal
    pub(crate) async fn commit(&self) -> AppResult<()> {
        match self.unit_of_work.commit().await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::error!("Unit of work reported nothing committed");
                Err(AppError::CommitFailed)
            }
            Err(e) => {
                tracing::error!(error = %e, "Commit failed");
                Err(AppError::CommitFailed)
            }
        }
    }
}
