//! Cancel Sale Item Handler

use crate::aggregate::{Aggregate, Sale};
use crate::domain::{OperationContext, SaleItemCancelledEvent};
use crate::error::{AppError, AppResult};
use crate::publisher::publish_best_effort;

use super::{CancelSaleItemCommand, SaleServices};

/// Handler cancelling a single line of a pending sale
pub struct CancelSaleItemHandler {
    services: SaleServices,
}

impl CancelSaleItemHandler {
    pub fn new(services: SaleServices) -> Self {
        Self { services }
    }

    pub async fn execute(
        &self,
        command: CancelSaleItemCommand,
        context: &OperationContext,
    ) -> AppResult<Sale> {
        AppError::ensure_valid(command.validate())?;

        let mut sale = self.services.load(command.sale_id).await?;
        sale.cancel_item(command.item_id)?;

        let sale = self.services.sales.update(sale).await?;
        self.services.commit().await?;

        tracing::info!(
            sale_id = %sale.id(),
            item_id = %command.item_id,
            total_amount = %sale.total_amount(),
            correlation_id = ?context.correlation_id,
            request_id = ?context.request_id,
            client_ip = ?context.client_ip,
            "Sale item cancelled"
        );

        if let Some(event) = SaleItemCancelledEvent::from_sale(&sale, command.item_id) {
            publish_best_effort(self.services.publisher.as_ref(), &event).await;
        }

        Ok(sale)
    }
}
