//! Delete Sale Handler

use crate::aggregate::{Aggregate, Sale};
use crate::domain::{OperationContext, SaleDeletedEvent};
use crate::error::{AppError, AppResult};
use crate::publisher::publish_best_effort;

use super::{DeleteSaleCommand, SaleServices};

/// Handler removing a sale and its lines
pub struct DeleteSaleHandler {
    services: SaleServices,
}

impl DeleteSaleHandler {
    pub fn new(services: SaleServices) -> Self {
        Self { services }
    }

    pub async fn execute(
        &self,
        command: DeleteSaleCommand,
        context: &OperationContext,
    ) -> AppResult<()> {
        AppError::ensure_valid(command.validate())?;

        let sale = self.services.load(command.id).await?;
        if !self.services.sales.delete(command.id).await? {
            return Err(AppError::not_found(Sale::aggregate_type(), command.id));
        }
        self.services.commit().await?;

        tracing::info!(
            sale_id = %command.id,
            sale_number = %sale.sale_number(),
            correlation_id = ?context.correlation_id,
            request_id = ?context.request_id,
            client_ip = ?context.client_ip,
            "Sale deleted"
        );

        publish_best_effort(
            self.services.publisher.as_ref(),
            &SaleDeletedEvent::from_sale(&sale),
        )
        .await;

        Ok(())
    }
}
