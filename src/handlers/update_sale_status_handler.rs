//! Sale Status Handler
//!
//! Moves a sale to another status: Closed, Cancelled, Paid, or Pending
//! (reactivation). Closing runs the volume discount engine inside the
//! aggregate before the status changes.

use crate::aggregate::{Aggregate, Sale};
use crate::domain::{OperationContext, SaleStatusChangedEvent};
use crate::error::{AppError, AppResult};
use crate::publisher::publish_best_effort;

use super::{SaleServices, UpdateSaleStatusCommand, UpdateSaleStatusResult};

/// Handler for sale status transitions
pub struct UpdateSaleStatusHandler {
    services: SaleServices,
}

impl UpdateSaleStatusHandler {
    pub fn new(services: SaleServices) -> Self {
        Self { services }
    }

    /// Execute the status change.
    ///
    /// Nothing is persisted when validation or the transition fails. Once the
    /// commit succeeded the call succeeds, whatever happens to the event.
    pub async fn execute(
        &self,
        command: UpdateSaleStatusCommand,
        context: &OperationContext,
    ) -> AppResult<UpdateSaleStatusResult> {
        AppError::ensure_valid(command.validate())?;
        let Some(target) = command.target() else {
            return Err(AppError::InvalidRequest(format!(
                "Unknown sale status: {}",
                command.status
            )));
        };

        let mut sale: Sale = self.services.load(command.id).await?;
        let previous_status = sale.status();

        if let Err(e) = sale.transition_to(target) {
            tracing::info!(
                sale_id = %command.id,
                from = %previous_status,
                to = %target,
                reason = %e,
                correlation_id = ?context.correlation_id,
                request_id = ?context.request_id,
                client_ip = ?context.client_ip,
                "Sale status change rejected"
            );
            return Err(e.into());
        }

        let sale = self.services.sales.update(sale).await?;
        self.services.commit().await?;

        tracing::info!(
            sale_id = %sale.id(),
            from = %previous_status,
            to = %sale.status(),
            total_amount = %sale.total_amount(),
            correlation_id = ?context.correlation_id,
            request_id = ?context.request_id,
            client_ip = ?context.client_ip,
            "Sale status changed"
        );

        publish_best_effort(
            self.services.publisher.as_ref(),
            &SaleStatusChangedEvent::from_sale(&sale),
        )
        .await;

        Ok(UpdateSaleStatusResult {
            id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            previous_status,
            status: sale.status(),
            total_amount: sale.total_amount(),
            updated_at: sale.updated_at(),
        })
    }
}
