//! Create Sale Handler

use rust_decimal::Decimal;

use crate::aggregate::{Aggregate, Sale, SaleItem};
use crate::domain::{OperationContext, SaleCreatedEvent};
use crate::error::{AppError, AppResult};
use crate::publisher::publish_best_effort;

use super::{CreateSaleCommand, SaleServices};

/// Handler for registering new sales
pub struct CreateSaleHandler {
    services: SaleServices,
}

impl CreateSaleHandler {
    pub fn new(services: SaleServices) -> Self {
        Self { services }
    }

    pub async fn execute(
        &self,
        command: CreateSaleCommand,
        context: &OperationContext,
    ) -> AppResult<Sale> {
        AppError::ensure_valid(command.validate())?;

        if self
            .services
            .sales
            .exists_by_sale_number(&command.sale_number)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Sale number {} already exists",
                command.sale_number
            )));
        }

        let mut sale = Sale::new(
            command.sale_number,
            command.sale_date,
            command.customer_id,
            command.branch_id,
        );
        let sale_id = sale.id();
        for line in command.items {
            sale.add_item(SaleItem::new(
                sale_id,
                line.product_id,
                line.quantity,
                line.unit_price,
                Decimal::ZERO,
            ))?;
        }
        AppError::ensure_valid(sale.validate())?;

        let sale = self.services.sales.create(sale).await?;
        self.services.commit().await?;

        tracing::info!(
            sale_id = %sale.id(),
            sale_number = %sale.sale_number(),
            items = sale.items().len(),
            total_amount = %sale.total_amount(),
            correlation_id = ?context.correlation_id,
            request_id = ?context.request_id,
            client_ip = ?context.client_ip,
            "Sale created"
        );

        publish_best_effort(
            self.services.publisher.as_ref(),
            &SaleCreatedEvent::from_sale(&sale),
        )
        .await;

        Ok(sale)
    }
}
