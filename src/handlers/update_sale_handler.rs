//! Update Sale Handler
//!
//! Replaces the header and the lines of a pending sale. Incoming lines are
//! reconciled with the existing ones so that line ids survive an edit:
//!
//! 1. each incoming line takes over the first unmatched active line with the
//!    same product;
//! 2. incoming lines without a counterpart are added;
//! 3. active lines nobody took over are removed.
//!
//! Cancelled lines are kept as they are.

use std::collections::HashSet;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::aggregate::{Aggregate, Sale, SaleItem};
use crate::domain::{OperationContext, SaleModifiedEvent};
use crate::error::{AppError, AppResult};
use crate::publisher::publish_best_effort;

use super::{SaleItemInput, SaleServices, UpdateSaleCommand};

/// Handler for editing pending sales
pub struct UpdateSaleHandler {
    services: SaleServices,
}

impl UpdateSaleHandler {
    pub fn new(services: SaleServices) -> Self {
        Self { services }
    }

    pub async fn execute(
        &self,
        command: UpdateSaleCommand,
        context: &OperationContext,
    ) -> AppResult<Sale> {
        AppError::ensure_valid(command.validate())?;

        let mut sale = self.services.load(command.id).await?;

        if sale.sale_number() != command.sale_number
            && self
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

        sale.update_details(
            command.sale_number,
            command.sale_date,
            command.customer_id,
            command.branch_id,
        )?;
        reconcile_items(&mut sale, &command.items)?;
        AppError::ensure_valid(sale.validate())?;

        let sale = self.services.sales.update(sale).await?;
        self.services.commit().await?;

        tracing::info!(
            sale_id = %sale.id(),
            items = sale.items().len(),
            total_amount = %sale.total_amount(),
            correlation_id = ?context.correlation_id,
            request_id = ?context.request_id,
            client_ip = ?context.client_ip,
            "Sale updated"
        );

        publish_best_effort(
            self.services.publisher.as_ref(),
            &SaleModifiedEvent::from_sale(&sale),
        )
        .await;

        Ok(sale)
    }
}

/// Bring the active lines of `sale` in line with `lines`
fn reconcile_items(sale: &mut Sale, lines: &[SaleItemInput]) -> AppResult<()> {
    let sale_id = sale.id();
    let mut matched: HashSet<Uuid> = HashSet::new();
    let mut additions: Vec<&SaleItemInput> = Vec::new();

    for line in lines {
        let existing = sale
            .items()
            .iter()
            .find(|item| {
                !item.is_cancelled()
                    && item.product_id() == line.product_id
                    && !matched.contains(&item.id())
            })
            .map(|item| (item.id(), item.discount()));

        match existing {
            Some((item_id, discount)) => {
                matched.insert(item_id);
                sale.update_item(
                    item_id,
                    line.product_id,
                    line.quantity,
                    line.unit_price,
                    discount,
                )?;
            }
            None => additions.push(line),
        }
    }

    let stale: Vec<Uuid> = sale
        .items()
        .iter()
        .filter(|item| !item.is_cancelled() && !matched.contains(&item.id()))
        .map(SaleItem::id)
        .collect();
    for item_id in stale {
        sale.remove_item(item_id)?;
    }

    for line in additions {
        sale.add_item(SaleItem::new(
            sale_id,
            line.product_id,
            line.quantity,
            line.unit_price,
            Decimal::ZERO,
        ))?;
    }

    Ok(())
}
