//! Sale queries
//!
//! Read-only access to sales. Nothing is committed and no row is locked.

use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::{Aggregate, Sale};
use crate::error::{AppError, AppResult};
use crate::domain::Validator;
use crate::repository::SaleRepository;

use super::{ListSalesQuery, SalePage};

pub struct SaleQueries {
    sales: Arc<dyn SaleRepository>,
}

impl SaleQueries {
    pub fn new(sales: Arc<dyn SaleRepository>) -> Self {
        Self { sales }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Sale> {
        AppError::ensure_valid(Validator::new().id(id, "id").finish())?;

        self.sales
            .find_by_id_with_items(id)
            .await?
            .ok_or_else(|| AppError::not_found(Sale::aggregate_type(), id))
    }

    pub async fn list(&self, query: ListSalesQuery) -> AppResult<SalePage> {
        AppError::ensure_valid(query.validate())?;

        let (sales, total_count) = self.sales.list(query.page, query.size).await?;

        Ok(SalePage {
            sales,
            page: query.page,
            size: query.size,
            total_count,
        })
    }
}
