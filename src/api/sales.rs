//! Sale endpoints

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, Sale, SaleItem};
use crate::domain::{OperationContext, SaleStatus};
use crate::error::AppError;
use crate::handlers::{
    CancelSaleItemCommand, CancelSaleItemHandler, CreateSaleCommand, CreateSaleHandler,
    DeleteSaleCommand, DeleteSaleHandler, ListSalesQuery, SaleItemInput, SalePage, SaleQueries,
    UpdateSaleCommand, UpdateSaleHandler, UpdateSaleStatusCommand, UpdateSaleStatusHandler,
    UpdateSaleStatusResult,
};

use super::{json_body, parse_id, AppState, PageParams};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct SaleRequest {
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    #[serde(default)]
    pub items: Vec<SaleItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SaleItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&SaleItem> for SaleItemResponse {
    fn from(item: &SaleItem) -> Self {
        Self {
            id: item.id(),
            product_id: item.product_id(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            discount: item.discount(),
            total_amount: item.total_amount(),
            is_cancelled: item.is_cancelled(),
            created_at: item.created_at(),
            updated_at: item.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub id: Uuid,
    pub sale_number: String,
    pub sale_date: DateTime<Utc>,
    pub customer_id: Uuid,
    pub branch_id: Uuid,
    pub status: SaleStatus,
    pub total_amount: Decimal,
    pub total_quantity: i32,
    pub items: Vec<SaleItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Sale> for SaleResponse {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id(),
            sale_number: sale.sale_number().to_string(),
            sale_date: sale.sale_date(),
            customer_id: sale.customer_id(),
            branch_id: sale.branch_id(),
            status: sale.status(),
            total_amount: sale.total_amount(),
            total_quantity: sale.total_quantity(),
            items: sale.items().iter().map(SaleItemResponse::from).collect(),
            created_at: sale.created_at(),
            updated_at: sale.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleListResponse {
    pub data: Vec<SaleResponse>,
    pub page: i64,
    pub size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

impl From<SalePage> for SaleListResponse {
    fn from(page: SalePage) -> Self {
        Self {
            total_pages: page.total_pages(),
            data: page.sales.iter().map(SaleResponse::from).collect(),
            page: page.page,
            size: page.size,
            total_count: page.total_count,
        }
    }
}

// =========================================================================
// Router
// =========================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", post(create_sale).get(list_sales))
        .route("/sales/:id", get(get_sale).put(update_sale).delete(delete_sale))
        .route("/sales/:id/status", patch(update_sale_status))
        .route("/sales/:id/items/:item_id/cancel", post(cancel_sale_item))
}

// =========================================================================
// Handlers
// =========================================================================

/// POST /sales
async fn create_sale(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<SaleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    let request = json_body(payload)?;
    let command = CreateSaleCommand {
        sale_number: request.sale_number,
        sale_date: request.sale_date,
        customer_id: request.customer_id,
        branch_id: request.branch_id,
        items: request.items,
    };

    let sale = CreateSaleHandler::new(state.sale_services())
        .execute(command, &context)
        .await?;

    Ok((StatusCode::CREATED, Json(SaleResponse::from(&sale))))
}

/// GET /sales?page=&size=
async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<SaleListResponse>, AppError> {
    let queries = SaleQueries::new(state.sale_services().sales);

    let page = queries
        .list(ListSalesQuery {
            page: params.page,
            size: params.size,
        })
        .await?;

    Ok(Json(SaleListResponse::from(page)))
}

/// GET /sales/:id
async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaleResponse>, AppError> {
    let id = parse_id(&id, "id")?;
    let queries = SaleQueries::new(state.sale_services().sales);

    let sale = queries.get(id).await?;

    Ok(Json(SaleResponse::from(&sale)))
}

/// PUT /sales/:id
async fn update_sale(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<String>,
    payload: Result<Json<SaleRequest>, JsonRejection>,
) -> Result<Json<SaleResponse>, AppError> {
    let id = parse_id(&id, "id")?;
    let request = json_body(payload)?;
    let command = UpdateSaleCommand {
        id,
        sale_number: request.sale_number,
        sale_date: request.sale_date,
        customer_id: request.customer_id,
        branch_id: request.branch_id,
        items: request.items,
    };

    let sale = UpdateSaleHandler::new(state.sale_services())
        .execute(command, &context)
        .await?;

    Ok(Json(SaleResponse::from(&sale)))
}

/// DELETE /sales/:id
async fn delete_sale(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "id")?;

    DeleteSaleHandler::new(state.sale_services())
        .execute(DeleteSaleCommand { id }, &context)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /sales/:id/status
async fn update_sale_status(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<UpdateSaleStatusResult>, AppError> {
    let id = parse_id(&id, "id")?;
    let request = json_body(payload)?;

    let result = UpdateSaleStatusHandler::new(state.sale_services())
        .execute(UpdateSaleStatusCommand::new(id, request.status), &context)
        .await?;

    Ok(Json(result))
}

/// POST /sales/:id/items/:item_id/cancel
async fn cancel_sale_item(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((sale_id, item_id)): Path<(String, String)>,
) -> Result<Json<SaleResponse>, AppError> {
    let sale_id = parse_id(&sale_id, "sale_id")?;
    let item_id = parse_id(&item_id, "item_id")?;

    let sale = CancelSaleItemHandler::new(state.sale_services())
        .execute(CancelSaleItemCommand { sale_id, item_id }, &context)
        .await?;

    Ok(Json(SaleResponse::from(&sale)))
}
