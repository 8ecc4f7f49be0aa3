//! API module
//!
//! HTTP API endpoints and middleware.

pub mod catalog;
pub mod middleware;
pub mod sales;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::ValidationFailure;
use crate::error::{AppError, AppResult};
use crate::handlers::{ListSalesQuery, SaleServices};
use crate::publisher::EventPublisher;
use crate::repository::{PgSaleRepository, PgSession};

/// Shared state of every request
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub publisher: Arc<dyn EventPublisher>,
}

impl AppState {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { pool, publisher }
    }

    /// Handlers' collaborators bound to a fresh per-request session
    pub fn sale_services(&self) -> SaleServices {
        let session = PgSession::new(self.pool.clone());
        SaleServices::new(
            Arc::new(PgSaleRepository::new(session.clone())),
            Arc::new(session),
            self.publisher.clone(),
        )
    }
}

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(sales::routes())
        .merge(catalog::routes())
}

/// Parse a path identifier, reporting a field failure instead of a bare 400
pub(crate) fn parse_id(raw: &str, field: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        AppError::Validation(vec![ValidationFailure::new(
            field,
            format!("{} must be a valid UUID", field),
        )])
    })
}

/// Unwrap a JSON body, turning extractor rejections into `invalid_request`
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

/// `?page=&size=` of listing endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

impl PageParams {
    /// Same bounds as sale listings
    pub fn validate(&self) -> Vec<ValidationFailure> {
        ListSalesQuery {
            page: self.page,
            size: self.size,
        }
        .validate()
    }
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}
