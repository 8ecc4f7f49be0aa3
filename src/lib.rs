//! salesAPI Library
//!
//! Sales, their lines and the catalog they reference, behind an HTTP API.
//! Re-exports modules for integration testing and the server binary.

use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod aggregate;
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod publisher;
pub mod repository;

pub use api::AppState;
pub use config::Config;
pub use domain::{DomainError, OperationContext, SaleStatus};
pub use error::{AppError, AppResult};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Axum layers run in reverse order: context -> logging -> handler
    let api_routes = api::create_router()
        .layer(middleware::from_fn(api::middleware::logging_middleware))
        .layer(middleware::from_fn(api::middleware::context_middleware));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
