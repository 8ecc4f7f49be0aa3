//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use sales_api::publisher::TracingEventPublisher;
use sales_api::{build_router, db, AppState};

/// Router over a pool that never connects until a query runs
pub fn lazy_app() -> Router {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy("postgres://localhost/sales_test")
        .expect("Failed to build lazy pool");
    app_with_pool(pool)
}

pub fn app_with_pool(pool: PgPool) -> Router {
    build_router(AppState::new(pool, Arc::new(TracingEventPublisher::new())))
}

/// Setup test database - migrate and truncate tables
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::run_migrations(&pool).await.expect("Failed to run migrations");

    sqlx::query("TRUNCATE TABLE sale_items, sales, products, branches, customers CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
