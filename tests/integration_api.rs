//! API Integration Tests
//!
//! The first group runs against a lazily connected pool: every request is
//! rejected before the database is touched. The end-to-end tests need a
//! PostgreSQL instance behind `DATABASE_URL` and are ignored by default.

use axum::{body::to_bytes, http::StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

mod common;

use common::{body_json, empty_request, json_request};

fn sale_payload(sale_number: &str, customer_id: Value, branch_id: Value, items: Value) -> Value {
    json!({
        "sale_number": sale_number,
        "sale_date": "2024-03-01T10:00:00Z",
        "customer_id": customer_id,
        "branch_id": branch_id,
        "items": items,
    })
}

// =========================================================================
// Pre-domain rejections
// =========================================================================

#[tokio::test]
async fn test_health_check() {
    let response = common::lazy_app()
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_update_status_rejects_unknown_status() {
    let uri = format!("/api/v1/sales/{}/status", Uuid::new_v4());
    let response = common::lazy_app()
        .oneshot(json_request("PATCH", &uri, json!({ "status": "Shipped" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "validation_failed");
    assert_eq!(body["errors"][0]["field"], "status");
    assert_eq!(
        body["errors"][0]["message"],
        "status must be one of Pending, Closed, Paid, Cancelled"
    );
}

#[tokio::test]
async fn test_update_status_rejects_nil_id() {
    let uri = format!("/api/v1/sales/{}/status", Uuid::nil());
    let response = common::lazy_app()
        .oneshot(json_request("PATCH", &uri, json!({ "status": "Closed" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["field"], "id");
}

#[tokio::test]
async fn test_malformed_sale_id() {
    let response = common::lazy_app()
        .oneshot(empty_request("GET", "/api/v1/sales/not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "validation_failed");
    assert_eq!(body["errors"][0]["message"], "id must be a valid UUID");
}

#[tokio::test]
async fn test_invalid_json_body() {
    let uri = format!("/api/v1/sales/{}/status", Uuid::new_v4());
    let request = axum::http::Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{ not json"))
        .unwrap();

    let response = common::lazy_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn test_create_sale_rejects_invalid_payload() {
    let payload = sale_payload(
        "",
        json!(Uuid::new_v4()),
        json!(Uuid::new_v4()),
        json!([{ "product_id": Uuid::new_v4(), "quantity": 21, "unit_price": "10.00" }]),
    );

    let response = common::lazy_app()
        .oneshot(json_request("POST", "/api/v1/sales", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["sale_number", "items[0].quantity"]);
}

#[tokio::test]
async fn test_create_sale_requires_items() {
    let payload = sale_payload("S-1", json!(Uuid::new_v4()), json!(Uuid::new_v4()), json!([]));

    let response = common::lazy_app()
        .oneshot(json_request("POST", "/api/v1/sales", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["field"], "items");
}

#[tokio::test]
async fn test_list_rejects_page_size() {
    for uri in ["/api/v1/sales?size=0", "/api/v1/products?page=0"] {
        let response = common::lazy_app()
            .oneshot(empty_request("GET", uri))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn test_create_product_rejects_price() {
    let response = common::lazy_app()
        .oneshot(json_request(
            "POST",
            "/api/v1/products",
            json!({ "title": "Beer", "price": "0", "category": "Drinks" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["field"], "price");
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let correlation_id = Uuid::new_v4();
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/v1/sales/not-a-uuid")
        .header("X-Correlation-Id", correlation_id.to_string())
        .body(axum::body::Body::empty())
        .unwrap();

    let response = common::lazy_app().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-correlation-id").unwrap(),
        correlation_id.to_string().as_str()
    );
    assert!(response.headers().get("x-request-id").is_some());
}

// =========================================================================
// End-to-end (database required)
// =========================================================================

async fn create(app: &axum::Router, uri: &str, payload: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", uri, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED, "POST {} failed", uri);
    body_json(response).await
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_sale_lifecycle_e2e() {
    let pool = common::setup_test_db().await;
    let app = common::app_with_pool(pool);

    let customer = create(
        &app,
        "/api/v1/customers",
        json!({ "name": "Ada", "email": "ada@example.com" }),
    )
    .await;
    let branch = create(
        &app,
        "/api/v1/branches",
        json!({ "name": "Downtown", "address": "Main St 1" }),
    )
    .await;
    let product = create(
        &app,
        "/api/v1/products",
        json!({ "title": "Beer", "price": "10.00", "category": "Drinks" }),
    )
    .await;

    // 1. Create a pending sale of 5 x $10
    let sale = create(
        &app,
        "/api/v1/sales",
        sale_payload(
            "S-0001",
            customer["id"].clone(),
            branch["id"].clone(),
            json!([{ "product_id": product["id"], "quantity": 5, "unit_price": "10.00" }]),
        ),
    )
    .await;
    assert_eq!(sale["status"], "Pending");
    let sale_id = sale["id"].as_str().unwrap().to_string();

    // 2. Same number again
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/sales",
            sale_payload(
                "S-0001",
                customer["id"].clone(),
                branch["id"].clone(),
                json!([{ "product_id": product["id"], "quantity": 1, "unit_price": "10.00" }]),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // 3. Close: 10% tier
    let status_uri = format!("/api/v1/sales/{}/status", sale_id);
    let response = app
        .clone()
        .oneshot(json_request("PATCH", &status_uri, json!({ "status": "Closed" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["previous_status"], "Pending");
    assert_eq!(result["status"], "Closed");

    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("/api/v1/sales/{}", sale_id)))
        .await
        .unwrap();
    let stored = body_json(response).await;
    let total: rust_decimal::Decimal = stored["total_amount"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, rust_decimal::Decimal::from(45));

    // 4. Pay twice
    let response = app
        .clone()
        .oneshot(json_request("PATCH", &status_uri, json!({ "status": "Paid" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("PATCH", &status_uri, json!({ "status": "Paid" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["details"], "Sale is already paid");

    // 5. Delete
    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/v1/sales/{}", sale_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("/api/v1/sales/{}", sale_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
