//! Catalog endpoints
//!
//! Customers, branches and products. These records have no behavior of
//! their own, so the handlers talk to the pool directly.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::aggregate::{Aggregate, Branch, Customer, Product};
use crate::error::{AppError, AppResult};
use crate::repository::page_offset;

use super::{json_body, parse_id, AppState, PageParams};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BranchRequest {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_count: i64,
}

// =========================================================================
// Router
// =========================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/branches", get(list_branches).post(create_branch))
        .route(
            "/branches/:id",
            get(get_branch).put(update_branch).delete(delete_branch),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

// =========================================================================
// Shared helpers
// =========================================================================

async fn fetch_one<T>(pool: &PgPool, sql: &str, id: Uuid) -> AppResult<T>
where
    T: for<'r> FromRow<'r, PgRow> + Aggregate + Send + Unpin,
{
    sqlx::query_as::<_, T>(sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(T::aggregate_type(), id))
}

async fn fetch_page<T>(
    pool: &PgPool,
    select: &str,
    table: &str,
    params: PageParams,
) -> AppResult<ListResponse<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    AppError::ensure_valid(params.validate())?;

    let data = sqlx::query_as::<_, T>(select)
        .bind(params.size)
        .bind(page_offset(params.page, params.size))
        .fetch_all(pool)
        .await?;

    let total_count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;

    Ok(ListResponse {
        data,
        page: params.page,
        size: params.size,
        total_count,
    })
}

async fn delete_row(pool: &PgPool, table: &str, entity: &'static str, id: Uuid) -> AppResult<StatusCode> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(entity, id));
    }

    tracing::info!(entity, id = %id, "Catalog record deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Customers
// =========================================================================

const SELECT_CUSTOMER: &str =
    "SELECT id, name, email, phone, created_at, updated_at FROM customers WHERE id = $1";

async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let request = json_body(payload)?;
    let customer = Customer::new(request.name, request.email, request.phone);
    AppError::ensure_valid(customer.validate())?;

    sqlx::query(
        r#"
        INSERT INTO customers (id, name, email, phone, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(customer.id)
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(customer.created_at)
    .execute(&state.pool)
    .await?;

    tracing::info!(customer_id = %customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ListResponse<Customer>>> {
    let page = fetch_page(
        &state.pool,
        "SELECT id, name, email, phone, created_at, updated_at FROM customers \
         ORDER BY name, id LIMIT $1 OFFSET $2",
        "customers",
        params,
    )
    .await?;
    Ok(Json(page))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Customer>> {
    let id = parse_id(&id, "id")?;
    Ok(Json(fetch_one(&state.pool, SELECT_CUSTOMER, id).await?))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CustomerRequest>, JsonRejection>,
) -> AppResult<Json<Customer>> {
    let id = parse_id(&id, "id")?;
    let request = json_body(payload)?;

    let mut customer: Customer = fetch_one(&state.pool, SELECT_CUSTOMER, id).await?;
    customer.replace(request.name, request.email, request.phone);
    AppError::ensure_valid(customer.validate())?;

    sqlx::query("UPDATE customers SET name = $2, email = $3, phone = $4, updated_at = $5 WHERE id = $1")
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.updated_at)
        .execute(&state.pool)
        .await?;

    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, "id")?;
    delete_row(&state.pool, "customers", Customer::aggregate_type(), id).await
}

// =========================================================================
// Branches
// =========================================================================

const SELECT_BRANCH: &str =
    "SELECT id, name, address, created_at, updated_at FROM branches WHERE id = $1";

async fn create_branch(
    State(state): State<AppState>,
    payload: Result<Json<BranchRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Branch>)> {
    let request = json_body(payload)?;
    let branch = Branch::new(request.name, request.address);
    AppError::ensure_valid(branch.validate())?;

    sqlx::query("INSERT INTO branches (id, name, address, created_at) VALUES ($1, $2, $3, $4)")
        .bind(branch.id)
        .bind(&branch.name)
        .bind(&branch.address)
        .bind(branch.created_at)
        .execute(&state.pool)
        .await?;

    tracing::info!(branch_id = %branch.id, "Branch created");
    Ok((StatusCode::CREATED, Json(branch)))
}

async fn list_branches(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ListResponse<Branch>>> {
    let page = fetch_page(
        &state.pool,
        "SELECT id, name, address, created_at, updated_at FROM branches \
         ORDER BY name, id LIMIT $1 OFFSET $2",
        "branches",
        params,
    )
    .await?;
    Ok(Json(page))
}

async fn get_branch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Branch>> {
    let id = parse_id(&id, "id")?;
    Ok(Json(fetch_one(&state.pool, SELECT_BRANCH, id).await?))
}

async fn update_branch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BranchRequest>, JsonRejection>,
) -> AppResult<Json<Branch>> {
    let id = parse_id(&id, "id")?;
    let request = json_body(payload)?;

    let mut branch: Branch = fetch_one(&state.pool, SELECT_BRANCH, id).await?;
    branch.replace(request.name, request.address);
    AppError::ensure_valid(branch.validate())?;

    sqlx::query("UPDATE branches SET name = $2, address = $3, updated_at = $4 WHERE id = $1")
        .bind(branch.id)
        .bind(&branch.name)
        .bind(&branch.address)
        .bind(branch.updated_at)
        .execute(&state.pool)
        .await?;

    Ok(Json(branch))
}

async fn delete_branch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, "id")?;
    delete_row(&state.pool, "branches", Branch::aggregate_type(), id).await
}

// =========================================================================
// Products
// =========================================================================

const SELECT_PRODUCT: &str = "SELECT id, title, description, price, category, created_at, updated_at \
     FROM products WHERE id = $1";

async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let request = json_body(payload)?;
    let product = Product::new(
        request.title,
        request.description,
        request.price,
        request.category,
    );
    AppError::ensure_valid(product.validate())?;

    sqlx::query(
        r#"
        INSERT INTO products (id, title, description, price, category, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(product.id)
    .bind(&product.title)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.category)
    .bind(product.created_at)
    .execute(&state.pool)
    .await?;

    tracing::info!(product_id = %product.id, price = %product.price, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ListResponse<Product>>> {
    let page = fetch_page(
        &state.pool,
        "SELECT id, title, description, price, category, created_at, updated_at FROM products \
         ORDER BY title, id LIMIT $1 OFFSET $2",
        "products",
        params,
    )
    .await?;
    Ok(Json(page))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let id = parse_id(&id, "id")?;
    Ok(Json(fetch_one(&state.pool, SELECT_PRODUCT, id).await?))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> AppResult<Json<Product>> {
    let id = parse_id(&id, "id")?;
    let request = json_body(payload)?;

    let mut product: Product = fetch_one(&state.pool, SELECT_PRODUCT, id).await?;
    product.replace(
        request.title,
        request.description,
        request.price,
        request.category,
    );
    AppError::ensure_valid(product.validate())?;

    sqlx::query(
        r#"
        UPDATE products
        SET title = $2, description = $3, price = $4, category = $5, updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(product.id)
    .bind(&product.title)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.category)
    .bind(product.updated_at)
    .execute(&state.pool)
    .await?;

    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, "id")?;
    delete_row(&state.pool, "products", Product::aggregate_type(), id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_request_accepts_string_and_number_prices() {
        let request: ProductRequest = serde_json::from_str(
            r#"{ "title": "Beer", "price": "12.50", "category": "Drinks" }"#,
        )
        .unwrap();
        assert_eq!(request.price, dec!(12.50));
        assert!(request.description.is_none());

        let request: ProductRequest =
            serde_json::from_str(r#"{ "title": "Beer", "price": 3, "category": "Drinks" }"#)
                .unwrap();
        assert_eq!(request.price, dec!(3));
    }

    #[test]
    fn test_list_response_shape() {
        let response = ListResponse {
            data: vec![Branch::new("Downtown".into(), "Main St 1".into())],
            page: 1,
            size: 10,
            total_count: 1,
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["data"][0]["name"], "Downtown");
        assert_eq!(json["total_count"], 1);
    }
}
