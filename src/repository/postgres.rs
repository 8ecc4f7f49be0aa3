//! PostgreSQL repository
//!
//! ```text
//!   request ──► PgSession (pool + lazily opened transaction)
//!                 │                      │
//!                 ▼                      ▼
//!         PgSaleRepository          UnitOfWork::commit()
//!      (SELECT … FOR UPDATE,        (COMMIT, session closed)
//!       INSERT / UPSERT / DELETE)
//! ```
//!
//! The transaction is opened by the first repository call, so requests that
//! fail validation never touch the database. Dropping the session without
//! committing rolls the transaction back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::aggregate::{Aggregate, Sale, SaleItem};
use crate::domain::SaleStatus;

use super::{page_offset, RepositoryError, SaleRepository, UnitOfWork};

// =========================================================================
// PgSession
// =========================================================================

enum TxState {
    Idle,
    Open(Transaction<'static, Postgres>),
    Finished,
}

impl TxState {
    fn transaction(&mut self) -> Result<&mut Transaction<'static, Postgres>, RepositoryError> {
        match self {
            TxState::Open(tx) => Ok(tx),
            _ => Err(RepositoryError::TransactionClosed),
        }
    }
}

/// Per-request transaction shared by the repository and the unit of work
#[derive(Clone)]
pub struct PgSession {
    pool: PgPool,
    state: Arc<Mutex<TxState>>,
}

impl PgSession {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            state: Arc::new(Mutex::new(TxState::Idle)),
        }
    }

    /// Lock the session, opening the transaction on first use
    async fn begin(&self) -> Result<MutexGuard<'_, TxState>, RepositoryError> {
        let mut state = self.state.lock().await;
        if matches!(*state, TxState::Finished) {
            return Err(RepositoryError::TransactionClosed);
        }
        if matches!(*state, TxState::Idle) {
            *state = TxState::Open(self.pool.begin().await?);
            tracing::trace!("Transaction opened");
        }
        Ok(state)
    }
}

#[async_trait]
impl UnitOfWork for PgSession {
    async fn commit(&self) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, TxState::Finished) {
            TxState::Open(tx) => {
                tx.commit().await?;
                tracing::trace!("Transaction committed");
                Ok(true)
            }
            // Nothing was written
            TxState::Idle => Ok(true),
            TxState::Finished => Ok(false),
        }
    }
}

// =========================================================================
// Rows
// =========================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: Uuid,
    sale_number: String,
    sale_date: DateTime<Utc>,
    customer_id: Uuid,
    branch_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    id: Uuid,
    sale_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    discount: Decimal,
    is_cancelled: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl SaleItemRow {
    fn into_item(self) -> SaleItem {
        SaleItem::from_db_state(
            self.id,
            self.sale_id,
            self.product_id,
            self.quantity,
            self.unit_price,
            self.discount,
            self.is_cancelled,
            self.created_at,
            self.updated_at,
        )
    }
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> Result<Sale, RepositoryError> {
        let status: SaleStatus = self
            .status
            .parse()
            .map_err(|e: crate::domain::UnknownStatus| RepositoryError::InvalidData(e.to_string()))?;

        Ok(Sale::from_db_state(
            self.id,
            self.sale_number,
            self.sale_date,
            self.customer_id,
            self.branch_id,
            status,
            items,
            self.created_at,
            self.updated_at,
        ))
    }
}

const SALE_COLUMNS: &str =
    "id, sale_number, sale_date, customer_id, branch_id, status, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, quantity, unit_price, discount, is_cancelled, created_at, updated_at";

// =========================================================================
// PgSaleRepository
// =========================================================================

/// Sale repository writing through a [`PgSession`]
#[derive(Clone)]
pub struct PgSaleRepository {
    session: PgSession,
}

impl PgSaleRepository {
    pub fn new(session: PgSession) -> Self {
        Self { session }
    }

    async fn upsert_items(
        tx: &mut Transaction<'static, Postgres>,
        sale: &Sale,
    ) -> Result<(), RepositoryError> {
        for (position, item) in sale.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, position, quantity, unit_price,
                    discount, total_amount, is_cancelled, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (id) DO UPDATE SET
                    product_id = EXCLUDED.product_id,
                    position = EXCLUDED.position,
                    quantity = EXCLUDED.quantity,
                    unit_price = EXCLUDED.unit_price,
                    discount = EXCLUDED.discount,
                    total_amount = EXCLUDED.total_amount,
                    is_cancelled = EXCLUDED.is_cancelled,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(item.id())
            .bind(sale.id())
            .bind(item.product_id())
            .bind(position as i32)
            .bind(item.quantity())
            .bind(item.unit_price())
            .bind(item.discount())
            .bind(item.total_amount())
            .bind(item.is_cancelled())
            .bind(item.created_at())
            .bind(item.updated_at())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn load_sale(&self, id: Uuid, lock: bool) -> Result<Option<Sale>, RepositoryError> {
        let mut state = self.session.begin().await?;
        let tx = state.transaction()?;

        let query = format!(
            "SELECT {} FROM sales WHERE id = $1{}",
            SALE_COLUMNS,
            if lock { " FOR UPDATE" } else { "" }
        );
        let row: Option<SaleRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = Self::load_items(tx, &[id], lock).await?;
        let sale = row.into_sale(items.remove(&id).unwrap_or_default())?;
        Ok(Some(sale))
    }

    async fn load_items(
        tx: &mut Transaction<'static, Postgres>,
        sale_ids: &[Uuid],
        lock: bool,
    ) -> Result<HashMap<Uuid, Vec<SaleItem>>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM sale_items WHERE sale_id = ANY($1) ORDER BY sale_id, position{}",
            ITEM_COLUMNS,
            if lock { " FOR UPDATE" } else { "" }
        );

        let rows: Vec<SaleItemRow> = sqlx::query_as(&query)
            .bind(sale_ids)
            .fetch_all(&mut **tx)
            .await?;

        let mut items: HashMap<Uuid, Vec<SaleItem>> = HashMap::new();
        for row in rows {
            items.entry(row.sale_id).or_default().push(row.into_item());
        }
        Ok(items)
    }
}

#[async_trait]
impl SaleRepository for PgSaleRepository {
    async fn create(&self, sale: Sale) -> Result<Sale, RepositoryError> {
        let mut state = self.session.begin().await?;
        let tx = state.transaction()?;

        tracing::debug!(sale_id = %sale.id(), sale_number = %sale.sale_number(), "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_number, sale_date, customer_id, branch_id,
                status, total_amount, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(sale.id())
        .bind(sale.sale_number())
        .bind(sale.sale_date())
        .bind(sale.customer_id())
        .bind(sale.branch_id())
        .bind(sale.status().as_str())
        .bind(sale.total_amount())
        .bind(sale.created_at())
        .bind(sale.updated_at())
        .execute(&mut **tx)
        .await?;

        Self::upsert_items(tx, &sale).await?;

        Ok(sale)
    }

    async fn get_by_id_with_items(&self, id: Uuid) -> Result<Option<Sale>, RepositoryError> {
        // Row lock: concurrent transitions of one sale run one after another
        self.load_sale(id, true).await
    }

    async fn find_by_id_with_items(&self, id: Uuid) -> Result<Option<Sale>, RepositoryError> {
        self.load_sale(id, false).await
    }

    async fn update(&self, sale: Sale) -> Result<Sale, RepositoryError> {
        let mut state = self.session.begin().await?;
        let tx = state.transaction()?;

        tracing::debug!(
            sale_id = %sale.id(),
            status = %sale.status(),
            total_amount = %sale.total_amount(),
            "Updating sale"
        );

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET sale_number = $2, sale_date = $3, customer_id = $4, branch_id = $5,
                status = $6, total_amount = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(sale.id())
        .bind(sale.sale_number())
        .bind(sale.sale_date())
        .bind(sale.customer_id())
        .bind(sale.branch_id())
        .bind(sale.status().as_str())
        .bind(sale.total_amount())
        .bind(sale.updated_at())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::InvalidData(format!(
                "{} {} no longer exists",
                Sale::aggregate_type(),
                sale.id()
            )));
        }

        // Lines removed from the aggregate
        let kept: Vec<Uuid> = sale.items().iter().map(SaleItem::id).collect();
        sqlx::query("DELETE FROM sale_items WHERE sale_id = $1 AND NOT (id = ANY($2))")
            .bind(sale.id())
            .bind(&kept)
            .execute(&mut **tx)
            .await?;

        Self::upsert_items(tx, &sale).await?;

        Ok(sale)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut state = self.session.begin().await?;
        let tx = state.transaction()?;

        // Lines go with ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_sale_number(&self, sale_number: &str) -> Result<bool, RepositoryError> {
        let mut state = self.session.begin().await?;
        let tx = state.transaction()?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sales WHERE sale_number = $1)")
                .bind(sale_number)
                .fetch_one(&mut **tx)
                .await?;

        Ok(exists)
    }

    async fn list(&self, page: i64, size: i64) -> Result<(Vec<Sale>, i64), RepositoryError> {
        let mut state = self.session.begin().await?;
        let tx = state.transaction()?;

        let query = format!(
            "SELECT {} FROM sales ORDER BY sale_date DESC, created_at DESC LIMIT $1 OFFSET $2",
            SALE_COLUMNS
        );
        let rows: Vec<SaleRow> = sqlx::query_as(&query)
            .bind(size)
            .bind(page_offset(page, size))
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&mut **tx)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut items = Self::load_items(tx, &ids, false).await?;

        let sales = rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_sale(lines)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((sales, total))
    }
}
