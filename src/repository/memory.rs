//! In-memory repository for handler tests.
//!
//! Writes are staged per session and only become visible in the shared store
//! on commit, mirroring the PostgreSQL session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::aggregate::{Aggregate, Sale};

use super::{page_offset, RepositoryError, SaleRepository, UnitOfWork};

/// Committed sales shared by every session
#[derive(Clone, Default)]
pub struct InMemoryStore {
    sales: Arc<RwLock<HashMap<Uuid, Sale>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, sale: Sale) {
        self.sales.write().await.insert(sale.id(), sale);
    }

    pub async fn get(&self, id: Uuid) -> Option<Sale> {
        self.sales.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sales.read().await.len()
    }

    /// A session implementing both the repository and the unit of work
    pub fn session(&self) -> Arc<InMemorySession> {
        Arc::new(InMemorySession {
            store: self.clone(),
            staged: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            locking_loads: AtomicUsize::new(0),
            commit_outcome: RwLock::new(CommitOutcome::Succeed),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommitOutcome {
    Succeed,
    /// commit() returns Ok(false)
    Refuse,
    /// commit() returns an error
    Fail,
}

pub struct InMemorySession {
    store: InMemoryStore,
    /// `None` marks a staged deletion
    staged: RwLock<HashMap<Uuid, Option<Sale>>>,
    calls: AtomicUsize,
    locking_loads: AtomicUsize,
    commit_outcome: RwLock<CommitOutcome>,
}

impl InMemorySession {
    pub async fn set_commit_outcome(&self, outcome: CommitOutcome) {
        *self.commit_outcome.write().await = outcome;
    }

    /// Number of repository calls made through this session
    pub fn repository_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of loads that would have locked the sale
    pub fn locking_loads(&self) -> usize {
        self.locking_loads.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Current view: staged changes over the committed store
    async fn find(&self, id: Uuid) -> Option<Sale> {
        if let Some(staged) = self.staged.read().await.get(&id) {
            return staged.clone();
        }
        self.store.get(id).await
    }

    async fn visible(&self) -> Vec<Sale> {
        let staged = self.staged.read().await;
        let committed = self.store.sales.read().await;

        let mut sales: Vec<Sale> = committed
            .values()
            .filter(|sale| !staged.contains_key(&sale.id()))
            .cloned()
            .collect();
        sales.extend(staged.values().flatten().cloned());
        sales
    }
}

#[async_trait]
impl SaleRepository for InMemorySession {
    async fn create(&self, sale: Sale) -> Result<Sale, RepositoryError> {
        self.record_call();
        if self.find(sale.id()).await.is_some() {
            return Err(RepositoryError::Conflict(format!("sale {} exists", sale.id())));
        }
        if self.exists_by_sale_number(sale.sale_number()).await? {
            return Err(RepositoryError::Conflict(format!(
                "sale number {} exists",
                sale.sale_number()
            )));
        }
        self.staged.write().await.insert(sale.id(), Some(sale.clone()));
        Ok(sale)
    }

    async fn get_by_id_with_items(&self, id: Uuid) -> Result<Option<Sale>, RepositoryError> {
        self.record_call();
        self.locking_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.find(id).await)
    }

    async fn find_by_id_with_items(&self, id: Uuid) -> Result<Option<Sale>, RepositoryError> {
        self.record_call();
        Ok(self.find(id).await)
    }

    async fn update(&self, sale: Sale) -> Result<Sale, RepositoryError> {
        self.record_call();
        if self.find(sale.id()).await.is_none() {
            return Err(RepositoryError::InvalidData(format!("sale {} no longer exists", sale.id())));
        }
        self.staged.write().await.insert(sale.id(), Some(sale.clone()));
        Ok(sale)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.record_call();
        if self.find(id).await.is_none() {
            return Ok(false);
        }
        self.staged.write().await.insert(id, None);
        Ok(true)
    }

    async fn exists_by_sale_number(&self, sale_number: &str) -> Result<bool, RepositoryError> {
        self.record_call();
        Ok(self
            .visible()
            .await
            .iter()
            .any(|sale| sale.sale_number() == sale_number))
    }

    async fn list(&self, page: i64, size: i64) -> Result<(Vec<Sale>, i64), RepositoryError> {
        self.record_call();
        let mut sales = self.visible().await;
        sales.sort_by(|a, b| {
            b.sale_date()
                .cmp(&a.sale_date())
                .then(b.created_at().cmp(&a.created_at()))
        });

        let total = sales.len() as i64;
        let page_items = sales
            .into_iter()
            .skip(page_offset(page, size) as usize)
            .take(size as usize)
            .collect();
        Ok((page_items, total))
    }
}

#[async_trait]
impl UnitOfWork for InMemorySession {
    async fn commit(&self) -> Result<bool, RepositoryError> {
        match *self.commit_outcome.read().await {
            CommitOutcome::Succeed => {}
            CommitOutcome::Refuse => return Ok(false),
            CommitOutcome::Fail => return Err(RepositoryError::TransactionClosed),
        }

        let staged = std::mem::take(&mut *self.staged.write().await);
        let mut committed = self.store.sales.write().await;
        for (id, sale) in staged {
            match sale {
                Some(sale) => {
                    committed.insert(id, sale);
                }
                None => {
                    committed.remove(&id);
                }
            }
        }
        Ok(true)
    }
}
