//! In-process order backend.
//!
//! Serves the same contract as a remote REST backend, including an optional
//! artificial latency so response reordering can be observed from the
//! console front-end.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::UNASSIGNED_SENTINEL;
use crate::domain::order::{Order, OrderPage};
use crate::domain::types::{OrderId, UserId};
use crate::repository::errors::{BackendError, BackendResult, Severity, ValidationError};
use crate::repository::{OrderReader, OrderWriter, QueryRequest};

#[derive(Clone, Default)]
pub struct InMemoryRepository {
    orders: Arc<Mutex<Vec<Order>>>,
    latency: Duration,
}

impl InMemoryRepository {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            orders: Arc::new(Mutex::new(orders)),
            latency: Duration::ZERO,
        }
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Loads orders from a JSON array file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BackendError::Connection(format!("cannot read seed file: {e}")))?;
        let orders: Vec<Order> = serde_json::from_str(&raw)
            .map_err(|e| BackendError::Message(format!("invalid seed file: {e}")))?;
        Ok(Self::new(orders))
    }

    fn lock(&self) -> BackendResult<std::sync::MutexGuard<'_, Vec<Order>>> {
        self.orders
            .lock()
            .map_err(|_| BackendError::Connection("order store poisoned".to_string()))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn matches(order: &Order, request: &QueryRequest) -> bool {
    if let Some(term) = &request.search {
        let term = term.to_lowercase();
        let hit = order.title.to_lowercase().contains(&term) || order.id.to_string() == term;
        if !hit {
            return false;
        }
    }

    if let Some(status) = &request.status {
        if order.status.as_str() != status {
            return false;
        }
    }

    match request.assigned_to {
        Some(UNASSIGNED_SENTINEL) if order.assigned_to.is_some() => return false,
        Some(UNASSIGNED_SENTINEL) | None => {}
        Some(user_id) => {
            if order.assigned_to.map(UserId::get) != Some(user_id) {
                return false;
            }
        }
    }

    match request.batch_id {
        Some(batch_id) => order.batch_id.get() == batch_id,
        None => true,
    }
}

#[async_trait]
impl OrderReader for InMemoryRepository {
    async fn fetch_orders(&self, request: QueryRequest) -> BackendResult<OrderPage> {
        self.simulate_latency().await;

        let per_page = request.pagination.per_page;
        if per_page == 0 {
            return Err(BackendError::Validation(vec![ValidationError::new(
                "PageSize",
                "Page size must be positive",
                Severity::Error,
            )]));
        }

        let orders = self.lock()?;
        let mut found: Vec<&Order> = orders.iter().filter(|o| matches(o, &request)).collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = found.len();
        let page = request.pagination.page.max(1);
        let items = found
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect();

        Ok(OrderPage::new(items, total, page, per_page))
    }
}

#[async_trait]
impl OrderWriter for InMemoryRepository {
    async fn assign_order(&self, order_id: OrderId, user_id: UserId) -> BackendResult<()> {
        self.simulate_latency().await;

        let mut orders = self.lock()?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| BackendError::Message(format!("Order {order_id} not found")))?;

        match order.assigned_to {
            Some(current) if current != user_id => {
                Err(BackendError::Validation(vec![ValidationError::new(
                    "AssignedTo",
                    "Order is already assigned to another operator",
                    Severity::Error,
                )]))
            }
            _ => {
                order.assigned_to = Some(user_id);
                Ok(())
            }
        }
    }
}
