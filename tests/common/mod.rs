//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::oneshot;

use pushkind_orders::domain::order::{Order, OrderPage};
use pushkind_orders::domain::types::{BatchId, OrderId, OrderStatus, OrderTitle, UserId};
use pushkind_orders::repository::errors::{BackendError, BackendResult};
use pushkind_orders::repository::{OrderReader, OrderWriter, QueryRequest};
use pushkind_orders::services::errors::ErrorNormalizer;
use pushkind_orders::services::notifications::{
    NotificationCenter, NotificationKind, NotificationSink,
};
use pushkind_orders::services::orders::{OrderQueryController, OrderView, ViewScope};

/// One backend call held open until the test resolves it.
struct Gate<A, T> {
    args: A,
    reply: Option<oneshot::Sender<T>>,
}

/// Backend whose calls block until the test resolves them, in any order.
#[derive(Default)]
pub struct GatedRepository {
    fetches: Mutex<Vec<Gate<QueryRequest, BackendResult<OrderPage>>>>,
    assigns: Mutex<Vec<Gate<(OrderId, UserId), BackendResult<()>>>>,
}

impl GatedRepository {
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetch_request(&self, index: usize) -> QueryRequest {
        self.fetches.lock().unwrap()[index].args.clone()
    }

    pub fn resolve_fetch(&self, index: usize, result: BackendResult<OrderPage>) {
        let reply = self.fetches.lock().unwrap()[index]
            .reply
            .take()
            .expect("fetch already resolved");
        let _ = reply.send(result);
    }

    pub fn assign_count(&self) -> usize {
        self.assigns.lock().unwrap().len()
    }

    pub fn assign_args(&self, index: usize) -> (OrderId, UserId) {
        self.assigns.lock().unwrap()[index].args
    }

    pub fn resolve_assign(&self, index: usize, result: BackendResult<()>) {
        let reply = self.assigns.lock().unwrap()[index]
            .reply
            .take()
            .expect("assign already resolved");
        let _ = reply.send(result);
    }
}

fn dropped() -> BackendError {
    BackendError::Connection("gate dropped".to_string())
}

#[async_trait]
impl OrderReader for GatedRepository {
    async fn fetch_orders(&self, request: QueryRequest) -> BackendResult<OrderPage> {
        let (tx, rx) = oneshot::channel();
        self.fetches.lock().unwrap().push(Gate {
            args: request,
            reply: Some(tx),
        });
        rx.await.unwrap_or_else(|_| Err(dropped()))
    }
}

#[async_trait]
impl OrderWriter for GatedRepository {
    async fn assign_order(&self, order_id: OrderId, user_id: UserId) -> BackendResult<()> {
        let (tx, rx) = oneshot::channel();
        self.assigns.lock().unwrap().push(Gate {
            args: (order_id, user_id),
            reply: Some(tx),
        });
        rx.await.unwrap_or_else(|_| Err(dropped()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<(String, NotificationKind)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, message: &str, kind: NotificationKind) {
        self.seen.lock().unwrap().push((message.to_string(), kind));
    }
}

pub struct Harness {
    pub repo: Arc<GatedRepository>,
    pub sink: Arc<RecordingSink>,
    pub controller: OrderQueryController<GatedRepository>,
}

pub fn harness(scope: ViewScope) -> Harness {
    let repo = Arc::new(GatedRepository::default());
    let sink = Arc::new(RecordingSink::default());
    let errors = ErrorNormalizer::new(Arc::new(NotificationCenter::new(sink.clone())));
    let controller =
        OrderQueryController::new(Arc::clone(&repo), OrderView::new(scope), 20, errors).unwrap();
    Harness {
        repo,
        sink,
        controller,
    }
}

/// Lets spawned tasks run until they block on a gate or a timer.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn user(id: i32) -> UserId {
    UserId::new(id).unwrap()
}

pub fn order(id: i32) -> Order {
    Order {
        id: OrderId::new(id).unwrap(),
        batch_id: BatchId::new(1).unwrap(),
        title: OrderTitle::new(format!("Order {id}")).unwrap(),
        status: OrderStatus::new("new").unwrap(),
        assigned_to: None,
        created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
    }
}

/// Page holding `ids` out of `total` orders.
pub fn page(ids: &[i32], total: usize, current_page: usize) -> BackendResult<OrderPage> {
    Ok(OrderPage::new(
        ids.iter().copied().map(order).collect(),
        total,
        current_page,
        20,
    ))
}
