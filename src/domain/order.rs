use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{BatchId, OrderId, OrderStatus, OrderTitle, UserId};

/// A document-processing order as returned by the backend.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub batch_id: BatchId,
    pub title: OrderTitle,
    pub status: OrderStatus,
    /// Operator currently working on the order, if any.
    pub assigned_to: Option<UserId>,
    pub created_at: NaiveDateTime,
}

/// One page of orders together with the totals needed for paging.
///
/// Pages are replaced wholesale when a newer response is accepted and are
/// never patched in place.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub total_count: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
}

impl OrderPage {
    /// Builds a page deriving `total_pages` from the total and the page size.
    #[must_use]
    pub fn new(items: Vec<Order>, total_count: usize, current_page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            items,
            total_count,
            current_page: current_page.max(1),
            total_pages: total_count.div_ceil(page_size),
            page_size,
        }
    }

    /// Placeholder page shown before any response has been accepted.
    #[must_use]
    pub fn empty(page_size: usize) -> Self {
        Self::new(Vec::new(), 0, 1, page_size)
    }
}
