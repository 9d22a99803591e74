//! Read-only view of an order list controller.

use serde::Serialize;

use crate::domain::filter::FilterState;
use crate::domain::order::Order;
use crate::services::orders::QueryPhase;

/// Everything a front-end needs to render one order list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySnapshot {
    pub items: Vec<Order>,
    pub total_count: usize,
    pub current_page: usize,
    pub total_pages: usize,
    /// Page links; `None` marks a gap.
    pub pages: Vec<Option<usize>>,
    pub is_loading: bool,
    /// True until the first response of the view's lifetime has landed.
    pub is_initial_loading: bool,
    pub error: Option<String>,
    pub phase: QueryPhase,
    pub filter: FilterState,
}
