use async_trait::async_trait;
use serde::Serialize;

use crate::UNASSIGNED_SENTINEL;
use crate::domain::filter::{AssignmentFilter, FilterState};
use crate::domain::order::OrderPage;
use crate::domain::types::{BatchId, OrderId, OrderStatus, UserId};
use crate::repository::errors::BackendResult;

pub mod errors;
pub mod memory;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

/// Fixed criteria a view layers over the user's filter, e.g. the acting user
/// for a "my orders" page. An override always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryOverrides {
    pub assigned_to: Option<UserId>,
    pub batch_id: Option<BatchId>,
    pub status: Option<OrderStatus>,
}

impl QueryOverrides {
    pub fn assigned_to(mut self, user_id: UserId) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    pub fn batch(mut self, batch_id: BatchId) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Combines two override sets; values in `other` take precedence.
    pub fn merge(&self, other: &QueryOverrides) -> QueryOverrides {
        QueryOverrides {
            assigned_to: other.assigned_to.or(self.assigned_to),
            batch_id: other.batch_id.or(self.batch_id),
            status: other.status.clone().or_else(|| self.status.clone()),
        }
    }
}

/// Outgoing list query in the encoding the backend expects.
///
/// `assigned_to == Some(UNASSIGNED_SENTINEL)` asks for orders without an
/// assignee; the sentinel never appears in [`FilterState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryRequest {
    pub search: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<i32>,
    pub batch_id: Option<i32>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
struct QueryParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    #[serde(rename = "assignedTo", skip_serializing_if = "Option::is_none")]
    assigned_to: Option<i32>,
    #[serde(rename = "batchId", skip_serializing_if = "Option::is_none")]
    batch_id: Option<i32>,
    page: usize,
    per_page: usize,
}

impl QueryRequest {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            search: None,
            status: None,
            assigned_to: None,
            batch_id: None,
            pagination: Pagination { page, per_page },
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn assigned_to(mut self, user_id: UserId) -> Self {
        self.assigned_to = Some(user_id.get());
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.assigned_to = Some(UNASSIGNED_SENTINEL);
        self
    }

    pub fn batch(mut self, batch_id: BatchId) -> Self {
        self.batch_id = Some(batch_id.get());
        self
    }

    /// Derives the request for `filter` as seen by `acting_user`.
    ///
    /// The result depends only on the arguments, so structurally equal inputs
    /// always produce structurally equal requests. `AssignedToMe` without an
    /// acting user degrades to no assignee constraint; callers guard against
    /// that before dispatching.
    pub fn derive(
        filter: &FilterState,
        acting_user: Option<UserId>,
        overrides: &QueryOverrides,
    ) -> Self {
        let mut request = QueryRequest::new(filter.page(), filter.page_size());

        let term = filter.search().trim();
        if !term.is_empty() {
            request = request.search(term);
        }

        if let Some(status) = overrides.status.as_ref().or(filter.status()) {
            request = request.status(status.as_str());
        }

        request = match (overrides.assigned_to, filter.assignment(), acting_user) {
            (Some(user_id), _, _) => request.assigned_to(user_id),
            (None, AssignmentFilter::Unassigned, _) => request.unassigned(),
            (None, AssignmentFilter::AssignedToMe, Some(user_id)) => request.assigned_to(user_id),
            _ => request,
        };

        if let Some(batch_id) = overrides.batch_id {
            request = request.batch(batch_id);
        }

        request
    }

    /// Encodes the request as a URL query string.
    pub fn to_query_string(&self) -> Result<String, serde_html_form::ser::Error> {
        serde_html_form::to_string(QueryParams {
            search: self.search.as_deref(),
            status: self.status.as_deref(),
            assigned_to: self.assigned_to,
            batch_id: self.batch_id,
            page: self.pagination.page,
            per_page: self.pagination.per_page,
        })
    }
}

/// Read access to the order list.
#[async_trait]
pub trait OrderReader: Send + Sync {
    async fn fetch_orders(&self, request: QueryRequest) -> BackendResult<OrderPage>;
}

/// Order mutations.
#[async_trait]
pub trait OrderWriter: Send + Sync {
    async fn assign_order(&self, order_id: OrderId, user_id: UserId) -> BackendResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i32) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn equal_filters_derive_equal_requests() {
        let a = FilterState::new(25).unwrap().with_search("  invoice ");
        let b = FilterState::new(25).unwrap().with_search("  invoice ");

        let overrides = QueryOverrides::default();
        assert_eq!(
            QueryRequest::derive(&a, Some(user(4)), &overrides),
            QueryRequest::derive(&b, Some(user(4)), &overrides)
        );
    }

    #[test]
    fn search_is_trimmed_and_blank_is_omitted() {
        let filter = FilterState::new(10).unwrap().with_search("  scan ");
        let request = QueryRequest::derive(&filter, None, &QueryOverrides::default());
        assert_eq!(request.search.as_deref(), Some("scan"));

        let blank = FilterState::new(10).unwrap().with_search("   ");
        let request = QueryRequest::derive(&blank, None, &QueryOverrides::default());
        assert_eq!(request.search, None);
    }

    #[test]
    fn assignment_tri_state_translates_at_the_boundary() {
        let base = FilterState::new(10).unwrap();
        let none = QueryOverrides::default();

        let all = QueryRequest::derive(&base, Some(user(9)), &none);
        assert_eq!(all.assigned_to, None);

        let unassigned = QueryRequest::derive(
            &base.with_assignment(AssignmentFilter::Unassigned),
            Some(user(9)),
            &none,
        );
        assert_eq!(unassigned.assigned_to, Some(UNASSIGNED_SENTINEL));

        let mine = QueryRequest::derive(
            &base.with_assignment(AssignmentFilter::AssignedToMe),
            Some(user(9)),
            &none,
        );
        assert_eq!(mine.assigned_to, Some(9));
    }

    #[test]
    fn overrides_win_over_filter() {
        let filter = FilterState::new(10)
            .unwrap()
            .with_status(Some(OrderStatus::new("new").unwrap()))
            .with_assignment(AssignmentFilter::Unassigned);
        let overrides = QueryOverrides::default()
            .assigned_to(user(3))
            .batch(BatchId::new(11).unwrap())
            .status(OrderStatus::new("done").unwrap());

        let request = QueryRequest::derive(&filter, Some(user(9)), &overrides);

        assert_eq!(request.assigned_to, Some(3));
        assert_eq!(request.batch_id, Some(11));
        assert_eq!(request.status.as_deref(), Some("done"));
    }

    #[test]
    fn merge_prefers_the_argument() {
        let view = QueryOverrides::default().batch(BatchId::new(1).unwrap());
        let call = QueryOverrides::default().batch(BatchId::new(2).unwrap());

        let merged = view.merge(&call);
        assert_eq!(merged.batch_id.map(BatchId::get), Some(2));
        assert_eq!(view.merge(&QueryOverrides::default()), view);
    }

    #[test]
    fn encodes_as_query_string() {
        let request = QueryRequest::new(2, 20).search("a b").unassigned();
        assert_eq!(
            request.to_query_string().unwrap(),
            "search=a+b&assignedTo=0&page=2&per_page=20"
        );
    }
}
