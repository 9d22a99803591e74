//! Mock repository implementations for isolating services in tests.

use async_trait::async_trait;
use mockall::mock;

use crate::domain::order::OrderPage;
use crate::domain::types::{OrderId, UserId};
use crate::repository::errors::BackendResult;
use crate::repository::{OrderReader, OrderWriter, QueryRequest};

mock! {
    pub Repository {}

    #[async_trait]
    impl OrderReader for Repository {
        async fn fetch_orders(&self, request: QueryRequest) -> BackendResult<OrderPage>;
    }

    #[async_trait]
    impl OrderWriter for Repository {
        async fn assign_order(&self, order_id: OrderId, user_id: UserId) -> BackendResult<()>;
    }
}
