use crate::{
    db_types::{AuditEntry, Order, OrderLine, OrderNumber},
    order_objects::OrderQueryFilter,
    OrderFlowError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderFlowError>;

    /// The line items of an order, in the order they were placed.
    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError>;

    /// All orders placed by `user_id`, newest first.
    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderFlowError>;

    /// Fetches orders matching every criterion in `query`, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;

    async fn fetch_audit_log(&self, order_id: i64) -> Result<Vec<AuditEntry>, OrderFlowError>;
}
