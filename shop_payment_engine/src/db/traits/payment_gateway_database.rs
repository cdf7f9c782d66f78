use crate::{
    db_types::{FullOrder, NewOrder, Order, OrderNumber, OrderStatusType, PaymentStatusType, SettledPayment},
    traits::{CatalogManagement, OrderManagement},
    OrderFlowError,
};

/// The state-changing operations of the order ledger.
///
/// Every method runs as one atomic transaction: either all of its writes land, or none do.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + OrderManagement + CatalogManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Writes a new order in a single transaction:
    /// * Every product is looked up and priced server-side (sale price if set, else list price).
    /// * Stock is decremented with a guarded update, so it can never go negative.
    /// * The order and its lines are inserted with `pending` payment status and `pending` status.
    /// * The user's cart is cleared.
    ///
    /// A missing product or insufficient stock aborts the whole operation. A clash on the order number returns
    /// [`OrderFlowError::DuplicateOrderNumber`] so the caller can retry with a fresh number.
    async fn create_order(&self, order: NewOrder) -> Result<FullOrder, OrderFlowError>;

    /// Cancels an order and returns its stock to the shelves.
    ///
    /// The status check is part of the transaction: if the order is no longer `pending` or `processing` by the time
    /// the update runs, [`OrderFlowError::OrderNotCancellable`] is returned and nothing changes.
    async fn cancel_order(&self, id: i64, actor: &str, reason: &str) -> Result<Order, OrderFlowError>;

    /// Administrative status change. Writes the status and an audit entry; nothing else.
    async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatusType,
        actor: &str,
    ) -> Result<Order, OrderFlowError>;

    /// Administrative payment-status change from `pending`. Returns `None` if the order was already settled.
    async fn update_payment_status(
        &self,
        id: i64,
        status: PaymentStatusType,
        actor: &str,
    ) -> Result<Option<Order>, OrderFlowError>;

    /// Settles a pending payment with one conditional update on `payment_status = 'pending'`.
    ///
    /// * `Paid` moves the order to `processing`.
    /// * `Failed` moves the order to `cancelled` and restores its stock in the same transaction.
    ///
    /// An order the customer has already cancelled keeps its `cancelled` status, and its stock is not touched again.
    /// Only the payment status is written, and the result is flagged with
    /// [`SettledPayment::after_cancellation`]. A `Paid` outcome here leaves a refund to be made.
    ///
    /// Returns `None`, having written nothing, when the order is not pending any more. Concurrent callers for the same
    /// order therefore see exactly one `Some`.
    async fn settle_pending_payment(
        &self,
        order_number: &OrderNumber,
        outcome: PaymentStatusType,
        actor: &str,
    ) -> Result<Option<SettledPayment>, OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}
