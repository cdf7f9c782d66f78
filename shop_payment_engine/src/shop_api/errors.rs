use thiserror::Error;

use crate::db_types::{Money, OrderNumber, OrderStatusType, PaymentStatusType};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("An order must contain at least one item")]
    EmptyOrder,
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i64 },
    #[error("Customer information is incomplete. Missing {0}")]
    IncompleteCustomerInfo(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Insufficient stock for {name} (product {product_id}). Requested {requested}, but only {available} left")]
    InsufficientStock { product_id: i64, name: String, requested: i64, available: i64 },
    #[error("Order number {0} is already in use")]
    DuplicateOrderNumber(OrderNumber),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("You do not have access to this order")]
    NotOrderOwner,
    #[error("Order {order_number} cannot be cancelled because it is {status}")]
    OrderNotCancellable { order_number: OrderNumber, status: OrderStatusType },
    #[error("Order {order_number} cannot be paid. Status: {status}, payment status: {payment_status}")]
    OrderNotPayable { order_number: OrderNumber, status: OrderStatusType, payment_status: PaymentStatusType },
    #[error("The requested order change would result in a no-op.")]
    OrderModificationNoOp,
    #[error("The requested order change is forbidden. {0}")]
    OrderModificationForbidden(String),
    #[error("Order total {0} is not a valid amount")]
    InvalidTotal(Money),
    #[error("The order total is too large to be represented")]
    TotalOverflow,
    #[error("Invalid query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

/// Only store faults are errors during reconciliation. Everything the gateway can tell us is an outcome.
#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Database error during reconciliation: {0}")]
    DatabaseError(String),
}

impl From<OrderFlowError> for ReconciliationError {
    fn from(e: OrderFlowError) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::Error> for ReconciliationError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationError::DatabaseError(e.to_string())
    }
}
