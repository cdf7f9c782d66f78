//! Shop Payment Engine
//!
//! The engine keeps orders and payments consistent for a small shop that takes payments through VNPay.
//!
//! It has two halves:
//! 1. The order ledger ([`OrderFlowApi`]). It creates orders atomically with their stock reservations, hands out
//!    unique order numbers, and cancels orders with their stock restored.
//! 2. The reconciliation engine ([`PaymentReconciliationApi`]). The gateway reports each payment over two unordered,
//!    at-least-once channels. The engine turns those reports into at most one payment transition per order.
//!
//! Storage sits behind the traits in [`traits`]. SQLite is the supported backend ([`SqliteDatabase`]).
//!
//! The engine also publishes events when orders are paid or annulled. See [`events`].
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod shop_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits;
pub use traits::{CatalogManagement, OrderManagement, PaymentGatewayDatabase};
pub use shop_api::{
    errors::{OrderFlowError, ReconciliationError},
    order_flow_api::OrderFlowApi,
    order_objects,
    reconciliation_api::{PaymentReconciliationApi, AMOUNT_TOLERANCE},
};
