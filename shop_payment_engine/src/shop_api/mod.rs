//! # Shop payment engine public API
//!
//! * [`order_flow_api`] is the order ledger: placing, fetching, cancelling and administering orders.
//! * [`reconciliation_api`] applies verified gateway callbacks to orders, exactly once per order.
//!
//! Both APIs are created by handing them a backend that implements the traits in [`crate::traits`], plus the event
//! producers that should hear about paid and annulled orders:
//!
//! ```rust,ignore
//! use shop_payment_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/shop_store.db", 25).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.create_order("user-1", request).await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod reconciliation_api;
