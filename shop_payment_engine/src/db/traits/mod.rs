//! # Backend contracts
//!
//! The traits in this module define what a record store has to provide in order to back the order ledger and the
//! reconciliation engine.
//!
//! * [`OrderManagement`] is read-only access to orders, their lines and their audit trail.
//! * [`CatalogManagement`] exposes the product catalogue and shopping carts, which the ledger consumes but does not own.
//! * [`PaymentGatewayDatabase`] holds every state-changing operation. Each method is a single atomic transaction.
mod catalog_management;
mod order_management;
mod payment_gateway_database;

pub use catalog_management::CatalogManagement;
pub use order_management::OrderManagement;
pub use payment_gateway_database::PaymentGatewayDatabase;
