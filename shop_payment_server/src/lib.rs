//! # Shop payment server
//! This crate hosts the HTTP server for the shop's order and payment flow. It is responsible for:
//! * Placing, fetching and cancelling orders on behalf of customers, and administrative order updates.
//! * Building signed VNPay payment URLs for unpaid orders.
//! * Receiving the gateway's two callbacks (the server-to-server IPN and the customer's browser redirect) and handing
//!   them to the reconciliation engine, which applies each payment exactly once.
//! * Forwarding transaction queries and refunds to the gateway's merchant API.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Identity
//! Authentication happens upstream. The server trusts the `X-User-Id` and `X-User-Roles` headers it is given. See
//! [identity](identity/index.html).
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/orders/...`: The order ledger. See [routes](routes/index.html).
//! * `/payments/...`: Payment URLs, gateway callbacks, queries and refunds. See
//!   [payment_routes](payment_routes/index.html).

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod identity;
pub mod middleware;
pub mod payment_routes;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
