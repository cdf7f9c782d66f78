//! # VNPay tools
//!
//! Everything the shop needs to talk to the VNPay payment gateway:
//!
//! * [`VnpaySigner`] canonicalises parameter sets and signs or verifies them with HMAC-SHA512.
//! * [`PaymentRequest`] and [`build_payment_url`] produce the signed redirect URL a customer is sent to.
//! * [`verify_callback`] turns the raw query parameters of an IPN or return-redirect call into a
//!   [`VerifiedCallback`]. There is no other way to obtain a `VerifiedCallback`, so anything that accepts one is
//!   guaranteed to be looking at data the gateway actually signed.
//! * [`VnpayApi`] is a small client for the merchant web API (`querydr` and `refund`).
mod api;
mod callback;
mod config;
mod data_objects;
mod error;
pub mod helpers;
mod payment_url;
mod signing;

pub use api::VnpayApi;
pub use callback::{verify_callback, VerifiedCallback, VnpayCallback, SUCCESS_RESPONSE_CODE};
pub use config::VnpayConfig;
pub use data_objects::{
    QueryTransactionRequest,
    QueryTransactionResponse,
    RefundRequest,
    RefundResponse,
    RefundType,
};
pub use error::VnpayApiError;
pub use payment_url::{build_payment_url, Locale, PaymentRequest};
pub use signing::{canonical_query, encode_component, VnpaySigner, SECURE_HASH_FIELD, SECURE_HASH_TYPE_FIELD};
