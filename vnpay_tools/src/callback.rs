//! Parsing and verification of inbound gateway callbacks.
//!
//! The gateway reports a payment outcome twice: once by redirecting the customer's browser to the return URL, and
//! once with a server-to-server IPN call. Both carry the same signed parameter set and are handled by
//! [`verify_callback`].
use std::collections::HashMap;

use log::*;
use serde::{Deserialize, Serialize};
use shop_common::Money;

use crate::{VnpayApiError, VnpayConfig, VnpaySigner};

pub const SUCCESS_RESPONSE_CODE: &str = "00";

/// The typed content of a gateway callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnpayCallback {
    /// `vnp_TxnRef`, the shop's order number
    pub txn_ref: String,
    /// `vnp_Amount`, in minor units
    pub amount: Money,
    pub response_code: String,
    pub transaction_status: Option<String>,
    pub transaction_no: Option<String>,
    pub bank_code: Option<String>,
    pub pay_date: Option<String>,
    pub order_info: Option<String>,
}

impl VnpayCallback {
    /// Extracts the typed fields from raw callback parameters. No signature checking is done here.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, VnpayApiError> {
        let required = |key: &str| {
            params
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| VnpayApiError::MalformedCallback(format!("Missing field {key}")))
        };
        let optional = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();
        let txn_ref = required("vnp_TxnRef")?;
        let amount = required("vnp_Amount")?
            .parse::<i64>()
            .map(Money::from)
            .map_err(|e| VnpayApiError::MalformedCallback(format!("Invalid vnp_Amount. {e}")))?;
        let response_code = required("vnp_ResponseCode")?;
        Ok(Self {
            txn_ref,
            amount,
            response_code,
            transaction_status: optional("vnp_TransactionStatus"),
            transaction_no: optional("vnp_TransactionNo"),
            bank_code: optional("vnp_BankCode"),
            pay_date: optional("vnp_PayDate"),
            order_info: optional("vnp_OrderInfo"),
        })
    }

    pub fn is_success(&self) -> bool {
        self.response_code == SUCCESS_RESPONSE_CODE
    }
}

/// A callback whose signature has been checked against the merchant secret.
///
/// The only way to obtain one is through [`verify_callback`], so anything that accepts a `VerifiedCallback` can trust
/// its contents.
#[derive(Debug, Clone)]
pub struct VerifiedCallback {
    callback: VnpayCallback,
}

impl VerifiedCallback {
    pub fn order_number(&self) -> &str {
        &self.callback.txn_ref
    }

    pub fn amount(&self) -> Money {
        self.callback.amount
    }

    pub fn response_code(&self) -> &str {
        &self.callback.response_code
    }

    pub fn is_success(&self) -> bool {
        self.callback.is_success()
    }

    pub fn callback(&self) -> &VnpayCallback {
        &self.callback
    }

    pub fn into_inner(self) -> VnpayCallback {
        self.callback
    }
}

/// Verifies the signature over a callback's parameters and parses them.
///
/// The signature is checked before any field is interpreted. A missing or mismatched `vnp_SecureHash` is an
/// authentication failure.
pub fn verify_callback(config: &VnpayConfig, params: &HashMap<String, String>) -> Result<VerifiedCallback, VnpayApiError> {
    let signer = VnpaySigner::new(config.hash_secret.clone());
    if let Err(e) = signer.verify_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
        let txn_ref = params.get("vnp_TxnRef").map(String::as_str).unwrap_or("<none>");
        warn!("💳️ Rejected callback for {txn_ref}. {e}");
        return Err(e);
    }
    let callback = VnpayCallback::from_params(params)?;
    trace!("💳️ Verified callback for {} with response code {}", callback.txn_ref, callback.response_code);
    Ok(VerifiedCallback { callback })
}
