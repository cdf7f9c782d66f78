use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_payment_engine::{
    db_types::{Money, OrderNumber, OrderStatusType, PaymentStatusType},
    order_objects::{OrderQueryFilter, ReconciliationOutcome, RejectionReason},
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------      Order requests      ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusUpdate {
    pub payment_status: PaymentStatusType,
}

/// Query string of `GET /orders/search`. Status lists are comma-separated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TryFrom<OrderSearchParams> for OrderQueryFilter {
    type Error = ServerError;

    fn try_from(params: OrderSearchParams) -> Result<Self, Self::Error> {
        let mut filter = OrderQueryFilter::default();
        if let Some(user_id) = params.user_id.filter(|s| !s.trim().is_empty()) {
            filter = filter.with_user_id(user_id);
        }
        for status in split_list(params.status.as_deref()) {
            let status = status.parse::<OrderStatusType>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
            filter = filter.with_status(status);
        }
        for status in split_list(params.payment_status.as_deref()) {
            let status =
                status.parse::<PaymentStatusType>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
            filter = filter.with_payment_status(status);
        }
        if let Some(since) = params.since {
            filter = filter.since(since);
        }
        if let Some(until) = params.until {
            filter = filter.until(until);
        }
        Ok(filter)
    }
}

fn split_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value.unwrap_or_default().split(',').map(str::trim).filter(|s| !s.is_empty())
}

//--------------------------------------     Payment requests     ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentUrlRequest {
    pub order_id: i64,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub bank_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUrlResponse {
    pub payment_url: String,
    pub order_id: i64,
    pub order_number: OrderNumber,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTransactionParams {
    pub order_number: OrderNumber,
    /// The gateway's transaction number, if known
    #[serde(default)]
    pub transaction_no: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundParams {
    pub order_number: OrderNumber,
    /// Amount to refund in whole đồng. The full order total if omitted.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub transaction_no: Option<String>,
}

//--------------------------------------        IPN reply         ----------------------------------------------------
/// The acknowledgement the gateway expects from the IPN endpoint. The gateway retries on anything other than a
/// definitive answer, so the codes must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpnResponse {
    #[serde(rename = "RspCode")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl IpnResponse {
    fn new(code: &str, message: &str) -> Self {
        Self { code: code.to_string(), message: message.to_string() }
    }

    pub fn confirm_success() -> Self {
        Self::new("00", "Confirm Success")
    }

    pub fn order_not_found() -> Self {
        Self::new("01", "Order not found")
    }

    pub fn already_confirmed() -> Self {
        Self::new("02", "Order already confirmed")
    }

    pub fn invalid_amount() -> Self {
        Self::new("04", "Invalid amount")
    }

    pub fn invalid_checksum() -> Self {
        Self::new("97", "Invalid Checksum")
    }

    pub fn unknown_error() -> Self {
        Self::new("99", "Unknown error")
    }
}

impl From<&ReconciliationOutcome> for IpnResponse {
    fn from(outcome: &ReconciliationOutcome) -> Self {
        match outcome {
            ReconciliationOutcome::Applied(_) => Self::confirm_success(),
            ReconciliationOutcome::AlreadySettled(_) => Self::already_confirmed(),
            ReconciliationOutcome::Rejected(RejectionReason::OrderNotFound) => Self::order_not_found(),
            ReconciliationOutcome::Rejected(RejectionReason::AmountMismatch { .. }) => Self::invalid_amount(),
        }
    }
}
