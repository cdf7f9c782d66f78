use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::Money;

use crate::VnpayApiError;

//--------------------------------------   QueryTransactionRequest   ---------------------------------------------------
/// Parameters for a `querydr` (transaction status) lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTransactionRequest {
    pub order_number: String,
    /// When the original payment URL was created
    pub transaction_date: DateTime<Utc>,
    pub transaction_no: Option<String>,
    pub client_ip: String,
}

//--------------------------------------        RefundType         ---------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundType {
    Full,
    Partial,
}

impl RefundType {
    pub fn code(&self) -> &'static str {
        match self {
            RefundType::Full => "02",
            RefundType::Partial => "03",
        }
    }
}

//--------------------------------------       RefundRequest        ---------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub order_number: String,
    pub amount: Money,
    pub refund_type: RefundType,
    pub transaction_date: DateTime<Utc>,
    pub transaction_no: Option<String>,
    /// The operator requesting the refund
    pub created_by: String,
    pub client_ip: String,
}

impl RefundRequest {
    pub fn validate(&self) -> Result<(), VnpayApiError> {
        if self.order_number.trim().is_empty() {
            return Err(VnpayApiError::InvalidRequest("An order number is required".into()));
        }
        if !self.amount.is_positive() {
            return Err(VnpayApiError::InvalidRequest(format!("Refund amount must be positive, not {}", self.amount)));
        }
        if self.created_by.trim().is_empty() {
            return Err(VnpayApiError::InvalidRequest("The refund operator must be named".into()));
        }
        Ok(())
    }
}

//--------------------------------------    Merchant API responses    ------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTransactionResponse {
    #[serde(rename = "vnp_ResponseId", default)]
    pub response_id: String,
    #[serde(rename = "vnp_Command", default)]
    pub command: String,
    #[serde(rename = "vnp_ResponseCode", default)]
    pub response_code: String,
    #[serde(rename = "vnp_Message", default)]
    pub message: String,
    #[serde(rename = "vnp_TmnCode", default)]
    pub tmn_code: String,
    #[serde(rename = "vnp_TxnRef", default)]
    pub txn_ref: String,
    #[serde(rename = "vnp_Amount", default)]
    pub amount: String,
    #[serde(rename = "vnp_BankCode", default)]
    pub bank_code: String,
    #[serde(rename = "vnp_PayDate", default)]
    pub pay_date: String,
    #[serde(rename = "vnp_TransactionNo", default)]
    pub transaction_no: String,
    #[serde(rename = "vnp_TransactionType", default)]
    pub transaction_type: String,
    #[serde(rename = "vnp_TransactionStatus", default)]
    pub transaction_status: String,
    #[serde(rename = "vnp_OrderInfo", default)]
    pub order_info: String,
    #[serde(rename = "vnp_PromotionCode", default)]
    pub promotion_code: String,
    #[serde(rename = "vnp_PromotionAmount", default)]
    pub promotion_amount: String,
    #[serde(rename = "vnp_SecureHash", default)]
    pub secure_hash: String,
}

impl QueryTransactionResponse {
    pub(crate) fn signed_fields(&self) -> Vec<&str> {
        vec![
            self.response_id.as_str(),
            self.command.as_str(),
            self.response_code.as_str(),
            self.message.as_str(),
            self.tmn_code.as_str(),
            self.txn_ref.as_str(),
            self.amount.as_str(),
            self.bank_code.as_str(),
            self.pay_date.as_str(),
            self.transaction_no.as_str(),
            self.transaction_type.as_str(),
            self.transaction_status.as_str(),
            self.order_info.as_str(),
            self.promotion_code.as_str(),
            self.promotion_amount.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundResponse {
    #[serde(rename = "vnp_ResponseId", default)]
    pub response_id: String,
    #[serde(rename = "vnp_Command", default)]
    pub command: String,
    #[serde(rename = "vnp_ResponseCode", default)]
    pub response_code: String,
    #[serde(rename = "vnp_Message", default)]
    pub message: String,
    #[serde(rename = "vnp_TmnCode", default)]
    pub tmn_code: String,
    #[serde(rename = "vnp_TxnRef", default)]
    pub txn_ref: String,
    #[serde(rename = "vnp_Amount", default)]
    pub amount: String,
    #[serde(rename = "vnp_BankCode", default)]
    pub bank_code: String,
    #[serde(rename = "vnp_PayDate", default)]
    pub pay_date: String,
    #[serde(rename = "vnp_TransactionNo", default)]
    pub transaction_no: String,
    #[serde(rename = "vnp_TransactionType", default)]
    pub transaction_type: String,
    #[serde(rename = "vnp_TransactionStatus", default)]
    pub transaction_status: String,
    #[serde(rename = "vnp_OrderInfo", default)]
    pub order_info: String,
    #[serde(rename = "vnp_SecureHash", default)]
    pub secure_hash: String,
}

impl RefundResponse {
    pub(crate) fn signed_fields(&self) -> Vec<&str> {
        vec![
            self.response_id.as_str(),
            self.command.as_str(),
            self.response_code.as_str(),
            self.message.as_str(),
            self.tmn_code.as_str(),
            self.txn_ref.as_str(),
            self.amount.as_str(),
            self.bank_code.as_str(),
            self.pay_date.as_str(),
            self.transaction_no.as_str(),
            self.transaction_type.as_str(),
            self.transaction_status.as_str(),
            self.order_info.as_str(),
        ]
    }
}

//--------------------------------------   Merchant API payloads   ----------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub(crate) struct QueryDrPayload {
    #[serde(rename = "vnp_RequestId")]
    pub request_id: String,
    #[serde(rename = "vnp_Version")]
    pub version: String,
    #[serde(rename = "vnp_Command")]
    pub command: &'static str,
    #[serde(rename = "vnp_TmnCode")]
    pub tmn_code: String,
    #[serde(rename = "vnp_TxnRef")]
    pub txn_ref: String,
    #[serde(rename = "vnp_OrderInfo")]
    pub order_info: String,
    #[serde(rename = "vnp_TransactionNo", skip_serializing_if = "Option::is_none")]
    pub transaction_no: Option<String>,
    #[serde(rename = "vnp_TransactionDate")]
    pub transaction_date: String,
    #[serde(rename = "vnp_CreateDate")]
    pub create_date: String,
    #[serde(rename = "vnp_IpAddr")]
    pub ip_addr: String,
    #[serde(rename = "vnp_SecureHash")]
    pub secure_hash: String,
}

impl QueryDrPayload {
    pub fn signed_fields(&self) -> Vec<&str> {
        vec![
            self.request_id.as_str(),
            self.version.as_str(),
            self.command,
            self.tmn_code.as_str(),
            self.txn_ref.as_str(),
            self.transaction_date.as_str(),
            self.create_date.as_str(),
            self.ip_addr.as_str(),
            self.order_info.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RefundPayload {
    #[serde(rename = "vnp_RequestId")]
    pub request_id: String,
    #[serde(rename = "vnp_Version")]
    pub version: String,
    #[serde(rename = "vnp_Command")]
    pub command: &'static str,
    #[serde(rename = "vnp_TmnCode")]
    pub tmn_code: String,
    #[serde(rename = "vnp_TransactionType")]
    pub transaction_type: &'static str,
    #[serde(rename = "vnp_TxnRef")]
    pub txn_ref: String,
    #[serde(rename = "vnp_Amount")]
    pub amount: String,
    #[serde(rename = "vnp_OrderInfo")]
    pub order_info: String,
    #[serde(rename = "vnp_TransactionNo")]
    pub transaction_no: String,
    #[serde(rename = "vnp_TransactionDate")]
    pub transaction_date: String,
    #[serde(rename = "vnp_CreateBy")]
    pub create_by: String,
    #[serde(rename = "vnp_CreateDate")]
    pub create_date: String,
    #[serde(rename = "vnp_IpAddr")]
    pub ip_addr: String,
    #[serde(rename = "vnp_SecureHash")]
    pub secure_hash: String,
}

impl RefundPayload {
    pub fn signed_fields(&self) -> Vec<&str> {
        vec![
            self.request_id.as_str(),
            self.version.as_str(),
            self.command,
            self.tmn_code.as_str(),
            self.transaction_type,
            self.txn_ref.as_str(),
            self.amount.as_str(),
            self.transaction_no.as_str(),
            self.transaction_date.as_str(),
            self.create_by.as_str(),
            self.create_date.as_str(),
            self.ip_addr.as_str(),
            self.order_info.as_str(),
        ]
    }
}
