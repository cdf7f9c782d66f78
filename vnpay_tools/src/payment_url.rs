use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use shop_common::{Money, SHOP_CURRENCY_CODE};

use crate::{
    helpers::format_gateway_time,
    signing::{encode_component, VnpaySigner, SECURE_HASH_FIELD},
    VnpayApiError,
    VnpayConfig,
};

const PAY_COMMAND: &str = "pay";
const DEFAULT_ORDER_TYPE: &str = "other";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Vn,
    En,
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::Vn => write!(f, "vn"),
            Locale::En => write!(f, "en"),
        }
    }
}

impl FromStr for Locale {
    type Err = VnpayApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vn" => Ok(Self::Vn),
            "en" => Ok(Self::En),
            s => Err(VnpayApiError::InvalidRequest(format!("Unsupported locale: {s}"))),
        }
    }
}

/// The details of a single outbound payment.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// The shop's order number. This is sent as `vnp_TxnRef` and comes back in every callback.
    pub order_number: String,
    pub amount: Money,
    pub locale: Locale,
    pub bank_code: Option<String>,
    pub client_ip: String,
    pub order_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentRequest {
    pub fn new<S: Into<String>>(order_number: S, amount: Money, client_ip: S) -> Self {
        Self {
            order_number: order_number.into(),
            amount,
            locale: Locale::default(),
            bank_code: None,
            client_ip: client_ip.into(),
            order_info: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_bank_code(mut self, bank_code: Option<String>) -> Self {
        self.bank_code = bank_code.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_order_info<S: Into<String>>(mut self, info: S) -> Self {
        self.order_info = Some(info.into());
        self
    }

    pub fn created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.created_at = ts;
        self
    }

    fn validate(&self) -> Result<(), VnpayApiError> {
        if self.order_number.trim().is_empty() {
            return Err(VnpayApiError::InvalidRequest("An order number is required".into()));
        }
        if !self.amount.is_positive() {
            return Err(VnpayApiError::InvalidRequest(format!("Amount must be positive, not {}", self.amount)));
        }
        Ok(())
    }
}

/// Assembles and signs the redirect URL for the hosted payment page.
pub fn build_payment_url(config: &VnpayConfig, request: &PaymentRequest) -> Result<String, VnpayApiError> {
    request.validate()?;
    let amount = request.amount.value().to_string();
    let locale = request.locale.to_string();
    let create_date = format_gateway_time(&request.created_at);
    let expire_date = format_gateway_time(&(request.created_at + config.expiry));
    let order_info =
        request.order_info.clone().unwrap_or_else(|| format!("Thanh toan don hang {}", request.order_number));
    let mut params = vec![
        ("vnp_Version", config.version.as_str()),
        ("vnp_Command", PAY_COMMAND),
        ("vnp_TmnCode", config.tmn_code.as_str()),
        ("vnp_Locale", locale.as_str()),
        ("vnp_CurrCode", SHOP_CURRENCY_CODE),
        ("vnp_TxnRef", request.order_number.as_str()),
        ("vnp_OrderInfo", order_info.as_str()),
        ("vnp_OrderType", DEFAULT_ORDER_TYPE),
        ("vnp_Amount", amount.as_str()),
        ("vnp_ReturnUrl", config.return_url.as_str()),
        ("vnp_IpAddr", request.client_ip.as_str()),
        ("vnp_CreateDate", create_date.as_str()),
        ("vnp_ExpireDate", expire_date.as_str()),
    ];
    if let Some(bank_code) = &request.bank_code {
        params.push(("vnp_BankCode", bank_code.as_str()));
    }
    let signer = VnpaySigner::new(config.hash_secret.clone());
    let (query, signature) = signer.sign_params(params);
    debug!("💳️ Payment URL built for order {} ({})", request.order_number, request.amount);
    Ok(format!("{}?{query}&{}={signature}", config.payment_url, encode_component(SECURE_HASH_FIELD)))
}
