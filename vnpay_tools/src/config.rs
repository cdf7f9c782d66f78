use chrono::Duration;
use log::*;
use shop_common::Secret;

pub const DEFAULT_VNPAY_PAYMENT_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";
pub const DEFAULT_VNPAY_API_URL: &str = "https://sandbox.vnpayment.vn/merchant_webapi/api/transaction";
pub const DEFAULT_VNPAY_VERSION: &str = "2.1.0";
const DEFAULT_RETURN_URL: &str = "http://localhost:8360/payments/return";
const DEFAULT_EXPIRY_MINUTES: i64 = 15;

/// Merchant credentials and endpoints for the VNPay gateway.
///
/// The configuration is passed explicitly to every component that signs or verifies gateway traffic, so that tests
/// can use their own secrets and endpoints.
#[derive(Debug, Clone)]
pub struct VnpayConfig {
    /// The terminal (merchant) code assigned by VNPay
    pub tmn_code: String,
    /// The shared secret used to compute `vnp_SecureHash`
    pub hash_secret: Secret<String>,
    /// The base URL of the hosted payment page
    pub payment_url: String,
    /// The merchant web API endpoint (`querydr` and `refund`)
    pub api_url: String,
    /// Where VNPay sends the customer's browser after payment
    pub return_url: String,
    pub version: String,
    /// How long a payment URL stays valid
    pub expiry: Duration,
}

impl Default for VnpayConfig {
    fn default() -> Self {
        Self {
            tmn_code: String::default(),
            hash_secret: Secret::default(),
            payment_url: DEFAULT_VNPAY_PAYMENT_URL.to_string(),
            api_url: DEFAULT_VNPAY_API_URL.to_string(),
            return_url: DEFAULT_RETURN_URL.to_string(),
            version: DEFAULT_VNPAY_VERSION.to_string(),
            expiry: Duration::minutes(DEFAULT_EXPIRY_MINUTES),
        }
    }
}

impl VnpayConfig {
    pub fn new<S: Into<String>>(tmn_code: S, hash_secret: S) -> Self {
        Self { tmn_code: tmn_code.into(), hash_secret: Secret::new(hash_secret.into()), ..Default::default() }
    }

    pub fn with_return_url<S: Into<String>>(mut self, return_url: S) -> Self {
        self.return_url = return_url.into();
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let tmn_code = std::env::var("SPS_VNPAY_TMN_CODE").unwrap_or_else(|_| {
            warn!("SPS_VNPAY_TMN_CODE not set, using (probably useless) default");
            "DEMO0000".to_string()
        });
        let hash_secret = Secret::new(std::env::var("SPS_VNPAY_HASH_SECRET").unwrap_or_else(|_| {
            warn!("SPS_VNPAY_HASH_SECRET not set, using (probably useless) default");
            "00000000000000000000000000000000".to_string()
        }));
        let payment_url = std::env::var("SPS_VNPAY_URL").unwrap_or_else(|_| {
            info!("SPS_VNPAY_URL not set, using the sandbox payment page");
            DEFAULT_VNPAY_PAYMENT_URL.to_string()
        });
        let api_url = std::env::var("SPS_VNPAY_API_URL").unwrap_or_else(|_| {
            info!("SPS_VNPAY_API_URL not set, using the sandbox merchant API");
            DEFAULT_VNPAY_API_URL.to_string()
        });
        let return_url = std::env::var("SPS_VNPAY_RETURN_URL").unwrap_or_else(|_| {
            warn!("SPS_VNPAY_RETURN_URL not set, using {DEFAULT_RETURN_URL}");
            DEFAULT_RETURN_URL.to_string()
        });
        let expiry = std::env::var("SPS_VNPAY_EXPIRY_MINUTES")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("Invalid configuration value for SPS_VNPAY_EXPIRY_MINUTES. {e}"))
                    .ok()
            })
            .map(Duration::minutes)
            .unwrap_or_else(|| Duration::minutes(DEFAULT_EXPIRY_MINUTES));
        Self {
            tmn_code,
            hash_secret,
            payment_url,
            api_url,
            return_url,
            version: DEFAULT_VNPAY_VERSION.to_string(),
            expiry,
        }
    }
}
