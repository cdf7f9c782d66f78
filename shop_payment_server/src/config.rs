use std::env;

use log::*;
use shop_common::{helpers::parse_boolean_flag, Money};
use shop_payment_engine::helpers::DEFAULT_ORDER_PREFIX;
use vnpay_tools::VnpayConfig;

const DEFAULT_SPS_HOST: &str = "127.0.0.1";
const DEFAULT_SPS_PORT: u16 = 8360;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Flat shipping fee added to every order
    pub shipping_fee: Money,
    /// Prefix for generated order numbers
    pub order_prefix: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The storefront. Customers returning from the payment page are redirected to `{frontend_url}/payment/result`.
    pub frontend_url: String,
    pub vnpay: VnpayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPS_HOST.to_string(),
            port: DEFAULT_SPS_PORT,
            database_url: String::default(),
            shipping_fee: Money::default(),
            order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            vnpay: VnpayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPS_HOST").ok().unwrap_or_else(|| DEFAULT_SPS_HOST.into());
        let port = env::var("SPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPS_PORT. {e} Using the default, {DEFAULT_SPS_PORT}, instead."
                    );
                    DEFAULT_SPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPS_PORT);
        let database_url = env::var("SPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SPS_DATABASE_URL is not set. Please set it to the URL for the shop database.");
            String::default()
        });
        let shipping_fee = parse_shipping_fee(env::var("SPS_SHIPPING_FEE").ok());
        let order_prefix = env::var("SPS_ORDER_PREFIX").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
            info!("🪛️ SPS_ORDER_PREFIX is not set. Using {DEFAULT_ORDER_PREFIX}.");
            DEFAULT_ORDER_PREFIX.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("SPS_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SPS_USE_FORWARDED").ok(), false);
        let frontend_url = normalize_frontend_url(env::var("SPS_FRONTEND_URL").ok());
        let vnpay = VnpayConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            shipping_fee,
            order_prefix,
            use_x_forwarded_for,
            use_forwarded,
            frontend_url,
            vnpay,
        }
    }
}

/// The shipping fee is configured in whole đồng. Anything unparseable or negative falls back to zero.
fn parse_shipping_fee(value: Option<String>) -> Money {
    let Some(value) = value else {
        info!("🪛️ SPS_SHIPPING_FEE is not set. Orders will not carry a shipping fee.");
        return Money::default();
    };
    match value.trim().parse::<i64>() {
        Ok(fee) if fee >= 0 => Money::from_vnd(fee),
        Ok(fee) => {
            warn!("🪛️ SPS_SHIPPING_FEE cannot be negative ({fee}). Using 0 instead.");
            Money::default()
        },
        Err(e) => {
            warn!("🪛️ Invalid configuration value for SPS_SHIPPING_FEE ({value}). {e}. Using 0 instead.");
            Money::default()
        },
    }
}

fn normalize_frontend_url(value: Option<String>) -> String {
    match value.map(|s| s.trim().trim_end_matches('/').to_string()).filter(|s| !s.is_empty()) {
        Some(url) => url,
        None => {
            warn!("🪛️ SPS_FRONTEND_URL is not set. Customers will be sent to {DEFAULT_FRONTEND_URL} after paying.");
            DEFAULT_FRONTEND_URL.to_string()
        },
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that route handlers need. It deliberately excludes the gateway secret.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub frontend_url: String,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            frontend_url: config.frontend_url.clone(),
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}
