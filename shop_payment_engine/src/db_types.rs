use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use shop_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// The external, human-facing identifier of an order. It doubles as the gateway transaction reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been placed and is awaiting payment or processing.
    Pending,
    /// Payment has been received (or is not required up front) and the order is being prepared.
    Processing,
    Shipped,
    Delivered,
    /// The order has been cancelled by the customer, an administrator, or a failed payment.
    Cancelled,
}

impl OrderStatusType {
    /// Orders can only be cancelled before they leave the warehouse.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatusType::Pending | OrderStatusType::Processing)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Processing => write!(f, "processing"),
            OrderStatusType::Shipped => write!(f, "shipped"),
            OrderStatusType::Delivered => write!(f, "delivered"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------  PaymentStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatusType {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatusType {
    /// `Paid` and `Failed` are terminal. A payment status never returns to `Pending`.
    pub fn is_settled(&self) -> bool {
        !matches!(self, PaymentStatusType::Pending)
    }
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatusType::Pending => write!(f, "pending"),
            PaymentStatusType::Paid => write!(f, "paid"),
            PaymentStatusType::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentMethod      --------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Vnpay,
    /// Cash on delivery
    Cod,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Vnpay => write!(f, "vnpay"),
            PaymentMethod::Cod => write!(f, "cod"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vnpay" => Ok(Self::Vnpay),
            "cod" => Ok(Self::Cod),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------      CustomerInfo      --------------------------------------------------------
/// The customer's contact and shipping details, captured at the time the order is placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl CustomerInfo {
    pub fn new<S: Into<String>>(name: S, email: S, phone: S, address: S) -> Self {
        Self { name: name.into(), email: email.into(), phone: phone.into(), address: address.into() }
    }

    /// Returns the name of the first missing field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [("name", &self.name), ("email", &self.email), ("phone", &self.phone), ("address", &self.address)]
            .into_iter()
            .find(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k)
    }
}

//--------------------------------------         Order          --------------------------------------------------------
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub user_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatusType,
    pub status: OrderStatusType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn customer(&self) -> CustomerInfo {
        CustomerInfo::new(
            self.customer_name.as_str(),
            self.customer_email.as_str(),
            self.customer_phone.as_str(),
            self.shipping_address.as_str(),
        )
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

//--------------------------------------       OrderLine        --------------------------------------------------------
/// A line item of an order. The product name and unit price are snapshots taken when the order was placed.
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

//--------------------------------------       FullOrder        --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

//--------------------------------------     SettledPayment     --------------------------------------------------------
/// An order whose pending payment has just been settled.
///
/// `after_cancellation` is set when the customer had already cancelled the order. Its status and stock are left as
/// the cancellation put them, and only the payment status is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledPayment {
    pub order: Order,
    pub after_cancellation: bool,
}

impl SettledPayment {
    pub fn new(order: Order) -> Self {
        Self { order, after_cancellation: false }
    }

    pub fn after_cancellation(order: Order) -> Self {
        Self { order, after_cancellation: true }
    }
}

//--------------------------------------    LineItemRequest     --------------------------------------------------------
/// A product and quantity requested by the customer. Prices are never taken from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

impl LineItemRequest {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

//--------------------------------------        NewOrder        --------------------------------------------------------
/// A validated order, ready to be written to the ledger.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: String,
    pub customer: CustomerInfo,
    pub items: Vec<LineItemRequest>,
    pub payment_method: PaymentMethod,
    pub shipping_fee: Money,
    pub notes: Option<String>,
}

//--------------------------------------        Product         --------------------------------------------------------
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub sale_price: Option<Money>,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price a customer pays right now: the sale price if one is set, otherwise the list price.
    pub fn effective_price(&self) -> Money {
        self.sale_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub sale_price: Option<Money>,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Money, stock: i64) -> Self {
        Self { name: name.into(), price, sale_price: None, stock }
    }

    pub fn with_sale_price(mut self, sale_price: Money) -> Self {
        self.sale_price = Some(sale_price);
        self
    }
}

//--------------------------------------        CartItem        --------------------------------------------------------
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub user_id: String,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       AuditEntry       --------------------------------------------------------
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub order_id: i64,
    pub actor: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
