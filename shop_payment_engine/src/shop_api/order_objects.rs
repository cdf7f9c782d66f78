use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{CustomerInfo, LineItemRequest, Money, Order, OrderStatusType, PaymentMethod, PaymentStatusType},
    shop_api::errors::OrderFlowError,
};

//--------------------------------------         Caller          -------------------------------------------------------
/// The identity on whose behalf an operation is carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn user<S: Into<String>>(user_id: S) -> Self {
        Self { user_id: user_id.into(), is_admin: false }
    }

    pub fn admin<S: Into<String>>(user_id: S) -> Self {
        Self { user_id: user_id.into(), is_admin: true }
    }

    /// Administrators may access every order. Everyone else may only access their own.
    pub fn can_access(&self, order: &Order) -> bool {
        self.is_admin || order.is_owned_by(&self.user_id)
    }
}

impl Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_admin {
            write!(f, "admin:{}", self.user_id)
        } else {
            write!(f, "user:{}", self.user_id)
        }
    }
}

//--------------------------------------     NewOrderRequest     -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub customer: CustomerInfo,
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewOrderRequest {
    pub fn new(customer: CustomerInfo, items: Vec<LineItemRequest>) -> Self {
        Self { customer, items, payment_method: PaymentMethod::default(), notes: None }
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), OrderFlowError> {
        if self.items.is_empty() {
            return Err(OrderFlowError::EmptyOrder);
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(OrderFlowError::InvalidQuantity { product_id: item.product_id, quantity: item.quantity });
        }
        if let Some(field) = self.customer.missing_field() {
            return Err(OrderFlowError::IncompleteCustomerInfo(field.to_string()));
        }
        Ok(())
    }
}

//--------------------------------------    OrderQueryFilter     -------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub user_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
    pub payment_status: Option<Vec<PaymentStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatusType) -> Self {
        self.payment_status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.payment_status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
    }

    pub fn validate(&self) -> Result<(), OrderFlowError> {
        match (self.since, self.until) {
            (Some(since), Some(until)) if since > until => {
                Err(OrderFlowError::QueryError(format!("since ({since}) is after until ({until})")))
            },
            _ => Ok(()),
        }
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(user_id) = &self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(statuses) = &self.payment_status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "payment statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

//--------------------------------------     CallbackChannel     -------------------------------------------------------
/// The route by which a gateway callback reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackChannel {
    /// Server-to-server instant payment notification
    Ipn,
    /// The customer's browser, redirected back from the payment page
    Return,
}

impl Display for CallbackChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackChannel::Ipn => write!(f, "ipn"),
            CallbackChannel::Return => write!(f, "return"),
        }
    }
}

//--------------------------------------  ReconciliationOutcome  -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    OrderNotFound,
    AmountMismatch { expected: Money, received: Money },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    /// This callback settled the order. The order is returned in its new state.
    Applied(Order),
    /// The order had already been settled by an earlier callback. Nothing was written.
    AlreadySettled(Order),
    /// The callback could not be applied. Nothing was written.
    Rejected(RejectionReason),
}

impl ReconciliationOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            ReconciliationOutcome::Applied(o) | ReconciliationOutcome::AlreadySettled(o) => Some(o),
            ReconciliationOutcome::Rejected(_) => None,
        }
    }
}
