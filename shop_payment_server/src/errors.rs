use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use shop_payment_engine::{OrderFlowError, ReconciliationError};
use thiserror::Error;
use vnpay_tools::VnpayApiError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("No caller identity was provided.")]
    Unauthenticated,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state of the order. {0}")]
    Conflict(String),
    #[error("The payment gateway request failed. {0}")]
    GatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(_) | OrderFlowError::DuplicateOrderNumber(_) => {
                error!("💻️ Order ledger failure. {e}");
                Self::BackendError("The order could not be processed. Please try again later.".into())
            },
            OrderFlowError::EmptyOrder |
            OrderFlowError::InvalidQuantity { .. } |
            OrderFlowError::IncompleteCustomerInfo(_) |
            OrderFlowError::ProductNotFound(_) |
            OrderFlowError::InsufficientStock { .. } |
            OrderFlowError::InvalidTotal(_) |
            OrderFlowError::TotalOverflow |
            OrderFlowError::QueryError(_) => Self::InvalidRequestBody(e.to_string()),
            OrderFlowError::OrderIdNotFound(_) | OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::NotOrderOwner => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::OrderNotCancellable { .. } |
            OrderFlowError::OrderNotPayable { .. } |
            OrderFlowError::OrderModificationNoOp |
            OrderFlowError::OrderModificationForbidden(_) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        error!("💻️ Reconciliation failure. {e}");
        Self::BackendError("The payment could not be processed. Please try again later.".into())
    }
}

impl From<VnpayApiError> for ServerError {
    fn from(e: VnpayApiError) -> Self {
        match e {
            VnpayApiError::InvalidRequest(_) => Self::InvalidRequestBody(e.to_string()),
            VnpayApiError::Initialization(_) => Self::ConfigurationError(e.to_string()),
            _ => Self::GatewayError(e.to_string()),
        }
    }
}
