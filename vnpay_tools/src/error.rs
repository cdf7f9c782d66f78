use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum VnpayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),
    #[error("The callback did not carry a secure hash")]
    MissingSignature,
    #[error("The secure hash does not match the callback parameters")]
    InvalidSignature,
    #[error("The callback parameters are malformed: {0}")]
    MalformedCallback(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The gateway response carried an invalid secure hash")]
    InvalidResponseSignature,
}
