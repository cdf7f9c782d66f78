use std::sync::Arc;

use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    data_objects::{QueryDrPayload, RefundPayload},
    helpers::{format_gateway_time, new_request_id},
    QueryTransactionRequest,
    QueryTransactionResponse,
    RefundRequest,
    RefundResponse,
    VnpayApiError,
    VnpayConfig,
    VnpaySigner,
};

const QUERY_COMMAND: &str = "querydr";
const REFUND_COMMAND: &str = "refund";

/// A client for the VNPay merchant web API.
#[derive(Clone)]
pub struct VnpayApi {
    config: VnpayConfig,
    signer: VnpaySigner,
    client: Arc<Client>,
}

impl VnpayApi {
    pub fn new(config: VnpayConfig) -> Result<Self, VnpayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| VnpayApiError::Initialization(e.to_string()))?;
        let signer = VnpaySigner::new(config.hash_secret.clone());
        Ok(Self { config, signer, client: Arc::new(client) })
    }

    pub fn config(&self) -> &VnpayConfig {
        &self.config
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, body: &B) -> Result<T, VnpayApiError> {
        let url = self.config.api_url.as_str();
        trace!("💳️ Sending merchant API request to {url}");
        let response =
            self.client.post(url).json(body).send().await.map_err(|e| VnpayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ Merchant API request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| VnpayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| VnpayApiError::RestResponseError(e.to_string()))?;
            Err(VnpayApiError::QueryError { status, message })
        }
    }

    fn check_response_signature(&self, fields: &[&str], signature: &str) -> Result<(), VnpayApiError> {
        if self.signer.verify(&fields.join("|"), signature) {
            Ok(())
        } else {
            warn!("💳️ Merchant API response signature mismatch");
            Err(VnpayApiError::InvalidResponseSignature)
        }
    }

    pub(crate) fn query_payload(&self, request: &QueryTransactionRequest) -> QueryDrPayload {
        let now = Utc::now();
        let mut payload = QueryDrPayload {
            request_id: new_request_id(&now),
            version: self.config.version.clone(),
            command: QUERY_COMMAND,
            tmn_code: self.config.tmn_code.clone(),
            txn_ref: request.order_number.clone(),
            order_info: format!("Truy van giao dich {}", request.order_number),
            transaction_no: request.transaction_no.clone(),
            transaction_date: format_gateway_time(&request.transaction_date),
            create_date: format_gateway_time(&now),
            ip_addr: request.client_ip.clone(),
            secure_hash: String::default(),
        };
        payload.secure_hash = self.signer.sign_fields(&payload.signed_fields());
        payload
    }

    pub(crate) fn refund_payload(&self, request: &RefundRequest) -> RefundPayload {
        let now = Utc::now();
        let mut payload = RefundPayload {
            request_id: new_request_id(&now),
            version: self.config.version.clone(),
            command: REFUND_COMMAND,
            tmn_code: self.config.tmn_code.clone(),
            transaction_type: request.refund_type.code(),
            txn_ref: request.order_number.clone(),
            amount: request.amount.value().to_string(),
            order_info: format!("Hoan tien don hang {}", request.order_number),
            transaction_no: request.transaction_no.clone().unwrap_or_default(),
            transaction_date: format_gateway_time(&request.transaction_date),
            create_by: request.created_by.clone(),
            create_date: format_gateway_time(&now),
            ip_addr: request.client_ip.clone(),
            secure_hash: String::default(),
        };
        payload.secure_hash = self.signer.sign_fields(&payload.signed_fields());
        payload
    }

    /// Asks the gateway for the current status of a transaction.
    pub async fn query_transaction(
        &self,
        request: &QueryTransactionRequest,
    ) -> Result<QueryTransactionResponse, VnpayApiError> {
        let payload = self.query_payload(request);
        debug!("💳️ Querying transaction status for {}", request.order_number);
        let response = self.post::<QueryTransactionResponse, _>(&payload).await?;
        self.check_response_signature(&response.signed_fields(), &response.secure_hash)?;
        info!("💳️ Transaction query for {} returned {}", request.order_number, response.response_code);
        Ok(response)
    }

    /// Requests a full or partial refund of a settled transaction.
    pub async fn refund(&self, request: &RefundRequest) -> Result<RefundResponse, VnpayApiError> {
        request.validate()?;
        let payload = self.refund_payload(request);
        debug!("💳️ Requesting {:?} refund of {} for {}", request.refund_type, request.amount, request.order_number);
        let response = self.post::<RefundResponse, _>(&payload).await?;
        self.check_response_signature(&response.signed_fields(), &response.secure_hash)?;
        info!("💳️ Refund request for {} returned {}", request.order_number, response.response_code);
        Ok(response)
    }
}
