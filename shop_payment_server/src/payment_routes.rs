//! Payment gateway routes.
//!
//! * `POST /payments/create-url` builds the signed redirect to the hosted payment page.
//! * `GET /payments/return` is where the customer's browser lands after paying. It reconciles the payment and
//!   redirects to the storefront's result page.
//! * `GET /payments/ipn` is the gateway's server-to-server notification. It always answers `200 OK` with an
//!   [`IpnResponse`], since the gateway reads the outcome from the body and retries anything else.
//! * `POST /payments/query` and `POST /payments/refund` are administrative passthroughs to the merchant API.
//!
//! The return and IPN routes are unauthenticated. The gateway's signature is the only thing that vouches for them, so
//! nothing in a callback is looked at before [`verify_callback`] has accepted it.
use std::collections::HashMap;

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use log::*;
use shop_payment_engine::{
    db_types::{Money, OrderStatusType, PaymentStatusType},
    order_objects::{CallbackChannel, ReconciliationOutcome},
    traits::PaymentGatewayDatabase,
    OrderFlowApi,
    PaymentReconciliationApi,
};
use vnpay_tools::{
    build_payment_url,
    verify_callback,
    Locale,
    PaymentRequest,
    QueryTransactionRequest,
    RefundRequest,
    RefundType,
    VnpayApi,
    VnpayApiError,
};

use crate::{
    config::ServerOptions,
    data_objects::{CreatePaymentUrlRequest, IpnResponse, PaymentUrlResponse, QueryTransactionParams, RefundParams},
    errors::ServerError,
    helpers::{get_remote_ip, payment_result_url},
    identity::{Identity, Role},
    route,
};

const FALLBACK_CLIENT_IP: &str = "127.0.0.1";

fn client_ip(req: &HttpRequest, options: &ServerOptions) -> String {
    get_remote_ip(req, options.use_x_forwarded_for, options.use_forwarded)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| FALLBACK_CLIENT_IP.to_string())
}

route!(create_payment_url => Post "/payments/create-url" impl PaymentGatewayDatabase);
/// Produces the payment page URL for one of the caller's unpaid orders. The amount is always the stored order total.
pub async fn create_payment_url<B: PaymentGatewayDatabase>(
    req: HttpRequest,
    identity: Identity,
    body: web::Json<CreatePaymentUrlRequest>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<VnpayApi>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let CreatePaymentUrlRequest { order_id, locale, bank_code } = body.into_inner();
    let order = api.order_for_payment(order_id, &identity.caller()).await?;
    let locale = locale.as_deref().map(str::parse::<Locale>).transpose()?.unwrap_or_default();
    let ip = client_ip(&req, &options);
    let request = PaymentRequest::new(order.order_number.as_str(), order.total_amount, ip.as_str())
        .with_locale(locale)
        .with_bank_code(bank_code)
        .with_order_info(format!("Thanh toan don hang {}", order.order_number));
    let payment_url = build_payment_url(gateway.config(), &request)?;
    info!("💻️💳️ Payment URL created for order {} ({}) from {ip}", order.order_number, order.total_amount);
    Ok(HttpResponse::Ok().json(PaymentUrlResponse {
        payment_url,
        order_id: order.id,
        order_number: order.order_number,
        amount: order.total_amount,
    }))
}

route!(payment_return => Get "/payments/return" impl PaymentGatewayDatabase);
/// Reconciles the browser's copy of the callback and sends the customer on to the storefront.
///
/// The result page is told `success` if the order is paid and still live, `failed` if the payment failed or the order
/// had been cancelled, and `error` if the callback could not be trusted or applied. The stored state decides, not this callback's response code, so a customer who
/// returns after the IPN has already settled the order sees the same answer.
pub async fn payment_return<B: PaymentGatewayDatabase>(
    query: web::Query<HashMap<String, String>>,
    api: web::Data<PaymentReconciliationApi<B>>,
    gateway: web::Data<VnpayApi>,
    options: web::Data<ServerOptions>,
) -> HttpResponse {
    let params = query.into_inner();
    let mut result = vec![];
    match verify_callback(gateway.config(), &params) {
        Err(e) => {
            warn!("💻️💳️ Untrusted payment return. {e}");
            result.push(("status", "error".to_string()));
            if let Some(order_number) = params.get("vnp_TxnRef") {
                result.push(("orderNumber", order_number.clone()));
            }
            result.push(("code", IpnResponse::invalid_checksum().code));
        },
        Ok(callback) => {
            let outcome = api.reconcile(&callback, CallbackChannel::Return).await;
            let status = match &outcome {
                Ok(outcome) => match outcome.order() {
                    Some(order)
                        if order.payment_status == PaymentStatusType::Paid && order.status != OrderStatusType::Cancelled =>
                    {
                        "success"
                    },
                    Some(_) => "failed",
                    None => "error",
                },
                Err(e) => {
                    error!("💻️💳️ Could not reconcile payment return for {}. {e}", callback.order_number());
                    "error"
                },
            };
            debug!("💻️💳️ Payment return for {} resolved as {status}", callback.order_number());
            result.push(("status", status.to_string()));
            result.push(("orderNumber", callback.order_number().to_string()));
            if let Some(order) = outcome.as_ref().ok().and_then(ReconciliationOutcome::order) {
                result.push(("orderId", order.id.to_string()));
            }
            result.push(("amount", callback.amount().whole_vnd().to_string()));
            result.push(("code", callback.response_code().to_string()));
        },
    }
    let location = payment_result_url(&options.frontend_url, &result);
    HttpResponse::Found().insert_header((header::LOCATION, location)).finish()
}

route!(payment_ipn => Get "/payments/ipn" impl PaymentGatewayDatabase);
/// The gateway's instant payment notification.
pub async fn payment_ipn<B: PaymentGatewayDatabase>(
    query: web::Query<HashMap<String, String>>,
    api: web::Data<PaymentReconciliationApi<B>>,
    gateway: web::Data<VnpayApi>,
) -> HttpResponse {
    let params = query.into_inner();
    let reply = match verify_callback(gateway.config(), &params) {
        Err(VnpayApiError::MissingSignature | VnpayApiError::InvalidSignature) => IpnResponse::invalid_checksum(),
        Err(e) => {
            warn!("💻️🪝️ Unusable IPN call. {e}");
            IpnResponse::unknown_error()
        },
        Ok(callback) => match api.reconcile(&callback, CallbackChannel::Ipn).await {
            Ok(outcome) => IpnResponse::from(&outcome),
            Err(e) => {
                error!("💻️🪝️ Could not reconcile IPN for {}. {e}", callback.order_number());
                IpnResponse::unknown_error()
            },
        },
    };
    info!("💻️🪝️ IPN for {} answered with {}", params.get("vnp_TxnRef").map(String::as_str).unwrap_or("?"), reply.code);
    HttpResponse::Ok().json(reply)
}

route!(query_transaction => Post "/payments/query" impl PaymentGatewayDatabase where requires [Role::Admin]);
/// Asks the gateway for the status of an order's transaction.
pub async fn query_transaction<B: PaymentGatewayDatabase>(
    req: HttpRequest,
    identity: Identity,
    body: web::Json<QueryTransactionParams>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<VnpayApi>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let QueryTransactionParams { order_number, transaction_no } = body.into_inner();
    let order = api.fetch_order_by_number(&order_number, &identity.caller()).await?.order;
    let request = QueryTransactionRequest {
        order_number: order.order_number.to_string(),
        transaction_date: order.created_at,
        transaction_no,
        client_ip: client_ip(&req, &options),
    };
    let response = gateway.query_transaction(&request).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(refund => Post "/payments/refund" impl PaymentGatewayDatabase where requires [Role::Admin]);
/// Forwards a refund request for a paid order to the gateway. The order itself is not modified.
pub async fn refund<B: PaymentGatewayDatabase>(
    req: HttpRequest,
    identity: Identity,
    body: web::Json<RefundParams>,
    api: web::Data<OrderFlowApi<B>>,
    gateway: web::Data<VnpayApi>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let RefundParams { order_number, amount, transaction_no } = body.into_inner();
    let order = api.fetch_order_by_number(&order_number, &identity.caller()).await?.order;
    if order.payment_status != PaymentStatusType::Paid {
        return Err(ServerError::Conflict(format!(
            "Order {} cannot be refunded. Its payment is {}",
            order.order_number, order.payment_status
        )));
    }
    let amount = amount.map(Money::from_vnd).unwrap_or(order.total_amount);
    if !amount.is_positive() || amount > order.total_amount {
        return Err(ServerError::InvalidRequestBody(format!(
            "The refund amount must be between 1 and {}, not {amount}",
            order.total_amount
        )));
    }
    let refund_type = if amount == order.total_amount { RefundType::Full } else { RefundType::Partial };
    let request = RefundRequest {
        order_number: order.order_number.to_string(),
        amount,
        refund_type,
        transaction_date: order.created_at,
        transaction_no,
        created_by: identity.user_id.clone(),
        client_ip: client_ip(&req, &options),
    };
    info!("💻️💳️ {} requested a {refund_type:?} refund of {amount} for {}", identity.user_id, order.order_number);
    let response = gateway.refund(&request).await?;
    Ok(HttpResponse::Ok().json(response))
}
