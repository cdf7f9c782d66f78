use std::collections::HashMap;

use actix_web::{
    http::{header, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use serde_json::json;
use shop_common::Secret;
use shop_payment_engine::{
    db_types::{Money, OrderNumber, OrderStatusType, PaymentStatusType, SettledPayment},
    events::EventProducers,
    OrderFlowApi,
    PaymentReconciliationApi,
};
use vnpay_tools::{canonical_query, helpers::signed_callback_params, VnpayApi, VnpayConfig, VnpaySigner};

use super::{
    helpers::{as_admin, as_user, sample_order, send},
    mocks::MockShopDatabase,
};
use crate::{
    config::ServerOptions,
    data_objects::IpnResponse,
    payment_routes::{CreatePaymentUrlRoute, PaymentIpnRoute, PaymentReturnRoute, RefundRoute},
    server::json_config,
};

const TMN_CODE: &str = "TESTTMN1";
const HASH_SECRET: &str = "TESTSECRETKEY";
const FRONTEND: &str = "https://shop.vn";

fn configure(db: MockShopDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let orders_api = OrderFlowApi::new(db.clone(), EventProducers::default());
        let payments_api = PaymentReconciliationApi::new(db.clone(), EventProducers::default());
        let gateway = VnpayApi::new(VnpayConfig::new(TMN_CODE, HASH_SECRET)).unwrap();
        let options = ServerOptions { frontend_url: FRONTEND.to_string(), ..ServerOptions::default() };
        cfg.app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(options))
            .app_data(json_config())
            .service(CreatePaymentUrlRoute::<MockShopDatabase>::new())
            .service(PaymentReturnRoute::<MockShopDatabase>::new())
            .service(PaymentIpnRoute::<MockShopDatabase>::new())
            .service(RefundRoute::<MockShopDatabase>::new());
    }
}

/// Mock clones do not share expectations, so every clone the APIs are built from is set up by `setup`.
fn mock_with<F: Fn(&mut MockShopDatabase) + Send + 'static>(setup: F) -> MockShopDatabase {
    let mut db = MockShopDatabase::new();
    db.expect_clone().returning(move || {
        let mut copy = MockShopDatabase::new();
        setup(&mut copy);
        copy
    });
    db
}

fn callback_uri(path: &str, order_number: &OrderNumber, amount: Money, code: &str) -> String {
    let signer = VnpaySigner::new(Secret::new(HASH_SECRET.to_string()));
    let params = signed_callback_params(&signer, order_number.as_str(), amount, code);
    format!("{path}?{}", query_string(&params))
}

fn query_string(params: &HashMap<String, String>) -> String {
    canonical_query(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn ipn_reply(body: &str) -> IpnResponse {
    serde_json::from_str(body).unwrap()
}

fn pending_order_lookup(db: &mut MockShopDatabase) {
    db.expect_fetch_order_by_number().returning(|n| {
        let mut order = sample_order(9, "alice", OrderStatusType::Pending, PaymentStatusType::Pending);
        order.order_number = n.clone();
        Ok(Some(order))
    });
}

#[actix_web::test]
async fn ipn_with_tampered_signature() {
    let _ = env_logger::try_init().ok();
    let order_number = OrderNumber::from("ORD1729067400000009");
    let uri = callback_uri("/payments/ipn", &order_number, Money::from_vnd(200_000), "00");
    let uri = uri.replace("vnp_Amount=20000000", "vnp_Amount=100");
    let db = mock_with(|db| {
        db.expect_fetch_order_by_number().never();
        db.expect_settle_pending_payment().never();
    });
    let res = send(TestRequest::get().uri(&uri), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(ipn_reply(&res.body), IpnResponse::invalid_checksum());
}

#[actix_web::test]
async fn ipn_without_signature() {
    let _ = env_logger::try_init().ok();
    let uri = "/payments/ipn?vnp_TxnRef=ORD1&vnp_Amount=20000000&vnp_ResponseCode=00";
    let res = send(TestRequest::get().uri(uri), configure(mock_with(|_| {}))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(ipn_reply(&res.body).code, "97");
}

#[actix_web::test]
async fn ipn_settles_pending_order() {
    let _ = env_logger::try_init().ok();
    let order_number = OrderNumber::from("ORD1729067400000009");
    let db = mock_with(|db| {
        pending_order_lookup(db);
        db.expect_settle_pending_payment()
            .withf(|_, outcome, actor| *outcome == PaymentStatusType::Paid && actor == "vnpay:ipn")
            .times(1)
            .returning(|n, outcome, _| {
                let mut order = sample_order(9, "alice", OrderStatusType::Processing, outcome);
                order.order_number = n.clone();
                Ok(Some(SettledPayment::new(order)))
            });
        db.expect_clear_cart().returning(|_| Ok(2));
    });
    let uri = callback_uri("/payments/ipn", &order_number, Money::from_vnd(200_000), "00");
    let res = send(TestRequest::get().uri(&uri), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(ipn_reply(&res.body), IpnResponse::confirm_success());
}

#[actix_web::test]
async fn ipn_for_settled_order() {
    let _ = env_logger::try_init().ok();
    let order_number = OrderNumber::from("ORD1729067400000009");
    let db = mock_with(|db| {
        db.expect_fetch_order_by_number().returning(|n| {
            let mut order = sample_order(9, "alice", OrderStatusType::Processing, PaymentStatusType::Paid);
            order.order_number = n.clone();
            Ok(Some(order))
        });
        db.expect_settle_pending_payment().never();
    });
    let uri = callback_uri("/payments/ipn", &order_number, Money::from_vnd(200_000), "00");
    let res = send(TestRequest::get().uri(&uri), configure(db)).await;
    assert_eq!(ipn_reply(&res.body), IpnResponse::already_confirmed());
}

#[actix_web::test]
async fn ipn_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let db = mock_with(|db| {
        db.expect_fetch_order_by_number().returning(|_| Ok(None));
    });
    let uri = callback_uri("/payments/ipn", &OrderNumber::from("ORD404"), Money::from_vnd(200_000), "00");
    let res = send(TestRequest::get().uri(&uri), configure(db)).await;
    assert_eq!(ipn_reply(&res.body), IpnResponse::order_not_found());
}

#[actix_web::test]
async fn ipn_with_wrong_amount() {
    let _ = env_logger::try_init().ok();
    let db = mock_with(|db| {
        pending_order_lookup(db);
        db.expect_settle_pending_payment().never();
    });
    let uri = callback_uri("/payments/ipn", &OrderNumber::from("ORD7"), Money::from_vnd(100_000), "00");
    let res = send(TestRequest::get().uri(&uri), configure(db)).await;
    assert_eq!(ipn_reply(&res.body), IpnResponse::invalid_amount());
}

#[actix_web::test]
async fn ipn_store_failure() {
    let _ = env_logger::try_init().ok();
    let db = mock_with(|db| {
        db.expect_fetch_order_by_number()
            .returning(|_| Err(shop_payment_engine::OrderFlowError::DatabaseError("database is locked".into())));
    });
    let uri = callback_uri("/payments/ipn", &OrderNumber::from("ORD7"), Money::from_vnd(200_000), "00");
    let res = send(TestRequest::get().uri(&uri), configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(ipn_reply(&res.body), IpnResponse::unknown_error());
}

#[actix_web::test]
async fn return_redirects_to_result_page() {
    let _ = env_logger::try_init().ok();
    let order_number = OrderNumber::from("ORD1729067400000009");
    let db = mock_with(|db| {
        pending_order_lookup(db);
        db.expect_settle_pending_payment()
            .withf(|_, _, actor| actor == "vnpay:return")
            .times(1)
            .returning(|n, outcome, _| {
                let mut order = sample_order(9, "alice", OrderStatusType::Processing, outcome);
                order.order_number = n.clone();
                Ok(Some(SettledPayment::new(order)))
            });
        db.expect_clear_cart().returning(|_| Ok(0));
    });
    let uri = callback_uri("/payments/return", &order_number, Money::from_vnd(200_000), "00");
    let res = send(TestRequest::get().uri(&uri), configure(db)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    let location = res.headers.get(header::LOCATION).and_then(|v| v.to_str().ok()).unwrap();
    assert_eq!(
        location,
        "https://shop.vn/payment/result?status=success&orderNumber=ORD1729067400000009&orderId=9&amount=200000&code=00"
    );
}

#[actix_web::test]
async fn return_after_failed_payment() {
    let _ = env_logger::try_init().ok();
    let order_number = OrderNumber::from("ORD1729067400000009");
    let db = mock_with(|db| {
        pending_order_lookup(db);
        db.expect_settle_pending_payment()
            .withf(|_, outcome, _| *outcome == PaymentStatusType::Failed)
            .returning(|n, outcome, _| {
                let mut order = sample_order(9, "alice", OrderStatusType::Cancelled, outcome);
                order.order_number = n.clone();
                Ok(Some(SettledPayment::new(order)))
            });
    });
    let uri = callback_uri("/payments/return", &order_number, Money::from_vnd(200_000), "24");
    let res = send(TestRequest::get().uri(&uri), configure(db)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    let location = res.headers.get(header::LOCATION).and_then(|v| v.to_str().ok()).unwrap();
    assert!(location.starts_with("https://shop.vn/payment/result?status=failed&"), "{location}");
    assert!(location.ends_with("&code=24"), "{location}");
}

#[actix_web::test]
async fn return_for_order_cancelled_before_payment() {
    let _ = env_logger::try_init().ok();
    let order_number = OrderNumber::from("ORD1729067400000009");
    let db = mock_with(|db| {
        pending_order_lookup(db);
        db.expect_settle_pending_payment().returning(|n, outcome, _| {
            let mut order = sample_order(9, "alice", OrderStatusType::Cancelled, outcome);
            order.order_number = n.clone();
            Ok(Some(SettledPayment::after_cancellation(order)))
        });
        db.expect_clear_cart().never();
    });
    let uri = callback_uri("/payments/return", &order_number, Money::from_vnd(200_000), "00");
    let res = send(TestRequest::get().uri(&uri), configure(db)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    let location = res.headers.get(header::LOCATION).and_then(|v| v.to_str().ok()).unwrap();
    assert!(location.starts_with("https://shop.vn/payment/result?status=failed&"), "{location}");
    assert!(location.ends_with("&code=00"), "{location}");
}

#[actix_web::test]
async fn return_with_bad_signature() {
    let _ = env_logger::try_init().ok();
    let uri = "/payments/return?vnp_TxnRef=ORD1&vnp_Amount=20000000&vnp_ResponseCode=00&vnp_SecureHash=abcdef";
    let res = send(TestRequest::get().uri(uri), configure(mock_with(|_| {}))).await;
    assert_eq!(res.status, StatusCode::FOUND);
    let location = res.headers.get(header::LOCATION).and_then(|v| v.to_str().ok()).unwrap();
    assert_eq!(location, "https://shop.vn/payment/result?status=error&orderNumber=ORD1&code=97");
}

#[actix_web::test]
async fn create_payment_url_for_own_order() {
    let _ = env_logger::try_init().ok();
    let db = mock_with(|db| {
        db.expect_fetch_order_by_id()
            .returning(|id| Ok(Some(sample_order(id, "alice", OrderStatusType::Pending, PaymentStatusType::Pending))));
    });
    let req = as_user(TestRequest::post().uri("/payments/create-url"), "alice")
        .set_json(json!({ "order_id": 9, "locale": "en" }));
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&res.body).unwrap();
    let url = body["payment_url"].as_str().unwrap();
    assert!(url.contains("vnp_Amount=20000000"), "{url}");
    assert!(url.contains("vnp_Locale=en"), "{url}");
    assert!(url.contains("vnp_TxnRef=ORD1729067400000009"), "{url}");
    assert!(url.contains("vnp_SecureHash="), "{url}");
    assert_eq!(body["order_id"], 9);
}

#[actix_web::test]
async fn create_payment_url_for_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let db = mock_with(|db| {
        db.expect_fetch_order_by_id()
            .returning(|id| Ok(Some(sample_order(id, "bob", OrderStatusType::Pending, PaymentStatusType::Pending))));
    });
    let req = as_user(TestRequest::post().uri("/payments/create-url"), "alice").set_json(json!({ "order_id": 9 }));
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn create_payment_url_for_paid_order() {
    let _ = env_logger::try_init().ok();
    let db = mock_with(|db| {
        db.expect_fetch_order_by_id()
            .returning(|id| Ok(Some(sample_order(id, "alice", OrderStatusType::Processing, PaymentStatusType::Paid))));
    });
    let req = as_user(TestRequest::post().uri("/payments/create-url"), "alice").set_json(json!({ "order_id": 9 }));
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn refund_requires_admin() {
    let _ = env_logger::try_init().ok();
    let req = as_user(TestRequest::post().uri("/payments/refund"), "alice")
        .set_json(json!({ "order_number": "ORD1729067400000009" }));
    let res = send(req, configure(mock_with(|_| {}))).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn refund_of_unpaid_order() {
    let _ = env_logger::try_init().ok();
    let db = mock_with(|db| {
        pending_order_lookup(db);
        db.expect_fetch_order_lines().returning(|_| Ok(vec![]));
    });
    let req = as_admin(TestRequest::post().uri("/payments/refund"), "root")
        .set_json(json!({ "order_number": "ORD1729067400000009" }));
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn refund_more_than_was_paid() {
    let _ = env_logger::try_init().ok();
    let db = mock_with(|db| {
        db.expect_fetch_order_by_number().returning(|n| {
            let mut order = sample_order(9, "alice", OrderStatusType::Processing, PaymentStatusType::Paid);
            order.order_number = n.clone();
            Ok(Some(order))
        });
        db.expect_fetch_order_lines().returning(|_| Ok(vec![]));
    });
    let req = as_admin(TestRequest::post().uri("/payments/refund"), "root")
        .set_json(json!({ "order_number": "ORD1729067400000009", "amount": 250000 }));
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
