use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::json;
use shop_payment_engine::{
    db_types::{FullOrder, Money, OrderStatusType, PaymentStatusType},
    events::EventProducers,
    OrderFlowApi,
};

use super::{
    helpers::{as_admin, as_user, sample_order, send},
    mocks::MockShopDatabase,
};
use crate::{
    routes::{
        CancelOrderRoute,
        CreateOrderRoute,
        OrderByIdRoute,
        SearchOrdersRoute,
        UpdateOrderStatusRoute,
        UpdatePaymentStatusRoute,
    },
    server::{json_config, query_config},
};

fn configure(db: MockShopDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(db, EventProducers::default()).with_shipping_fee(Money::from_vnd(30_000));
        cfg.app_data(web::Data::new(api))
            .app_data(json_config())
            .app_data(query_config())
            .service(CreateOrderRoute::<MockShopDatabase>::new())
            .service(SearchOrdersRoute::<MockShopDatabase>::new())
            .service(OrderByIdRoute::<MockShopDatabase>::new())
            .service(CancelOrderRoute::<MockShopDatabase>::new())
            .service(UpdateOrderStatusRoute::<MockShopDatabase>::new())
            .service(UpdatePaymentStatusRoute::<MockShopDatabase>::new());
    }
}

fn new_order_body() -> serde_json::Value {
    json!({
        "customer": {
            "name": "Nguyen Van A",
            "email": "a@example.vn",
            "phone": "0901234567",
            "address": "1 Le Loi, District 1, Ho Chi Minh City"
        },
        "items": [{ "product_id": 1, "quantity": 2 }]
    })
}

#[actix_web::test]
async fn create_order_requires_identity() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/orders").set_json(new_order_body());
    let res = send(req, configure(MockShopDatabase::new())).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, r#"{"error":"No caller identity was provided."}"#);
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDatabase::new();
    db.expect_create_order()
        .withf(|order| {
            order.user_id == "alice" && order.shipping_fee == Money::from_vnd(30_000) && order.items.len() == 1
        })
        .times(1)
        .returning(|order| {
            let mut stored = sample_order(7, &order.user_id, OrderStatusType::Pending, PaymentStatusType::Pending);
            stored.order_number = order.order_number.clone();
            Ok(FullOrder { order: stored, lines: vec![] })
        });
    let req = as_user(TestRequest::post().uri("/orders"), "alice").set_json(new_order_body());
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let body: serde_json::Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["id"], 7);
    assert_eq!(body["user_id"], "alice");
    assert!(body["order_number"].as_str().unwrap().starts_with("ORD"));
}

#[actix_web::test]
async fn create_order_with_missing_customer_details() {
    let _ = env_logger::try_init().ok();
    let mut body = new_order_body();
    body["customer"]["phone"] = json!(" ");
    let req = as_user(TestRequest::post().uri("/orders"), "alice").set_json(body);
    let res = send(req, configure(MockShopDatabase::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.contains("phone"), "{}", res.body);
}

#[actix_web::test]
async fn create_order_with_malformed_body() {
    let _ = env_logger::try_init().ok();
    let req = as_user(TestRequest::post().uri("/orders"), "alice")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"items\": ");
    let res = send(req, configure(MockShopDatabase::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.starts_with(r#"{"error":"#));
}

#[actix_web::test]
async fn search_requires_admin() {
    let _ = env_logger::try_init().ok();
    let req = as_user(TestRequest::get().uri("/orders/search?status=pending"), "alice");
    let res = send(req, configure(MockShopDatabase::new())).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.body.contains("Requires the roles: admin"), "{}", res.body);
}

#[actix_web::test]
async fn search_as_admin() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDatabase::new();
    db.expect_search_orders()
        .withf(|query| {
            query.status == Some(vec![OrderStatusType::Pending, OrderStatusType::Processing]) &&
                query.user_id.as_deref() == Some("alice")
        })
        .times(1)
        .returning(|_| Ok(vec![sample_order(1, "alice", OrderStatusType::Pending, PaymentStatusType::Pending)]));
    let req = as_admin(TestRequest::get().uri("/orders/search?user_id=alice&status=pending,processing"), "root");
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));
}

#[actix_web::test]
async fn search_with_unknown_status() {
    let _ = env_logger::try_init().ok();
    let req = as_admin(TestRequest::get().uri("/orders/search?status=lost"), "root");
    let res = send(req, configure(MockShopDatabase::new())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn fetch_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDatabase::new();
    db.expect_fetch_order_by_id()
        .returning(|id| Ok(Some(sample_order(id, "bob", OrderStatusType::Pending, PaymentStatusType::Pending))));
    let req = as_user(TestRequest::get().uri("/orders/3"), "alice");
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn fetch_own_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDatabase::new();
    db.expect_fetch_order_by_id()
        .returning(|id| Ok(Some(sample_order(id, "alice", OrderStatusType::Pending, PaymentStatusType::Pending))));
    db.expect_fetch_order_lines().times(1).returning(|_| Ok(vec![]));
    let req = as_user(TestRequest::get().uri("/orders/3"), "alice");
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["id"], 3);
    assert_eq!(body["lines"], json!([]));
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDatabase::new();
    db.expect_fetch_order_by_id().returning(|_| Ok(None));
    let req = as_admin(TestRequest::get().uri("/orders/404"), "root");
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn cancel_shipped_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDatabase::new();
    db.expect_fetch_order_by_id()
        .returning(|id| Ok(Some(sample_order(id, "alice", OrderStatusType::Shipped, PaymentStatusType::Paid))));
    db.expect_cancel_order().never();
    let req = as_user(TestRequest::post().uri("/orders/5/cancel"), "alice");
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn cancel_own_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDatabase::new();
    db.expect_fetch_order_by_id()
        .returning(|id| Ok(Some(sample_order(id, "alice", OrderStatusType::Pending, PaymentStatusType::Pending))));
    db.expect_cancel_order()
        .withf(|id, actor, reason| *id == 5 && actor == "user:alice" && reason == "Changed my mind")
        .times(1)
        .returning(|id, _, _| Ok(sample_order(id, "alice", OrderStatusType::Cancelled, PaymentStatusType::Pending)));
    let req = as_user(TestRequest::post().uri("/orders/5/cancel"), "alice")
        .set_json(json!({ "reason": " Changed my mind " }));
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["status"], "cancelled");
}

#[actix_web::test]
async fn order_status_requires_admin() {
    let _ = env_logger::try_init().ok();
    let req = as_user(TestRequest::patch().uri("/orders/5/status"), "alice").set_json(json!({ "status": "shipped" }));
    let res = send(req, configure(MockShopDatabase::new())).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn cancelled_orders_cannot_be_reopened() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDatabase::new();
    db.expect_fetch_order_by_id()
        .returning(|id| Ok(Some(sample_order(id, "alice", OrderStatusType::Cancelled, PaymentStatusType::Failed))));
    db.expect_update_order_status().never();
    let req = as_admin(TestRequest::patch().uri("/orders/5/status"), "root").set_json(json!({ "status": "processing" }));
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn admin_marks_order_paid() {
    let _ = env_logger::try_init().ok();
    let mut db = MockShopDatabase::new();
    db.expect_fetch_order_by_id()
        .returning(|id| Ok(Some(sample_order(id, "alice", OrderStatusType::Pending, PaymentStatusType::Pending))));
    db.expect_update_payment_status()
        .withf(|id, status, actor| *id == 5 && *status == PaymentStatusType::Paid && actor == "admin:root")
        .times(1)
        .returning(|id, status, _| Ok(Some(sample_order(id, "alice", OrderStatusType::Processing, status))));
    let req = as_admin(TestRequest::patch().uri("/orders/5/payment-status"), "root")
        .set_json(json!({ "payment_status": "paid" }));
    let res = send(req, configure(db)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["payment_status"], "paid");
    assert_eq!(body["status"], "processing");
}
