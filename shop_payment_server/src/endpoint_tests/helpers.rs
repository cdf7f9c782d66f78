use actix_web::{
    body::to_bytes,
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use shop_payment_engine::db_types::{
    Money,
    Order,
    OrderNumber,
    OrderStatusType,
    PaymentMethod,
    PaymentStatusType,
};

use crate::identity::{USER_ID_HEADER, USER_ROLES_HEADER};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub fn as_user(req: TestRequest, user_id: &str) -> TestRequest {
    req.insert_header((USER_ID_HEADER, user_id))
}

pub fn as_admin(req: TestRequest, user_id: &str) -> TestRequest {
    req.insert_header((USER_ID_HEADER, user_id)).insert_header((USER_ROLES_HEADER, "user,admin"))
}

/// Sends `req` to an app set up by `configure`. Errors raised by middleware are rendered the way the server would.
pub async fn send<F: FnOnce(&mut ServiceConfig)>(req: TestRequest, configure: F) -> TestResponse {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let headers = res.headers().clone();
            let body = test::read_body(res).await;
            TestResponse { status, headers, body: String::from_utf8_lossy(&body).into_owned() }
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let headers = res.headers().clone();
            let body = to_bytes(res.into_body()).await.unwrap_or_default();
            TestResponse { status, headers, body: String::from_utf8_lossy(&body).into_owned() }
        },
    }
}

/// A 200,000 VND order belonging to `user_id`.
pub fn sample_order(id: i64, user_id: &str, status: OrderStatusType, payment_status: PaymentStatusType) -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 10, 16, 8, 30, 0).unwrap();
    Order {
        id,
        order_number: OrderNumber::from(format!("ORD1729067400000{id:03}")),
        user_id: user_id.to_string(),
        customer_name: "Nguyen Van A".to_string(),
        customer_email: "a@example.vn".to_string(),
        customer_phone: "0901234567".to_string(),
        shipping_address: "1 Le Loi, District 1, Ho Chi Minh City".to_string(),
        subtotal: Money::from_vnd(200_000),
        shipping_fee: Money::default(),
        total_amount: Money::from_vnd(200_000),
        payment_method: PaymentMethod::default(),
        payment_status,
        status,
        notes: None,
        created_at,
        updated_at: created_at,
    }
}
