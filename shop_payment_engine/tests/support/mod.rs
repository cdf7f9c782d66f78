#![allow(dead_code)]
//! Shared setup for the engine integration tests.
use log::*;
use shop_payment_engine::{
    db_types::{FullOrder, LineItemRequest, Money, OrderNumber},
    events::EventProducers,
    order_objects::NewOrderRequest,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seed::customer,
    },
    OrderFlowApi,
    PaymentGatewayDatabase,
    PaymentReconciliationApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};
use vnpay_tools::{helpers::signed_callback_params, verify_callback, VerifiedCallback, VnpayConfig, VnpaySigner};

pub const TMN_CODE: &str = "TESTTMN1";
pub const HASH_SECRET: &str = "TESTSECRETKEY";

pub struct TestShop {
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub payments: PaymentReconciliationApi<SqliteDatabase>,
    pub config: VnpayConfig,
}

impl TestShop {
    pub fn db(&self) -> &SqliteDatabase {
        self.orders.db()
    }

    pub async fn place_order(&self, user_id: &str, items: &[(i64, i64)]) -> FullOrder {
        let items = items.iter().map(|(id, qty)| LineItemRequest::new(*id, *qty)).collect();
        let request = NewOrderRequest::new(customer(), items);
        self.orders.create_order(user_id, request).await.expect("Error placing order")
    }

    /// A callback as the gateway would sign it, passed through the same verification the server uses.
    pub fn callback(&self, order_number: &OrderNumber, amount: Money, response_code: &str) -> VerifiedCallback {
        let signer = VnpaySigner::new(self.config.hash_secret.clone());
        let params = signed_callback_params(&signer, order_number.as_str(), amount, response_code);
        verify_callback(&self.config, &params).expect("Test callback did not verify")
    }
}

pub async fn setup() -> TestShop {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> TestShop {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let orders = OrderFlowApi::new(db.clone(), producers.clone());
    let payments = PaymentReconciliationApi::new(db, producers);
    TestShop { orders, payments, config: VnpayConfig::new(TMN_CODE, HASH_SECRET) }
}

pub async fn tear_down(shop: TestShop) {
    let TestShop { mut orders, payments, .. } = shop;
    let url = orders.db().url().to_string();
    drop(payments);
    if let Err(e) = orders.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}
