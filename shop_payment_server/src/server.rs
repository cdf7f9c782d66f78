use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use shop_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    helpers::OrderNumberGenerator,
    traits::PaymentGatewayDatabase,
    OrderFlowApi,
    PaymentReconciliationApi,
    SqliteDatabase,
};
use vnpay_tools::VnpayApi;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    payment_routes::{
        CreatePaymentUrlRoute,
        PaymentIpnRoute,
        PaymentReturnRoute,
        QueryTransactionRoute,
        RefundRoute,
    },
    routes::{
        health,
        CancelOrderRoute,
        CreateOrderRoute,
        OrderByIdRoute,
        OrderByNumberRoute,
        OrdersForUserRoute,
        SearchOrdersRoute,
        UpdateOrderStatusRoute,
        UpdatePaymentStatusRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;
const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("🚀️ Database ready at {}", config.database_url);
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that record settled and annulled orders in the log. Fulfilment integrations subscribe here.
fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_paid(|ev: OrderPaidEvent| {
            Box::pin(async move {
                info!("🪝️ Order {} has been paid ({})", ev.order.order_number, ev.order.total_amount);
            })
        })
        .on_order_annulled(|ev: OrderAnnulledEvent| {
            Box::pin(async move {
                info!(
                    "🪝️ Order {} has been annulled. Status: {}, payment: {}",
                    ev.order.order_number, ev.status, ev.payment_status
                );
            })
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway = VnpayApi::new(config.vnpay.clone())?;
    let options = ServerOptions::from_config(&config);
    let orders_api = OrderFlowApi::new(db.clone(), producers.clone())
        .with_shipping_fee(config.shipping_fee)
        .with_order_numbers(OrderNumberGenerator::new(config.order_prefix.as_str()));
    let payments_api = PaymentReconciliationApi::new(db, producers);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sps::access_log"))
            .app_data(web::Data::new(orders_api.clone()))
            .app_data(web::Data::new(payments_api.clone()))
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(options.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .configure(configure_routes::<SqliteDatabase>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The literal `/orders/search`, `/orders/number/..` and `/orders/user/..` paths must come
/// before `/orders/{id}`.
pub fn configure_routes<B: PaymentGatewayDatabase + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(CreateOrderRoute::<B>::new())
        .service(SearchOrdersRoute::<B>::new())
        .service(OrderByNumberRoute::<B>::new())
        .service(OrdersForUserRoute::<B>::new())
        .service(OrderByIdRoute::<B>::new())
        .service(CancelOrderRoute::<B>::new())
        .service(UpdateOrderStatusRoute::<B>::new())
        .service(UpdatePaymentStatusRoute::<B>::new())
        .service(CreatePaymentUrlRoute::<B>::new())
        .service(PaymentReturnRoute::<B>::new())
        .service(PaymentIpnRoute::<B>::new())
        .service(QueryTransactionRoute::<B>::new())
        .service(RefundRoute::<B>::new());
}

/// Malformed JSON bodies are reported in the same shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into())
}
