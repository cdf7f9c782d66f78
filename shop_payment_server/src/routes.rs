//! Request handler definitions
//!
//! Define each route and its handler here. The payment gateway routes live in [`crate::payment_routes`].
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database or gateway call must therefore be awaited, never
//! blocked on.
//!
//! Routes that need a caller take an [`Identity`] argument, which rejects the request with a 401 if the identity headers
//! are missing. Routes that need a role are declared with `where requires [...]`, which wraps them in the ACL
//! middleware.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use shop_payment_engine::{
    db_types::OrderNumber,
    order_objects::{NewOrderRequest, OrderQueryFilter},
    traits::PaymentGatewayDatabase,
    OrderFlowApi,
};

use crate::{
    data_objects::{CancelOrderRequest, OrderSearchParams, OrderStatusUpdate, PaymentStatusUpdate},
    errors::ServerError,
    identity::{Identity, Role},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    "👍️\n"
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl PaymentGatewayDatabase);
/// Places an order for the caller. Prices and the shipping fee are filled in by the server.
pub async fn create_order<B: PaymentGatewayDatabase>(
    identity: Identity,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ New order request from {} with {} items", identity.user_id, request.items.len());
    let order = api.create_order(&identity.user_id, request).await?;
    info!("💻️ Order {} created for {}", order.order.order_number, identity.user_id);
    Ok(HttpResponse::Created().json(order))
}

route!(search_orders => Get "/orders/search" impl PaymentGatewayDatabase where requires [Role::Admin]);
pub async fn search_orders<B: PaymentGatewayDatabase>(
    query: web::Query<OrderSearchParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::try_from(query.into_inner())?;
    debug!("💻️ Order search: {filter:?}");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_number => Get "/orders/number/{order_number}" impl PaymentGatewayDatabase);
pub async fn order_by_number<B: PaymentGatewayDatabase>(
    identity: Identity,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = OrderNumber::from(path.into_inner());
    let order = api.fetch_order_by_number(&order_number, &identity.caller()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(orders_for_user => Get "/orders/user/{user_id}" impl PaymentGatewayDatabase);
/// The orders of a user, newest first. Users may only list their own orders.
pub async fn orders_for_user<B: PaymentGatewayDatabase>(
    identity: Identity,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let orders = api.orders_for_user(&user_id, &identity.caller()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl PaymentGatewayDatabase);
pub async fn order_by_id<B: PaymentGatewayDatabase>(
    identity: Identity,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = api.fetch_order(path.into_inner(), &identity.caller()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{id}/cancel" impl PaymentGatewayDatabase);
/// Cancels a pending or processing order and restores its stock. The body, with an optional reason, may be omitted.
pub async fn cancel_order<B: PaymentGatewayDatabase>(
    identity: Identity,
    path: web::Path<i64>,
    body: Option<web::Json<CancelOrderRequest>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let reason = body.and_then(|b| b.into_inner().reason).unwrap_or_default();
    let order = api.cancel_order(id, &identity.caller(), reason.trim()).await?;
    info!("💻️ Order {} cancelled by {}", order.order_number, identity.user_id);
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Patch "/orders/{id}/status" impl PaymentGatewayDatabase where requires [Role::Admin]);
pub async fn update_order_status<B: PaymentGatewayDatabase>(
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<OrderStatusUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let status = body.into_inner().status;
    let order = api.update_order_status(id, status, &identity.caller()).await?;
    info!("💻️ Order {} status set to {status} by {}", order.order_number, identity.user_id);
    Ok(HttpResponse::Ok().json(order))
}

route!(update_payment_status => Patch "/orders/{id}/payment-status" impl PaymentGatewayDatabase where requires [Role::Admin]);
pub async fn update_payment_status<B: PaymentGatewayDatabase>(
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<PaymentStatusUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let status = body.into_inner().payment_status;
    let order = api.update_payment_status(id, status, &identity.caller()).await?;
    info!("💻️ Order {} payment status set to {status} by {}", order.order_number, identity.user_id);
    Ok(HttpResponse::Ok().json(order))
}
