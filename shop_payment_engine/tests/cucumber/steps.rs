use std::time::Duration;

use cucumber::{then, when};
use shop_payment_engine::{
    db_types::{LineItemRequest, Money, OrderStatusType, PaymentStatusType},
    order_objects::{CallbackChannel, Caller, NewOrderRequest, ReconciliationOutcome},
    test_utils::seed::{customer, stock_of},
    CatalogManagement,
    OrderFlowError,
    OrderManagement,
};
use vnpay_tools::{helpers::signed_callback_params, verify_callback, VnpayApiError, VnpaySigner, SECURE_HASH_FIELD};

use crate::cucumber::ShopWorld;

async fn place_order(world: &mut ShopWorld, user_id: &str, items: Vec<LineItemRequest>) {
    let request = NewOrderRequest::new(customer(), items);
    match world.orders().create_order(user_id, request).await {
        Ok(order) => {
            world.last_order = Some(order);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "'{word}' orders {int} of {string}")]
async fn order_one(world: &mut ShopWorld, user_id: String, qty: i64, name: String) {
    let items = vec![LineItemRequest::new(world.product(&name).id, qty)];
    place_order(world, &user_id, items).await;
}

#[when(expr = "'{word}' orders {int} of {string} and {int} of {string}")]
async fn order_two(world: &mut ShopWorld, user_id: String, qty1: i64, name1: String, qty2: i64, name2: String) {
    let items =
        vec![LineItemRequest::new(world.product(&name1).id, qty1), LineItemRequest::new(world.product(&name2).id, qty2)];
    place_order(world, &user_id, items).await;
}

#[when(expr = "the gateway reports code '{word}' for the order via {word}")]
async fn gateway_callback(world: &mut ShopWorld, code: String, channel: String) {
    let order = &world.last_order().order;
    let (number, amount) = (order.order_number.clone(), order.total_amount);
    report_payment(world, &number, amount, &code, &channel).await;
}

#[when(expr = "the gateway reports code '{word}' for the order via {word} with an amount of {int} VND")]
async fn gateway_callback_with_amount(world: &mut ShopWorld, code: String, channel: String, amount: i64) {
    let number = world.last_order().order.order_number.clone();
    report_payment(world, &number, Money::from_vnd(amount), &code, &channel).await;
}

async fn report_payment(
    world: &mut ShopWorld,
    number: &shop_payment_engine::db_types::OrderNumber,
    amount: Money,
    code: &str,
    channel: &str,
) {
    let channel = match channel {
        "ipn" => CallbackChannel::Ipn,
        "return" => CallbackChannel::Return,
        _ => panic!("Unknown callback channel {channel}"),
    };
    let sys = world.system();
    let signer = VnpaySigner::new(sys.config.hash_secret.clone());
    let params = signed_callback_params(&signer, number.as_str(), amount, code);
    let callback = verify_callback(&sys.config, &params).expect("Callback did not verify");
    let outcome = sys.payments.reconcile(&callback, channel).await.expect("Error reconciling callback");
    world.last_outcome = Some(outcome);
}

#[when(expr = "a callback with code '{word}' and a tampered signature arrives for the order")]
async fn tampered_callback(world: &mut ShopWorld, code: String) {
    let sys = world.system();
    let order = &world.last_order().order;
    let signer = VnpaySigner::new(sys.config.hash_secret.clone());
    let mut params = signed_callback_params(&signer, order.order_number.as_str(), order.total_amount, &code);
    let mut hash = params.remove(SECURE_HASH_FIELD).expect("Callback is not signed");
    let last = if hash.ends_with('0') { '1' } else { '0' };
    hash.pop();
    hash.push(last);
    params.insert(SECURE_HASH_FIELD.to_string(), hash);
    match verify_callback(&sys.config, &params) {
        Ok(cb) => {
            let outcome = sys.payments.reconcile(&cb, CallbackChannel::Ipn).await.expect("Error reconciling callback");
            world.last_outcome = Some(outcome);
        },
        Err(e) => world.last_callback_error = Some(e),
    }
}

#[when(expr = "an admin sets the payment status of the order to '{word}'")]
async fn admin_payment_status(world: &mut ShopWorld, status: String) {
    let id = world.last_order().order.id;
    let status = status.parse::<PaymentStatusType>().expect("Invalid payment status");
    world.orders().update_payment_status(id, status, &Caller::admin("admin")).await.expect("Error updating payment");
}

#[when(expr = "an admin sets the status of the order to '{word}'")]
async fn admin_order_status(world: &mut ShopWorld, status: String) {
    let id = world.last_order().order.id;
    let status = status.parse::<OrderStatusType>().expect("Invalid order status");
    world.orders().update_order_status(id, status, &Caller::admin("admin")).await.expect("Error updating order");
}

#[when(expr = "'{word}' cancels the order")]
async fn cancel_order(world: &mut ShopWorld, user_id: String) {
    let id = world.last_order().order.id;
    match world.orders().cancel_order(id, &Caller::user(user_id), "Cancelled by customer").await {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut ShopWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "the order total is {int} VND")]
async fn order_total(world: &mut ShopWorld, total: i64) {
    assert!(world.last_error.is_none(), "Order failed: {:?}", world.last_error);
    assert_eq!(world.last_order().order.total_amount, Money::from_vnd(total), "Total is incorrect");
}

#[then(expr = "the order has {int} lines")]
async fn order_lines(world: &mut ShopWorld, count: usize) {
    assert_eq!(world.last_order().lines.len(), count, "Number of order lines is incorrect");
}

#[then(expr = "the stock of {string} is {int}")]
async fn stock_level(world: &mut ShopWorld, name: String, stock: i64) {
    let id = world.product(&name).id;
    assert_eq!(stock_of(world.db(), id).await, stock, "Stock of {name} is incorrect");
}

#[then(expr = "the cart of '{word}' is empty")]
async fn cart_is_empty(world: &mut ShopWorld, user_id: String) {
    let cart = world.db().fetch_cart(&user_id).await.expect("Error fetching cart");
    assert!(cart.is_empty(), "Cart of {user_id} still holds {} items", cart.len());
}

#[then(expr = "the cart of '{word}' has {int} items")]
async fn cart_items(world: &mut ShopWorld, user_id: String, count: usize) {
    let cart = world.db().fetch_cart(&user_id).await.expect("Error fetching cart");
    assert_eq!(cart.len(), count, "Cart of {user_id} is incorrect");
}

#[then(expr = "'{word}' has {int} orders")]
async fn order_count(world: &mut ShopWorld, user_id: String, count: usize) {
    let orders = world.db().fetch_orders_for_user(&user_id).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count, "Number of orders for {user_id} is incorrect");
}

#[then(expr = "the order has status '{word}' and payment status '{word}'")]
async fn order_state(world: &mut ShopWorld, status: String, payment_status: String) {
    let id = world.last_order().order.id;
    let order = world.db().fetch_order_by_id(id).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.status.to_string(), status, "Status is incorrect");
    assert_eq!(order.payment_status.to_string(), payment_status, "Payment status is incorrect");
}

#[then(expr = "the order has {int} audit entries")]
async fn audit_entries(world: &mut ShopWorld, count: usize) {
    let id = world.last_order().order.id;
    let log = world.db().fetch_audit_log(id).await.expect("Error fetching audit log");
    assert_eq!(log.len(), count, "Number of audit entries is incorrect");
}

#[then(expr = "the callback outcome is '{word}'")]
async fn callback_outcome(world: &mut ShopWorld, expected: String) {
    let outcome = world.last_outcome.take().expect("No callback was reconciled");
    let actual = match outcome {
        ReconciliationOutcome::Applied(_) => "applied",
        ReconciliationOutcome::AlreadySettled(_) => "already_settled",
        ReconciliationOutcome::Rejected(_) => "rejected",
    };
    assert_eq!(actual, expected, "Unexpected outcome: {outcome:?}");
}

#[then("the callback signature is rejected")]
async fn signature_rejected(world: &mut ShopWorld) {
    assert!(world.last_outcome.is_none(), "A tampered callback was reconciled");
    let err = world.last_callback_error.take().expect("The tampered callback was accepted");
    assert!(matches!(err, VnpayApiError::InvalidSignature), "Unexpected error: {err}");
}

#[then(expr = "the last operation failed with {string}")]
async fn last_error(world: &mut ShopWorld, expected: String) {
    let err = world.last_error.take().expect("The last operation succeeded");
    let matched = match expected.as_str() {
        "insufficient stock" => matches!(err, OrderFlowError::InsufficientStock { .. }),
        "not cancellable" => matches!(err, OrderFlowError::OrderNotCancellable { .. }),
        "not the owner" => matches!(err, OrderFlowError::NotOrderOwner),
        _ => panic!("Unknown error kind {expected}"),
    };
    assert!(matched, "Expected {expected}, got {err}");
}
