use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{FullOrder, Money, NewOrder, Order, OrderNumber, OrderStatusType, PaymentStatusType},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    helpers::OrderNumberGenerator,
    order_objects::{Caller, NewOrderRequest, OrderQueryFilter},
    traits::PaymentGatewayDatabase,
    OrderFlowError,
};

const MAX_ORDER_NUMBER_ATTEMPTS: usize = 3;

/// `OrderFlowApi` is the order ledger: it places, fetches, cancels and administratively updates orders.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    order_numbers: Arc<OrderNumberGenerator>,
    shipping_fee: Money,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi (prefix {}, shipping fee {})", self.order_numbers.prefix(), self.shipping_fee)
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            producers: self.producers.clone(),
            order_numbers: Arc::clone(&self.order_numbers),
            shipping_fee: self.shipping_fee,
        }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, order_numbers: Arc::new(OrderNumberGenerator::default()), shipping_fee: Money::default() }
    }

    pub fn with_shipping_fee(mut self, fee: Money) -> Self {
        self.shipping_fee = fee;
        self
    }

    pub fn with_order_numbers(mut self, generator: OrderNumberGenerator) -> Self {
        self.order_numbers = Arc::new(generator);
        self
    }

    pub fn shipping_fee(&self) -> Money {
        self.shipping_fee
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Places a new order for `user_id`.
    ///
    /// Prices come from the catalogue, never from the request. The order, its lines, the stock reservations and the
    /// emptying of the cart are written atomically. If the generated order number happens to collide with an existing
    /// one, a fresh number is tried.
    pub async fn create_order(&self, user_id: &str, request: NewOrderRequest) -> Result<FullOrder, OrderFlowError> {
        request.validate()?;
        let NewOrderRequest { customer, items, payment_method, notes } = request;
        let mut new_order = NewOrder {
            order_number: self.order_numbers.next(),
            user_id: user_id.to_string(),
            customer,
            items,
            payment_method,
            shipping_fee: self.shipping_fee,
            notes,
        };
        let mut attempt = 1;
        loop {
            match self.db.create_order(new_order.clone()).await {
                Ok(order) => {
                    info!(
                        "🔄️📦️ Order {} placed by {user_id} for {} ({} lines)",
                        order.order.order_number,
                        order.order.total_amount,
                        order.lines.len()
                    );
                    return Ok(order);
                },
                Err(OrderFlowError::DuplicateOrderNumber(n)) if attempt < MAX_ORDER_NUMBER_ATTEMPTS => {
                    warn!("🔄️📦️ Order number {n} is taken. Retrying with a new number");
                    attempt += 1;
                    new_order.order_number = self.order_numbers.next();
                },
                Err(e) => {
                    debug!("🔄️📦️ Could not place order for {user_id}. {e}");
                    return Err(e);
                },
            }
        }
    }

    async fn with_lines(&self, order: Order) -> Result<FullOrder, OrderFlowError> {
        let lines = self.db.fetch_order_lines(order.id).await?;
        Ok(FullOrder { order, lines })
    }

    /// Fetches an order by its internal id. Only its owner or an administrator may see it.
    pub async fn fetch_order(&self, id: i64, caller: &Caller) -> Result<FullOrder, OrderFlowError> {
        let order = self.db.fetch_order_by_id(id).await?.ok_or(OrderFlowError::OrderIdNotFound(id))?;
        if !caller.can_access(&order) {
            debug!("🔄️📦️ {caller} tried to access order {}", order.order_number);
            return Err(OrderFlowError::NotOrderOwner);
        }
        self.with_lines(order).await
    }

    pub async fn fetch_order_by_number(
        &self,
        order_number: &OrderNumber,
        caller: &Caller,
    ) -> Result<FullOrder, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
        if !caller.can_access(&order) {
            debug!("🔄️📦️ {caller} tried to access order {order_number}");
            return Err(OrderFlowError::NotOrderOwner);
        }
        self.with_lines(order).await
    }

    pub async fn orders_for_user(&self, user_id: &str, caller: &Caller) -> Result<Vec<Order>, OrderFlowError> {
        if !caller.is_admin && caller.user_id != user_id {
            return Err(OrderFlowError::NotOrderOwner);
        }
        self.db.fetch_orders_for_user(user_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        query.validate()?;
        trace!("🔄️🔍️ Searching orders. {query}");
        self.db.search_orders(query).await
    }

    /// Returns the order if `caller` may pay for it now: it must be theirs, unpaid, and not cancelled.
    pub async fn order_for_payment(&self, id: i64, caller: &Caller) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order_by_id(id).await?.ok_or(OrderFlowError::OrderIdNotFound(id))?;
        if !order.is_owned_by(&caller.user_id) {
            return Err(OrderFlowError::NotOrderOwner);
        }
        if order.payment_status != PaymentStatusType::Pending || order.status == OrderStatusType::Cancelled {
            return Err(OrderFlowError::OrderNotPayable {
                order_number: order.order_number,
                status: order.status,
                payment_status: order.payment_status,
            });
        }
        if !order.total_amount.is_positive() {
            return Err(OrderFlowError::InvalidTotal(order.total_amount));
        }
        Ok(order)
    }

    /// Cancels an order and restores its stock.
    ///
    /// Customers may cancel their own orders; administrators may cancel any. Only `pending` and `processing` orders
    /// can be cancelled. Anything else is reported as [`OrderFlowError::OrderNotCancellable`] and left untouched.
    pub async fn cancel_order(&self, id: i64, caller: &Caller, reason: &str) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order_by_id(id).await?.ok_or(OrderFlowError::OrderIdNotFound(id))?;
        if !caller.can_access(&order) {
            warn!("🔄️❌️ {caller} tried to cancel order {} belonging to someone else", order.order_number);
            return Err(OrderFlowError::NotOrderOwner);
        }
        if !order.status.is_cancellable() {
            return Err(OrderFlowError::OrderNotCancellable { order_number: order.order_number, status: order.status });
        }
        let cancelled = self.db.cancel_order(id, &caller.to_string(), reason).await?;
        self.call_order_annulled_hook(&cancelled).await;
        Ok(cancelled)
    }

    /// Administrative order status change.
    ///
    /// Cancelled orders stay cancelled, and cancelling goes through [`Self::cancel_order`] so that stock is restored.
    pub async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatusType,
        caller: &Caller,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order_by_id(id).await?.ok_or(OrderFlowError::OrderIdNotFound(id))?;
        if order.status == status {
            return Err(OrderFlowError::OrderModificationNoOp);
        }
        if order.status == OrderStatusType::Cancelled {
            return Err(OrderFlowError::OrderModificationForbidden(format!(
                "Order {} is cancelled and cannot be reopened",
                order.order_number
            )));
        }
        if status == OrderStatusType::Cancelled {
            return Err(OrderFlowError::OrderModificationForbidden(
                "Use the cancel operation to cancel an order".to_string(),
            ));
        }
        self.db.update_order_status(id, status, &caller.to_string()).await
    }

    /// Administrative payment status change. Only `pending` payments can be changed, and only to `paid` or `failed`.
    pub async fn update_payment_status(
        &self,
        id: i64,
        status: PaymentStatusType,
        caller: &Caller,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order_by_id(id).await?.ok_or(OrderFlowError::OrderIdNotFound(id))?;
        if order.payment_status == status {
            return Err(OrderFlowError::OrderModificationNoOp);
        }
        let forbidden = || {
            OrderFlowError::OrderModificationForbidden(format!(
                "Payment status of {} cannot change from {} to {status}",
                order.order_number, order.payment_status
            ))
        };
        if order.payment_status.is_settled() || status == PaymentStatusType::Pending {
            return Err(forbidden());
        }
        let updated = self.db.update_payment_status(id, status, &caller.to_string()).await?.ok_or_else(forbidden)?;
        if updated.payment_status == PaymentStatusType::Paid {
            self.call_order_paid_hook(&updated).await;
        }
        Ok(updated)
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            emitter.publish_event(OrderPaidEvent::new(order.clone())).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("🔄️📦️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }
}
