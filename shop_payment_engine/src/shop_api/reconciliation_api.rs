//! Merges the two gateway callback channels into one payment transition per order.
//!
//! The gateway reports every payment at least once on each of two channels, in no particular order. Each report is
//! passed through [`PaymentReconciliationApi::reconcile`], which applies the transition the first time and
//! acknowledges every later report without writing anything.
use std::fmt::Debug;

use log::*;
use vnpay_tools::VerifiedCallback;

use crate::{
    db_types::{Money, Order, OrderNumber, PaymentStatusType, SettledPayment},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    order_objects::{CallbackChannel, ReconciliationOutcome, RejectionReason},
    traits::PaymentGatewayDatabase,
    ReconciliationError,
};

/// Reported and stored amounts may differ by at most this many minor units.
pub const AMOUNT_TOLERANCE: Money = Money::from_minor_units(1);

pub struct PaymentReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PaymentReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentReconciliationApi")
    }
}

impl<B: Clone> Clone for PaymentReconciliationApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> PaymentReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PaymentReconciliationApi<B>
where B: PaymentGatewayDatabase
{
    /// Applies a verified gateway callback.
    ///
    /// 1. An unknown order number is rejected.
    /// 2. An amount that differs from the order total by more than [`AMOUNT_TOLERANCE`] is rejected.
    /// 3. An order that is no longer pending is acknowledged as already settled.
    /// 4. Otherwise the order is settled as paid (response code `00`) or failed, with a single conditional update. If
    ///    a concurrent callback wins that race, this one is acknowledged as already settled.
    /// 5. An order the customer cancelled before the callback arrived stays cancelled. The payment status is recorded,
    ///    no hooks fire, and a payment that went through is logged as needing a refund.
    ///
    /// Nothing is written in cases 1 to 3. Only store faults are returned as errors.
    pub async fn reconcile(
        &self,
        callback: &VerifiedCallback,
        channel: CallbackChannel,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let order_number = OrderNumber::from(callback.order_number());
        let Some(order) = self.db.fetch_order_by_number(&order_number).await? else {
            warn!("🔄️💳️ [{channel}] Callback for unknown order {order_number}");
            return Ok(ReconciliationOutcome::Rejected(RejectionReason::OrderNotFound));
        };
        let received = callback.amount();
        if order.total_amount.abs_diff(received) > AMOUNT_TOLERANCE {
            warn!(
                "🔄️💳️ [{channel}] Amount mismatch for order {order_number}. Expected {}, received {received}",
                order.total_amount
            );
            return Ok(ReconciliationOutcome::Rejected(RejectionReason::AmountMismatch {
                expected: order.total_amount,
                received,
            }));
        }
        if order.payment_status.is_settled() {
            debug!("🔄️💳️ [{channel}] Order {order_number} is already {}. Nothing to do", order.payment_status);
            return Ok(ReconciliationOutcome::AlreadySettled(order));
        }
        let outcome = if callback.is_success() { PaymentStatusType::Paid } else { PaymentStatusType::Failed };
        let actor = format!("vnpay:{channel}");
        match self.db.settle_pending_payment(&order_number, outcome, &actor).await? {
            Some(SettledPayment { order: settled, after_cancellation: true }) => {
                if outcome == PaymentStatusType::Paid {
                    warn!(
                        "🔄️💳️ [{channel}] Order {order_number} was paid after it had been cancelled. The payment of {} \
                         must be refunded",
                        settled.total_amount
                    );
                } else {
                    info!("🔄️💳️ [{channel}] Payment for cancelled order {order_number} recorded as {outcome}");
                }
                Ok(ReconciliationOutcome::Applied(settled))
            },
            Some(SettledPayment { order: settled, .. }) => {
                info!(
                    "🔄️💳️ [{channel}] Order {order_number} settled as {outcome} (response code {})",
                    callback.response_code()
                );
                self.after_settlement(&settled).await;
                Ok(ReconciliationOutcome::Applied(settled))
            },
            None => {
                debug!("🔄️💳️ [{channel}] Order {order_number} was settled by a concurrent callback");
                let current = self.db.fetch_order_by_number(&order_number).await?.unwrap_or(order);
                Ok(ReconciliationOutcome::AlreadySettled(current))
            },
        }
    }

    async fn after_settlement(&self, order: &Order) {
        match order.payment_status {
            PaymentStatusType::Paid => {
                // Best effort. The settlement is already committed
                match self.db.clear_cart(&order.user_id).await {
                    Ok(n) => trace!("🔄️💳️ Cleared {n} cart items for {}", order.user_id),
                    Err(e) => warn!("🔄️💳️ Could not clear the cart of {} after payment. {e}", order.user_id),
                }
                for emitter in &self.producers.order_paid_producer {
                    emitter.publish_event(OrderPaidEvent::new(order.clone())).await;
                }
            },
            PaymentStatusType::Failed => {
                for emitter in &self.producers.order_annulled_producer {
                    emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
                }
            },
            PaymentStatusType::Pending => {},
        }
    }
}
