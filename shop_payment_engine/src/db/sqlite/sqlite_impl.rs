//! `SqliteDatabase` is the concrete backend for the shop payment engine.
//!
//! It implements every trait in [`crate::traits`] on top of a `sqlx` connection pool.
use std::fmt::Debug;

use log::*;
use sqlx::{SqliteConnection, SqlitePool};

use super::{audit, carts, db_url, new_pool, order_lines, orders, products};
use crate::{
    db_types::{
        AuditEntry,
        CartItem,
        FullOrder,
        Money,
        NewOrder,
        NewProduct,
        Order,
        OrderLine,
        OrderNumber,
        OrderStatusType,
        PaymentStatusType,
        Product,
        SettledPayment,
    },
    order_objects::OrderQueryFilter,
    traits::{CatalogManagement, OrderManagement, PaymentGatewayDatabase},
    OrderFlowError,
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `SPS_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Puts every line of an order back into stock.
async fn restore_stock_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let lines = order_lines::fetch_lines(order_id, conn).await?;
    for line in lines {
        products::restore_stock(line.product_id, line.quantity, conn).await?;
        trace!("🗃️ Restored {} x product {} from order #{order_id}", line.quantity, line.product_id);
    }
    Ok(())
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let lines = order_lines::fetch_lines(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_audit_log(&self, order_id: i64) -> Result<Vec<AuditEntry>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let entries = audit::fetch_entries(order_id, &mut conn).await?;
        Ok(entries)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("🗃️ Product #{} ({}) added with {} in stock", product.id, product.name, product.stock);
        Ok(product)
    }

    async fn fetch_cart(&self, user_id: &str) -> Result<Vec<CartItem>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart(user_id, &mut conn).await?;
        Ok(items)
    }

    async fn add_to_cart(&self, user_id: &str, product_id: i64, quantity: i64) -> Result<CartItem, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let item = carts::add_item(user_id, product_id, quantity, &mut conn).await?;
        Ok(item)
    }

    async fn clear_cart(&self, user_id: &str) -> Result<u64, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let removed = carts::clear_cart(user_id, &mut conn).await?;
        trace!("🗃️ Removed {removed} items from the cart of {user_id}");
        Ok(removed)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_order(&self, order: NewOrder) -> Result<FullOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        // Reserve and price every line first. Any failure drops `tx`, which rolls everything back.
        let mut priced = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let reserved = products::decrement_stock(item.product_id, item.quantity, &mut tx).await?;
            let product = products::fetch_product(item.product_id, &mut tx)
                .await?
                .ok_or(OrderFlowError::ProductNotFound(item.product_id))?;
            if !reserved {
                debug!(
                    "🗃️ Not enough stock of {} for order {}. {} requested, {} available",
                    product.name, order.order_number, item.quantity, product.stock
                );
                return Err(OrderFlowError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    requested: item.quantity,
                    available: product.stock,
                });
            }
            priced.push((product, item.quantity));
        }
        let subtotal = priced
            .iter()
            .try_fold(Money::default(), |acc, (p, qty)| {
                p.effective_price().checked_mul(*qty).and_then(|line| acc.checked_add(line))
            })
            .ok_or(OrderFlowError::TotalOverflow)?;
        subtotal.checked_add(order.shipping_fee).ok_or(OrderFlowError::TotalOverflow)?;
        let header = orders::insert_order(&order, subtotal, &mut tx).await?;
        let mut lines = Vec::with_capacity(priced.len());
        for (product, quantity) in priced {
            let line = order_lines::insert_line(
                header.id,
                product.id,
                &product.name,
                product.effective_price(),
                quantity,
                &mut tx,
            )
            .await?;
            lines.push(line);
        }
        let removed = carts::clear_cart(&order.user_id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {} saved with id {}. {} lines, total {}. {removed} cart items cleared",
            header.order_number,
            header.id,
            lines.len(),
            header.total_amount
        );
        Ok(FullOrder { order: header, lines })
    }

    async fn cancel_order(&self, id: i64, actor: &str, reason: &str) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::cancel_if_cancellable(id, &mut tx).await? else {
            let current = orders::fetch_order_by_id(id, &mut tx).await?.ok_or(OrderFlowError::OrderIdNotFound(id))?;
            debug!("🗃️ Order {} is {} and cannot be cancelled", current.order_number, current.status);
            return Err(OrderFlowError::OrderNotCancellable {
                order_number: current.order_number,
                status: current.status,
            });
        };
        restore_stock_for_order(id, &mut tx).await?;
        let note = format!("Order cancelled. {reason}");
        audit::log_entry(id, actor, &note, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order {} cancelled by {actor}. Stock restored.", order.order_number);
        Ok(order)
    }

    async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatusType,
        actor: &str,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_status(id, status, &mut tx).await?;
        let note = format!("Status changed to {status}");
        audit::log_entry(id, actor, &note, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {}: {note}", order.order_number);
        Ok(order)
    }

    async fn update_payment_status(
        &self,
        id: i64,
        status: PaymentStatusType,
        actor: &str,
    ) -> Result<Option<Order>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::set_payment_status_if_pending(id, status, &mut tx).await? else {
            return Ok(None);
        };
        let note = format!("Payment status manually changed from pending to {status}");
        audit::log_entry(id, actor, &note, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {}: {note}", order.order_number);
        Ok(Some(order))
    }

    async fn settle_pending_payment(
        &self,
        order_number: &OrderNumber,
        outcome: PaymentStatusType,
        actor: &str,
    ) -> Result<Option<SettledPayment>, OrderFlowError> {
        let status = match outcome {
            PaymentStatusType::Paid => OrderStatusType::Processing,
            PaymentStatusType::Failed => OrderStatusType::Cancelled,
            PaymentStatusType::Pending => {
                return Err(OrderFlowError::OrderModificationForbidden("A payment cannot be settled as pending".into()))
            },
        };
        let mut tx = self.pool.begin().await?;
        if let Some(order) = orders::settle_if_pending(order_number, outcome, status, &mut tx).await? {
            if outcome == PaymentStatusType::Failed {
                restore_stock_for_order(order.id, &mut tx).await?;
            }
            let note = format!("Payment {outcome} via {actor}. Order is now {status}");
            audit::log_entry(order.id, actor, &note, &mut tx).await?;
            tx.commit().await?;
            debug!("🗃️ Order {order_number}: {note}");
            return Ok(Some(SettledPayment::new(order)));
        }
        // The cancellation already returned the stock
        let Some(order) = orders::settle_cancelled_if_pending(order_number, outcome, &mut tx).await? else {
            trace!("🗃️ Order {order_number} is not awaiting payment. Nothing to settle");
            return Ok(None);
        };
        let note = match outcome {
            PaymentStatusType::Paid => format!("Payment paid via {actor} after the order was cancelled. Refund required"),
            _ => format!("Payment {outcome} via {actor}. Order was already cancelled"),
        };
        audit::log_entry(order.id, actor, &note, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_number}: {note}");
        Ok(Some(SettledPayment::after_cancellation(order)))
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}
