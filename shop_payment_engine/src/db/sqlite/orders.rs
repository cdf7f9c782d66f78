use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, NewOrder, Order, OrderNumber, OrderStatusType, PaymentStatusType},
    order_objects::OrderQueryFilter,
    OrderFlowError,
};

/// Inserts the order header. This is not atomic on its own; embed it in a transaction alongside the line items and
/// stock updates, passing `&mut tx` as the connection.
pub async fn insert_order(
    order: &NewOrder,
    subtotal: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let total_amount = subtotal + order.shipping_fee;
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                user_id,
                customer_name,
                customer_email,
                customer_phone,
                shipping_address,
                subtotal,
                shipping_fee,
                total_amount,
                payment_method,
                notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(order.order_number.as_str())
    .bind(order.user_id.as_str())
    .bind(order.customer.name.as_str())
    .bind(order.customer.email.as_str())
    .bind(order.customer.phone.as_str())
    .bind(order.customer.address.as_str())
    .bind(subtotal)
    .bind(order.shipping_fee)
    .bind(total_amount)
    .bind(order.payment_method.to_string())
    .bind(order.notes.as_deref())
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!("🗃️ Order number {} is already taken", order.order_number);
            Err(OrderFlowError::DuplicateOrderNumber(order.order_number.clone()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await
}

pub async fn fetch_orders_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    if let Some(statuses) = query.payment_status.filter(|s| !s.is_empty()) {
        where_clause.push("payment_status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(created_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(created_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

/// Moves an order to `cancelled`, but only if it is currently `pending` or `processing`.
///
/// Returns `None` if the guard did not match.
pub async fn cancel_if_cancellable(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET status = 'cancelled', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status IN ('pending', 'processing')
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status.to_string())
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(OrderFlowError::OrderIdNotFound(id))
}

/// Sets the payment status (and the order status with it) in one conditional statement.
///
/// The update only applies while `payment_status` is still `pending` and the order has not been cancelled. `None`
/// means another writer got there first, the order was cancelled, or the order does not exist.
pub async fn settle_if_pending(
    order_number: &OrderNumber,
    payment_status: PaymentStatusType,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = $1, status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $3 AND payment_status = 'pending' AND status <> 'cancelled'
            RETURNING *;
        "#,
    )
    .bind(payment_status.to_string())
    .bind(status.to_string())
    .bind(order_number.as_str())
    .fetch_optional(conn)
    .await
}

/// Records the payment status of a cancelled order that is still awaiting payment. The order status is left alone.
pub async fn settle_cancelled_if_pending(
    order_number: &OrderNumber,
    payment_status: PaymentStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_number = $2 AND payment_status = 'pending' AND status = 'cancelled'
            RETURNING *;
        "#,
    )
    .bind(payment_status.to_string())
    .bind(order_number.as_str())
    .fetch_optional(conn)
    .await
}

/// Sets only the payment status, and only while it is `pending`.
pub async fn set_payment_status_if_pending(
    id: i64,
    payment_status: PaymentStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(payment_status.to_string())
    .bind(id)
    .fetch_optional(conn)
    .await
}
