use sqlx::SqliteConnection;

use crate::db_types::{Money, OrderLine};

pub async fn insert_line(
    order_id: i64,
    product_id: i64,
    product_name: &str,
    unit_price: Money,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, sqlx::Error> {
    let line_total = unit_price * quantity;
    sqlx::query_as(
        r#"
            INSERT INTO order_lines (order_id, product_id, product_name, unit_price, quantity, line_total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(product_name)
    .bind(unit_price)
    .bind(quantity)
    .bind(line_total)
    .fetch_one(conn)
    .await
}

pub async fn fetch_lines(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id ASC").bind(order_id).fetch_all(conn).await
}
