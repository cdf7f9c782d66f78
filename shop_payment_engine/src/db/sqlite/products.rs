use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product};

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    sqlx::query_as("INSERT INTO products (name, price, sale_price, stock) VALUES ($1, $2, $3, $4) RETURNING *")
        .bind(product.name)
        .bind(product.price)
        .bind(product.sale_price)
        .bind(product.stock)
        .fetch_one(conn)
        .await
}

/// Takes `quantity` units out of stock, but only if that many are available.
///
/// Returns `false`, leaving the row untouched, when there is not enough stock.
pub async fn decrement_stock(id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND stock >= $1",
    )
    .bind(quantity)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn restore_stock(id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(quantity)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
