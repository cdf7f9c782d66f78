use sqlx::SqliteConnection;

use crate::db_types::CartItem;

pub async fn fetch_cart(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 ORDER BY id ASC").bind(user_id).fetch_all(conn).await
}

pub async fn add_item(
    user_id: &str,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    sqlx::query_as("INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) RETURNING *")
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(conn)
        .await
}

/// Deletes every cart item belonging to `user_id`. Returns the number of items removed.
pub async fn clear_cart(user_id: &str, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected())
}
