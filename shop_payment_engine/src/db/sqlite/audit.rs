use sqlx::SqliteConnection;

use crate::db_types::AuditEntry;

pub async fn log_entry(
    order_id: i64,
    actor: &str,
    description: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO order_audit_log (order_id, actor, description) VALUES ($1, $2, $3)")
        .bind(order_id)
        .bind(actor)
        .bind(description)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_entries(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<AuditEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_audit_log WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}
