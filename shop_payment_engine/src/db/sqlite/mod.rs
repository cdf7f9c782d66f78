//! # SQLite backend
//!
//! The submodules hold "low-level" SQLite interactions as free functions that take a `&mut SqliteConnection`.
//! Callers obtain a connection from the pool, or open a transaction and pass `&mut tx`, without any other changes.
//! [`SqliteDatabase`] composes them into the atomic operations the backend traits require.
//!
//! Every write transaction opens with a write statement. SQLite then takes the write lock up front, and concurrent
//! writers queue on the busy timeout instead of failing when they try to upgrade a read lock.
use std::env;

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod audit;
pub mod carts;
pub mod order_lines;
pub mod orders;
pub mod products;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;

const SQLITE_DB_URL: &str = "sqlite://data/shop_store.db";

pub fn db_url() -> String {
    let result = env::var("SPS_DATABASE_URL").unwrap_or_else(|_| {
        info!("SPS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
