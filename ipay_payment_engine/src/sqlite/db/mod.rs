//! # SQLite database methods
//!
//! Low-level SQLite interactions, kept as plain functions over a `&mut SqliteConnection` rather
//! than stateful structs. Callers obtain a connection from a pool, or open a transaction and
//! pass `&mut *tx` when several calls must be atomic.

use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod orders;
pub mod payments;

const SQLITE_DB_URL: &str = "sqlite://data/ipg_store.db";

pub fn db_url() -> String {
    let result = env::var("IPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("IPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
