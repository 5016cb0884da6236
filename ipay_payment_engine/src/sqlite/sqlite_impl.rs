//! `SqliteDatabase` is the concrete SQLite implementation of [`PaymentGatewayDatabase`].

use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{new_pool, orders, payments};
use crate::{
    db_types::{NewOrder, NewPayment, Order, OrderId, Payment, PaymentState},
    traits::{PaymentGatewayDatabase, PaymentGatewayError},
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
    /// Connect to the database at `url` with a pool of up to `max_connections` connections.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply any outstanding schema migrations. Run once at startup, before serving requests.
    pub async fn migrate(&self) -> Result<(), PaymentGatewayError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PaymentGatewayError::DatabaseError(e.to_string()))?;
        info!("📝️ Database migrations complete");
        Ok(())
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_order_id(order_id, &mut conn).await?)
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::insert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment(id, &mut conn).await?)
    }

    async fn fetch_payment_by_response_code(&self, code: &str) -> Result<Option<Payment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment_by_response_code(code, &mut conn).await?)
    }

    async fn fetch_latest_payment_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Payment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_latest_payment_for_order(order_id.as_str(), &mut conn).await?)
    }

    async fn upsert_payment_source(&self, payment_id: i64, phone: &str) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        payments::upsert_payment_source(payment_id, phone, &mut conn).await
    }

    async fn fetch_payment_source(&self, payment_id: i64) -> Result<Option<String>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment_source(payment_id, &mut conn).await?)
    }

    async fn set_response_code(&self, payment_id: i64, code: &str) -> Result<Payment, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::set_response_code(payment_id, code, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn update_payment_state(
        &self,
        payment_id: i64,
        new_state: PaymentState,
    ) -> Result<Payment, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::update_payment_state(payment_id, new_state, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn advance_order(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::advance_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn mark_order_paid(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::mark_order_paid(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        debug!("📝️ Closing database connections");
        self.pool.close().await;
        Ok(())
    }
}
