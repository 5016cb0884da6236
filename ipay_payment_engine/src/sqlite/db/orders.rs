use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId, SettlementStatus},
    traits::PaymentGatewayError,
};

/// Inserts the order, returning `false` in the second element if an order with the same
/// `order_id` already exists.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), PaymentGatewayError> {
    let inserted = match fetch_order_by_order_id(&order.order_id, conn).await? {
        Some(order) => (order, false),
        None => {
            let order = insert_order(order, conn).await?;
            debug!("📝️ Order {} inserted with id {}", order.order_id, order.id);
            (order, true)
        },
    };
    Ok(inserted)
}

async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, email, access_token, total_price, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.email)
    .bind(order.access_token)
    .bind(order.total_price.value())
    .bind(order.currency)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Move the order's checkout state forward by one step.
pub async fn advance_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let order = fetch_order_by_order_id(order_id, conn)
        .await?
        .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
    let next = order
        .checkout_state
        .next()
        .ok_or_else(|| PaymentGatewayError::OrderAdvanceRejected(order_id.clone()))?;
    let order: Order = sqlx::query_as(
        "UPDATE orders SET checkout_state = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 RETURNING *",
    )
    .bind(next)
    .bind(order_id.as_str())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order {} advanced to {}", order.order_id, order.checkout_state);
    Ok(order)
}

/// Mark the order as settled. The `WHERE settlement = 'Unpaid'` guard makes this a
/// compare-and-set: exactly one caller can ever flip the flag.
pub async fn mark_order_paid(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let settled: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET settlement = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND settlement = $3
            RETURNING *;
        "#,
    )
    .bind(SettlementStatus::Paid)
    .bind(order_id.as_str())
    .bind(SettlementStatus::Unpaid)
    .fetch_optional(&mut *conn)
    .await?;
    match settled {
        Some(order) => Ok(order),
        None => match fetch_order_by_order_id(order_id, conn).await? {
            Some(_) => Err(PaymentGatewayError::OrderAlreadyPaid(order_id.clone())),
            None => Err(PaymentGatewayError::OrderNotFound(order_id.clone())),
        },
    }
}
