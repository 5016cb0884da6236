use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment, PaymentState},
    traits::PaymentGatewayError,
};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, PaymentGatewayError> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, amount)
            VALUES ($1, $2)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.amount.value())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Payment {} created for order {}", payment.id, payment.order_id);
    Ok(payment)
}

pub async fn fetch_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_payment_by_response_code(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE response_code = $1").bind(code).fetch_optional(conn).await
}

pub async fn fetch_latest_payment_for_order(
    order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id DESC LIMIT 1")
        .bind(order_id)
        .fetch_optional(conn)
        .await
}

/// Record the gateway transaction id. First write wins: the `WHERE response_code IS NULL` guard
/// leaves an existing code untouched, and the fresh fetch returns whatever is stored.
pub async fn set_response_code(
    payment_id: i64,
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Payment, PaymentGatewayError> {
    sqlx::query(
        r#"
            UPDATE payments SET response_code = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND response_code IS NULL;
        "#,
    )
    .bind(code)
    .bind(payment_id)
    .execute(&mut *conn)
    .await?;
    fetch_payment(payment_id, conn).await?.ok_or(PaymentGatewayError::PaymentNotFound(payment_id))
}

/// Move the payment to `new_state`, rejecting anything outside
/// `Checkout → Processing → {Completed, Failed, Void}`. Run inside a transaction so the check
/// and the write are atomic.
pub async fn update_payment_state(
    payment_id: i64,
    new_state: PaymentState,
    conn: &mut SqliteConnection,
) -> Result<Payment, PaymentGatewayError> {
    let payment =
        fetch_payment(payment_id, conn).await?.ok_or(PaymentGatewayError::PaymentNotFound(payment_id))?;
    if !transition_is_legal(payment.state, new_state) {
        return Err(PaymentGatewayError::IllegalStateChange(payment.state, new_state));
    }
    let payment = sqlx::query_as(
        "UPDATE payments SET state = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(new_state)
    .bind(payment_id)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Payment {payment_id} moved to {new_state}");
    Ok(payment)
}

fn transition_is_legal(from: PaymentState, to: PaymentState) -> bool {
    use PaymentState::*;
    match from {
        Checkout => matches!(to, Processing | Completed | Failed | Void),
        Processing => matches!(to, Completed | Failed | Void),
        Completed | Failed | Void => false,
    }
}

pub async fn upsert_payment_source(
    payment_id: i64,
    phone: &str,
    conn: &mut SqliteConnection,
) -> Result<(), PaymentGatewayError> {
    sqlx::query(
        r#"
            INSERT INTO payment_sources (payment_id, phone) VALUES ($1, $2)
            ON CONFLICT (payment_id) DO UPDATE SET phone = excluded.phone;
        "#,
    )
    .bind(payment_id)
    .bind(phone)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_payment_source(
    payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT phone FROM payment_sources WHERE payment_id = $1")
        .bind(payment_id)
        .fetch_optional(conn)
        .await
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn terminal_states_admit_no_transitions() {
        use PaymentState::*;
        for from in [Completed, Failed, Void] {
            for to in [Checkout, Processing, Completed, Failed, Void] {
                assert!(!transition_is_legal(from, to), "{from} → {to} should be illegal");
            }
        }
    }

    #[test]
    fn forward_transitions_are_legal() {
        use PaymentState::*;
        assert!(transition_is_legal(Checkout, Processing));
        assert!(transition_is_legal(Checkout, Completed));
        assert!(transition_is_legal(Processing, Completed));
        assert!(transition_is_legal(Processing, Failed));
        assert!(transition_is_legal(Processing, Void));
        assert!(!transition_is_legal(Processing, Checkout));
    }
}
