use thiserror::Error;

use crate::db_types::{NewOrder, NewPayment, Order, OrderId, Payment, PaymentState};

/// Storage behaviour for backends supporting the payment engine.
///
/// This covers:
/// * Creating and fetching orders and payments.
/// * Recording the gateway transaction id against a payment (first write wins).
/// * The legal state transitions of payments and the forward-only advancement of orders.
///
/// Every mutating method runs in a single database transaction. Methods that enforce an
/// invariant (`set_response_code`, `update_payment_state`, `advance_order`, `mark_order_paid`)
/// check it inside that transaction, so concurrent callers cannot interleave their way around it.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Store a new order. Idempotent: if an order with the same `order_id` already exists, the
    /// existing record is returned and the second element is `false`.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), PaymentGatewayError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Create a payment for an order in the `Checkout` state.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentGatewayError>;

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, PaymentGatewayError>;

    /// Look up the payment carrying the given gateway transaction id. Used to detect replayed
    /// callbacks independently of the payment state.
    async fn fetch_payment_by_response_code(&self, code: &str) -> Result<Option<Payment>, PaymentGatewayError>;

    /// The most recently created payment for an order, if any.
    async fn fetch_latest_payment_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Payment>, PaymentGatewayError>;

    /// Record the normalized customer phone number for a payment, replacing any previous value.
    async fn upsert_payment_source(&self, payment_id: i64, phone: &str) -> Result<(), PaymentGatewayError>;

    async fn fetch_payment_source(&self, payment_id: i64) -> Result<Option<String>, PaymentGatewayError>;

    /// Record the gateway's transaction id against the payment. The first write wins: if the
    /// payment already carries a different code, the stored value is left untouched and the
    /// payment is returned as-is.
    async fn set_response_code(&self, payment_id: i64, code: &str) -> Result<Payment, PaymentGatewayError>;

    /// Move a payment to `new_state`, enforcing the lifecycle
    /// `Checkout → Processing → {Completed, Failed, Void}`. Illegal transitions, including any
    /// transition out of a terminal state, return [`PaymentGatewayError::IllegalStateChange`]
    /// without modifying the record.
    async fn update_payment_state(
        &self,
        payment_id: i64,
        new_state: PaymentState,
    ) -> Result<Payment, PaymentGatewayError>;

    /// Advance the order's checkout state by exactly one step. Returns
    /// [`PaymentGatewayError::OrderAdvanceRejected`] if the order is already complete.
    async fn advance_order(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError>;

    /// Mark the order as settled. Returns [`PaymentGatewayError::OrderAlreadyPaid`] if it was
    /// settled before this call, which is how exactly-one-completion is decided under concurrent
    /// callbacks. Checkout state is not touched here; the reconciliation engine advances the
    /// order step-by-step afterwards.
    async fn mark_order_paid(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError>;

    /// Close the database connections.
    async fn close(&mut self) -> Result<(), PaymentGatewayError>;
}

#[derive(Debug, Error)]
pub enum PaymentGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("Payment {0} not found")]
    PaymentNotFound(i64),
    #[error("Order {0} is already paid")]
    OrderAlreadyPaid(OrderId),
    #[error("Illegal payment state change: {0} → {1}")]
    IllegalStateChange(PaymentState, PaymentState),
    #[error("Order {0} cannot advance past its final state")]
    OrderAdvanceRejected(OrderId),
    #[error("Invalid stored value: {0}")]
    ConversionError(#[from] crate::db_types::ConversionError),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
