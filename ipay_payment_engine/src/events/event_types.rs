use crate::db_types::{Order, Payment};

/// Fired when an order has been fully settled and moved to its complete checkout state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired when a payment needs operator attention: an overpayment that was accepted, a success
/// callback arriving for a payment that already failed, or a status token we do not recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFlaggedEvent {
    pub payment: Payment,
    pub reason: String,
}

impl PaymentFlaggedEvent {
    pub fn new(payment: Payment, reason: impl Into<String>) -> Self {
        Self { payment, reason: reason.into() }
    }
}
