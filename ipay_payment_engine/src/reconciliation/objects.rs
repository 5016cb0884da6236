use std::fmt::Display;

use crate::{
    db_types::{Order, Payment},
    ipay::{IpayConfig, OverpaymentPolicy},
};

/// Everything the reconciliation engine needs to know that is not in the database: the gateway
/// configuration and the overpayment policy. The policy has no default on purpose; the operator
/// chooses it explicitly.
#[derive(Clone, Debug)]
pub struct ReconciliationConfig {
    pub ipay: IpayConfig,
    pub overpayment_policy: OverpaymentPolicy,
}

/// The outcome of reconciling a single callback.
#[derive(Debug, Clone)]
pub enum ReconciliationResult {
    /// The payment settled and the order was advanced.
    Completed { order: Order, payment: Payment },
    /// A replayed or vendor-flagged duplicate. Nothing was mutated.
    Duplicate { payment: Payment },
    /// The gateway reported the transaction as pending.
    Processing { payment: Payment },
    /// The payment failed, or would have required mutating a record that must not change.
    Failed { payment: Payment, reason: FailureReason },
}

impl Display for ReconciliationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconciliationResult::Completed { order, payment } => {
                write!(f, "payment {} completed, order {} settled", payment.id, order.order_id)
            },
            ReconciliationResult::Duplicate { payment } => write!(f, "duplicate callback for payment {}", payment.id),
            ReconciliationResult::Processing { payment } => write!(f, "payment {} is processing", payment.id),
            ReconciliationResult::Failed { payment, reason } => {
                write!(f, "payment {} failed: {reason}", payment.id)
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The settled amount (or currency) did not cover the order total.
    InsufficientAmount,
    /// The settled amount exceeded the order total and policy rejects overpayments.
    Overpayment,
    /// The gateway reported the transaction as failed, or reported success for a payment that
    /// had already failed.
    GatewayFailure,
    /// The gateway sent a status token this system does not recognize.
    UnknownStatus,
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureReason::InsufficientAmount => "insufficient amount",
            FailureReason::Overpayment => "overpayment rejected",
            FailureReason::GatewayFailure => "gateway reported failure",
            FailureReason::UnknownStatus => "unrecognized status token",
        };
        f.write_str(s)
    }
}

/// A committed-state snapshot of an order and its most recent payment, for status polls.
#[derive(Debug, Clone)]
pub struct StatusPollResult {
    pub order: Order,
    pub payment: Option<Payment>,
}
