//! iPay Payment Engine
//!
//! The iPay Payment Engine reconciles a merchant's orders with the iPay mobile-money/card gateway.
//! The gateway reports transaction outcomes over asynchronous HTTP callbacks which may arrive
//! duplicated, out of order, or concurrently with client-initiated status polls. This library
//! contains the core logic that turns those callbacks into deterministic, idempotent state
//! transitions on the Payment and Order records. It is host-application agnostic.
//!
//! The library is divided into three main sections:
//! 1. The gateway protocol ([`mod@ipay`]): the signature datastring conventions, the decoded
//!    callback type, and the builder for signed outbound requests (initiation, status query,
//!    cancellation). The same ordered field lists drive both inbound verification and outbound
//!    signing, so the two can never drift apart.
//! 2. The reconciliation API ([`mod@reconciliation`]): the state machine that applies the
//!    canonicalized callback status to a Payment and advances its Order on settlement. Backends
//!    implement the trait in [`mod@traits`] to act as the storage layer; an SQLite implementation
//!    ships in this crate.
//! 3. Events ([`mod@events`]): a small pub-sub hook system. An `OrderPaidEvent` fires when an
//!    order settles, and a `PaymentFlaggedEvent` fires whenever a payment needs operator review
//!    (unknown vendor status, accepted overpayment).

pub mod amount;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod ipay;
mod reconciliation;
pub mod status_codes;
pub mod traits;

#[cfg(feature = "test_utils")]
pub mod test_utils;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use reconciliation::{
    FailureReason,
    ReconciliationApi,
    ReconciliationConfig,
    ReconciliationError,
    ReconciliationResult,
    StatusPollResult,
};
pub use traits::{PaymentGatewayDatabase, PaymentGatewayError};
