//! The behaviour that database backends must provide to drive the payment engine.
//!
//! The [`PaymentGatewayDatabase`] trait covers order and payment storage and the legal state
//! transitions over them. The reconciliation API is written against this trait, so backends are
//! interchangeable; the crate ships a SQLite implementation behind the `sqlite` feature.

mod payment_gateway_database;

pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
