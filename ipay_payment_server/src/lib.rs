//! # iPay payment server
//!
//! The HTTP face of the reconciliation engine. It is responsible for:
//! * Receiving and authenticating transaction outcome callbacks from the iPay gateway.
//! * Serving guest status polls for storefront order pages.
//! * Building signed initiation requests for checkouts, and relaying cancellations and status
//!   queries to the gateway.
//!
//! ## Configuration
//! The server is configured via `IPG_*` environment variables. See [config](config/index.html).
//!
//! ## Routes
//! * `GET /health`: liveness check.
//! * `POST /ipay/callback` (and `GET`, for gateways configured to redirect): the outcome
//!   callback endpoint.
//! * `GET /ipay/status/{order_id}`: guest status poll, authenticated with the order's access
//!   token and email.
//! * `POST /ipay/initiate`: build the signed hosted-payment-page form for an order.
//! * `POST /ipay/cancel/{payment_id}`: void a payment, relaying the cancellation to the gateway
//!   when it already has a transaction id.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
