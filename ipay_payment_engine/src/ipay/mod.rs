//! The iPay gateway protocol: merchant configuration, the decoded inbound callback, and the
//! builder for signed outbound requests. Signature field orders live in
//! [`crate::helpers::signature`] and are shared between inbound verification and outbound signing.

mod callback;
mod config;
mod request_builder;

pub use callback::{CallbackError, GatewayCallback};
pub use config::{
    ChannelFlags,
    IpayConfig,
    OverpaymentPolicy,
    DEFAULT_PAYMENT_ENDPOINT,
    DEFAULT_TRANSACTION_ENDPOINT,
    SANDBOX_TRANSACTION_ENDPOINT,
};
pub use request_builder::{build_cancellation, build_initiation, build_status_query, SignedRequest};
