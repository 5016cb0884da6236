pub mod ipay_client;

pub use ipay_client::{IpayClient, IpayClientError};
