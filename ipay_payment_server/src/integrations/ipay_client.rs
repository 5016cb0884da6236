//! Thin HTTP client for the gateway's transaction API (status queries and cancellations).
//!
//! Network failures and timeouts are inconclusive: the transaction may well have gone through,
//! so callers must treat [`IpayClientError::Network`] as "try again later" and never mark a
//! payment failed because of it.

use std::{sync::Arc, time::Duration};

use ipay_payment_engine::{
    helpers::SignatureError,
    ipay::{build_cancellation, build_status_query, IpayConfig},
};
use log::*;
use reqwest::Client;
use thiserror::Error;

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum IpayClientError {
    #[error("Could not initialize the gateway client. {0}")]
    Initialization(String),
    #[error("The gateway could not be reached: {0}")]
    Network(String),
    #[error("The gateway rejected the request ({status}): {message}")]
    Gateway { status: u16, message: String },
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

#[derive(Clone)]
pub struct IpayClient {
    config: IpayConfig,
    client: Arc<Client>,
}

impl IpayClient {
    pub fn new(config: IpayConfig) -> Result<Self, IpayClientError> {
        let client = Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| IpayClientError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Query the gateway for the current state of a transaction. Returns the raw response body;
    /// the gateway answers with its opaque status token.
    pub async fn query_status(&self, transaction_id: &str) -> Result<String, IpayClientError> {
        let request = build_status_query(transaction_id, &self.config)?;
        self.post("status", request.form()).await
    }

    /// Relay a cancellation for a transaction the gateway already knows about.
    pub async fn cancel(&self, transaction_id: &str) -> Result<String, IpayClientError> {
        let request = build_cancellation(transaction_id, &self.config)?;
        self.post("cancel", request.form()).await
    }

    async fn post(&self, path: &str, form: Vec<(&'static str, &str)>) -> Result<String, IpayClientError> {
        let url = format!("{}{path}", self.config.transaction_endpoint);
        trace!("📡️ POST {url}");
        let response =
            self.client.post(&url).form(&form).send().await.map_err(|e| IpayClientError::Network(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| IpayClientError::Network(e.to_string()))?;
        if status.is_success() {
            trace!("📡️ Gateway answered {status}");
            Ok(body)
        } else {
            warn!("📡️ Gateway rejected {path} request: {status}");
            Err(IpayClientError::Gateway { status: status.as_u16(), message: body })
        }
    }
}
