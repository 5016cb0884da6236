use ipay_payment_engine::{
    db_types::{NewOrder, OrderId, Payment},
    ipay::SignedRequest,
    FailureReason,
    ReconciliationResult,
    StatusPollResult,
};
use ipg_common::Cents;
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// The body returned to the gateway for every reconciled callback: `{status, message, id}`,
/// where `id` is the merchant order reference. The gateway only cares about the status code, but
/// the body makes manual replays and log correlation painless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub status: String,
    pub message: String,
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl From<&ReconciliationResult> for CallbackResponse {
    fn from(result: &ReconciliationResult) -> Self {
        match result {
            ReconciliationResult::Completed { order, .. } => Self {
                status: "completed".to_string(),
                message: "payment reconciled and order settled".to_string(),
                order_id: Some(order.order_id.as_str().to_string()),
            },
            ReconciliationResult::Duplicate { payment } => Self {
                status: "duplicate".to_string(),
                message: "callback already processed".to_string(),
                order_id: Some(payment.order_id.as_str().to_string()),
            },
            ReconciliationResult::Processing { payment } => Self {
                status: "processing".to_string(),
                message: "payment is pending at the gateway".to_string(),
                order_id: Some(payment.order_id.as_str().to_string()),
            },
            ReconciliationResult::Failed { payment, reason } => Self {
                status: "failed".to_string(),
                message: reason.to_string(),
                order_id: Some(payment.order_id.as_str().to_string()),
            },
        }
    }
}

/// Map a reconciliation outcome onto the HTTP status the gateway is answered with. Duplicates
/// and pending transactions are 200s so that the gateway stops redelivering; amount shortfalls
/// get 402 and other failures 422 so that they stand out in the gateway's delivery logs.
pub fn callback_http_status(result: &ReconciliationResult) -> actix_web::http::StatusCode {
    use actix_web::http::StatusCode;
    match result {
        ReconciliationResult::Completed { .. } => StatusCode::OK,
        ReconciliationResult::Duplicate { .. } => StatusCode::OK,
        ReconciliationResult::Processing { .. } => StatusCode::OK,
        ReconciliationResult::Failed { reason, .. } => match reason {
            FailureReason::InsufficientAmount | FailureReason::Overpayment => StatusCode::PAYMENT_REQUIRED,
            FailureReason::GatewayFailure | FailureReason::UnknownStatus => StatusCode::UNPROCESSABLE_ENTITY,
        },
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusQueryParams {
    pub token: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub order_id: String,
    pub checkout_state: String,
    pub settlement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_state: Option<String>,
    pub total_price: String,
    pub currency: String,
}

impl From<&StatusPollResult> for StatusResponse {
    fn from(poll: &StatusPollResult) -> Self {
        Self {
            order_id: poll.order.order_id.as_str().to_string(),
            checkout_state: poll.order.checkout_state.to_string(),
            settlement: poll.order.settlement.to_string(),
            payment_state: poll.payment.as_ref().map(|p| p.state.to_string()),
            total_price: poll.order.total_price.to_string(),
            currency: poll.order.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitiateRequest {
    pub order_id: String,
    pub email: String,
    pub access_token: String,
    /// Decimal amount string in major units, e.g. "1450.00".
    pub total_price: String,
    pub phone: String,
}

impl InitiateRequest {
    pub fn to_new_order(&self) -> Result<NewOrder, ServerError> {
        let total_price: Cents =
            self.total_price.parse().map_err(|e| ServerError::InvalidRequestBody(format!("total_price: {e}")))?;
        Ok(NewOrder::new(
            OrderId::from(self.order_id.clone()),
            self.email.clone(),
            self.access_token.clone(),
            total_price,
        ))
    }
}

/// Everything the storefront needs to render the auto-submitting form that hands the customer
/// to the gateway's hosted payment page.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateResponse {
    pub endpoint: String,
    pub fields: Vec<(String, String)>,
    pub return_url: String,
    pub payment_id: i64,
}

impl InitiateResponse {
    pub fn new(request: &SignedRequest, payment: &Payment, endpoint: &str, return_url: &str) -> Self {
        let fields = request.form().into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Self {
            endpoint: endpoint.to_string(),
            fields,
            return_url: return_url.to_string(),
            payment_id: payment.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub payment_id: i64,
    pub state: String,
    /// True when the cancellation was also relayed to the gateway.
    pub gateway_notified: bool,
}

impl CancelResponse {
    pub fn new(payment: &Payment, gateway_notified: bool) -> Self {
        Self { payment_id: payment.id, state: payment.state.to_string(), gateway_notified }
    }
}
