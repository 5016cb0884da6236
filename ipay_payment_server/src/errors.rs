use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use ipay_payment_engine::{PaymentGatewayError, ReconciliationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Callback signature invalid or missing")]
    InvalidSignature,
    #[error("Order credentials do not match")]
    InvalidCredentials,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current record state. {0}")]
    Conflict(String),
    #[error("The payment gateway could not be reached. {0}")]
    DownstreamUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::DownstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::Database(PaymentGatewayError::OrderNotFound(oid)) => {
                Self::NoRecordFound(format!("Order {oid}"))
            },
            ReconciliationError::Database(PaymentGatewayError::PaymentNotFound(id)) => {
                Self::NoRecordFound(format!("Payment {id}"))
            },
            ReconciliationError::NoPaymentForOrder(oid) => Self::NoRecordFound(format!("No payment for order {oid}")),
            ReconciliationError::Database(e @ PaymentGatewayError::OrderAlreadyPaid(_)) => Self::Conflict(e.to_string()),
            ReconciliationError::Database(e @ PaymentGatewayError::IllegalStateChange(_, _)) => {
                Self::Conflict(e.to_string())
            },
            ReconciliationError::InvalidPhone(e) => Self::InvalidRequestBody(e.to_string()),
            ReconciliationError::Signature(e) => Self::ConfigurationError(e.to_string()),
            ReconciliationError::Database(e) => Self::BackendError(e.to_string()),
        }
    }
}
