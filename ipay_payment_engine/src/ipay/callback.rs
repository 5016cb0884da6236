use std::{collections::HashMap, fmt::Display};

use thiserror::Error;

use crate::{
    db_types::OrderId,
    helpers::{mask_email, mask_phone, mask_transaction_id, verify_signature, CALLBACK_SIGNATURE_FIELDS},
    status_codes::CanonicalStatus,
};

#[derive(Debug, Clone, Error)]
pub enum CallbackError {
    #[error("Callback is missing the required field '{0}'")]
    MissingField(&'static str),
}

/// A decoded gateway outcome callback.
///
/// The gateway delivers these as either a form POST or a GET with query parameters; by the time
/// they reach this type they are a flat key-value map. Only `status` and an order reference are
/// required to construct the callback. Everything else, including the signature, is optional at
/// this layer; a missing signature simply never verifies.
///
/// The full field map is retained because signature verification must run over the *exact* values
/// the gateway sent, not over a lossy decoded view of them.
#[derive(Debug, Clone)]
pub struct GatewayCallback {
    pub order_ref: OrderId,
    pub raw_status: String,
    pub status: CanonicalStatus,
    /// Gateway-assigned transaction id (`txncd`).
    pub transaction_id: Option<String>,
    /// Settled amount (`mc`), verbatim. Parsed and validated during reconciliation.
    pub paid_amount: Option<String>,
    pub currency: Option<String>,
    pub payer_phone: Option<String>,
    pub payer_email: Option<String>,
    pub signature: Option<String>,
    fields: HashMap<String, String>,
}

impl GatewayCallback {
    /// Decode a callback from the raw key-value pairs of the request.
    pub fn try_from_fields(fields: HashMap<String, String>) -> Result<Self, CallbackError> {
        let get = |key: &'static str| fields.get(key).filter(|v| !v.is_empty()).cloned();
        let raw_status = get("status").ok_or(CallbackError::MissingField("status"))?;
        let order_ref = get("oid").or_else(|| get("id")).ok_or(CallbackError::MissingField("oid"))?;
        let status = CanonicalStatus::from_vendor_code(&raw_status);
        Ok(Self {
            order_ref: OrderId::from(order_ref),
            status,
            raw_status,
            transaction_id: get("txncd"),
            paid_amount: get("mc"),
            currency: get("curr"),
            payer_phone: get("msisdn_idnum").or_else(|| get("tel")),
            payer_email: get("msisdn_custnum").or_else(|| get("eml")),
            signature: get("hash").or_else(|| get("hsh")),
            fields,
        })
    }

    /// The raw values of the signed fields, in signing order. Returns `None` if the callback is
    /// missing any signed field, in which case verification cannot succeed.
    pub fn signature_values(&self) -> Option<Vec<&str>> {
        CALLBACK_SIGNATURE_FIELDS.iter().map(|&key| self.fields.get(key).map(String::as_str)).collect()
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Authenticate the callback against the merchant's shared secret. Fails closed when any
    /// signed field or the signature itself is missing.
    pub fn verify(&self, secret: &str) -> bool {
        match (self.signature_values(), self.signature.as_deref()) {
            (Some(values), Some(signature)) => verify_signature(secret, &values, signature),
            _ => false,
        }
    }
}

/// Masked rendering for log lines. Customer identifiers are reduced to correlation stubs.
impl Display for GatewayCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "callback[order {}, status {} ({})", self.order_ref, self.status, self.raw_status)?;
        if let Some(txid) = &self.transaction_id {
            write!(f, ", txn {}", mask_transaction_id(txid))?;
        }
        if let Some(amount) = &self.paid_amount {
            write!(f, ", paid {amount}")?;
            if let Some(curr) = &self.currency {
                write!(f, " {curr}")?;
            }
        }
        if let Some(phone) = &self.payer_phone {
            write!(f, ", phone {}", mask_phone(phone))?;
        }
        if let Some(email) = &self.payer_email {
            write!(f, ", email {}", mask_email(email))?;
        }
        write!(f, "]")
    }
}
