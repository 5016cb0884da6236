use crate::{
    db_types::Order,
    helpers::{sign_fields, SignatureError, CALLBACK_SIGNATURE_FIELDS, TRANSACTION_SIGNATURE_FIELDS},
    ipay::IpayConfig,
};

// Fixed gateway flags: send the customer an SMS/email receipt, and use the v2 callback rail.
const CUSTOMER_NOTIFICATION: &str = "1";
const CALLBACK_RAIL: &str = "2";

/// An outbound request to the gateway: ordered form fields plus the HMAC digest over the signed
/// subset. The digest is computed from the same field-order constants the callback verifier uses,
/// so a request this builder produces always verifies against its own signature.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    fields: Vec<(&'static str, String)>,
    signature: String,
}

impl SignedRequest {
    /// The complete form body, signature included, ready for URL-encoding.
    pub fn form(&self) -> Vec<(&'static str, &str)> {
        let mut form: Vec<(&'static str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        form.push(("hsh", self.signature.as_str()));
        form
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }
}

/// Build the hosted-payment-page initiation request for an order.
///
/// The order reference doubles as the invoice number, the amount is the order total in minor
/// units, and the channel flags from the configuration are appended unsigned (the gateway does
/// not include them in the digest).
pub fn build_initiation(
    order: &Order,
    phone: &str,
    cfg: &IpayConfig,
) -> Result<SignedRequest, SignatureError> {
    let values = [
        cfg.live_flag().to_string(),
        order.order_id.as_str().to_string(),
        order.order_id.as_str().to_string(),
        order.total_price.to_minor_string(),
        phone.to_string(),
        order.email.clone(),
        cfg.vendor_id.clone(),
        cfg.currency.clone(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        cfg.callback_url.clone(),
        CUSTOMER_NOTIFICATION.to_string(),
        CALLBACK_RAIL.to_string(),
    ];
    let value_refs: Vec<&str> = values.iter().map(String::as_str).collect();
    let signature = sign_fields(cfg.hash_key.reveal(), &value_refs)?;
    let mut fields: Vec<(&'static str, String)> =
        CALLBACK_SIGNATURE_FIELDS.into_iter().zip(values).collect();
    for (channel, flag) in cfg.channels.as_form_fields() {
        fields.push((channel, flag.to_string()));
    }
    Ok(SignedRequest { fields, signature })
}

/// Build a transaction status query for a gateway transaction id.
pub fn build_status_query(transaction_id: &str, cfg: &IpayConfig) -> Result<SignedRequest, SignatureError> {
    build_transaction_request(transaction_id, cfg)
}

/// Build a cancellation request for a gateway transaction id. Same signed fields as a status
/// query; the client distinguishes the two by endpoint path.
pub fn build_cancellation(transaction_id: &str, cfg: &IpayConfig) -> Result<SignedRequest, SignatureError> {
    build_transaction_request(transaction_id, cfg)
}

fn build_transaction_request(transaction_id: &str, cfg: &IpayConfig) -> Result<SignedRequest, SignatureError> {
    let values = [cfg.live_flag().to_string(), cfg.vendor_id.clone(), transaction_id.to_string()];
    let value_refs: Vec<&str> = values.iter().map(String::as_str).collect();
    let signature = sign_fields(cfg.hash_key.reveal(), &value_refs)?;
    let fields = TRANSACTION_SIGNATURE_FIELDS.into_iter().zip(values).collect();
    Ok(SignedRequest { fields, signature })
}
