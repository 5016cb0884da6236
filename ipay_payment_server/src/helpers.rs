use ipay_payment_engine::db_types::Order;
use subtle::ConstantTimeEq;

/// Check a guest status-poll credential pair against the order.
///
/// Both the access token and the email are compared in constant time, and both comparisons
/// always run, so neither the timing nor the short-circuit behaviour reveals which credential
/// was wrong. Emails are compared case-insensitively; tokens are not.
pub fn guest_credentials_match(order: &Order, token: &str, email: &str) -> bool {
    let token_ok = order.access_token.as_bytes().ct_eq(token.as_bytes());
    let order_email = order.email.to_lowercase();
    let given_email = email.to_lowercase();
    let email_ok = order_email.as_bytes().ct_eq(given_email.as_bytes());
    bool::from(token_ok & email_ok)
}
