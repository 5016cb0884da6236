//! Masking helpers for anything customer-identifying that ends up in log lines. Callback payloads
//! are never persisted, but they do get logged, so phone numbers, email addresses and transaction
//! ids are reduced to just enough to correlate with gateway records.

const MASK: &str = "[FILTERED]";

/// Keep the last two digits, mask the rest.
pub fn mask_phone(phone: &str) -> String {
    if phone.is_empty() {
        return MASK.to_string();
    }
    let n = phone.chars().count();
    phone.chars().enumerate().map(|(i, c)| if i + 2 < n && c.is_ascii_digit() { '*' } else { c }).collect()
}

/// Keep the first character of the local part and the full domain.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap_or('*');
            format!("{first}{}@{domain}", "*".repeat(local.chars().count().saturating_sub(1)))
        },
        _ => MASK.to_string(),
    }
}

/// Keep the first and last four characters of long transaction ids.
pub fn mask_transaction_id(id: &str) -> String {
    let n = id.chars().count();
    if n > 8 {
        let head: String = id.chars().take(4).collect();
        let tail: String = id.chars().skip(n - 4).collect();
        format!("{head}****{tail}")
    } else {
        id.to_string()
    }
}
