//! Phone number canonicalization for the gateway's expected local digit format.
//!
//! The gateway expects Kenyan MSISDNs in international format without a leading `+`, e.g.
//! `254712345678`. Customers type numbers in every imaginable shape, so the normalizer accepts
//! the common local forms and rejects everything else:
//!
//! * `0712 345 678` (10 digits, trunk prefix) → `254712345678`
//! * `712345678` (9 digits, no trunk prefix) → `254712345678`
//! * `+254712345678` / `254712345678` → `254712345678`
//!
//! Normalization is idempotent: feeding an already-normalized number through again is a no-op.

use regex::Regex;
use thiserror::Error;

const COUNTRY_CODE: &str = "254";
const TRUNK_PREFIX: char = '0';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid phone number: {0}")]
pub struct PhoneNumberError(pub String);

/// Canonicalize a customer phone number. Returns the normalized digits or a validation error if
/// the input cannot be a valid local mobile number.
pub fn normalize_phone(raw: &str) -> Result<String, PhoneNumberError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(PhoneNumberError("no digits present".to_string()));
    }
    let normalized = match digits.len() {
        10 if digits.starts_with(TRUNK_PREFIX) => format!("{COUNTRY_CODE}{}", &digits[1..]),
        9 if !digits.starts_with(TRUNK_PREFIX) => format!("{COUNTRY_CODE}{digits}"),
        12 if digits.starts_with(COUNTRY_CODE) => digits,
        _ => return Err(PhoneNumberError(format!("unrecognized number shape ({} digits)", digits.len()))),
    };
    let valid = Regex::new(r"^254[17]\d{8}$").unwrap();
    if valid.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(PhoneNumberError("not a valid mobile number".to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalizes_trunk_prefixed_numbers() {
        assert_eq!(normalize_phone("0712345678").unwrap(), "254712345678");
        assert_eq!(normalize_phone("0110123456").unwrap(), "254110123456");
    }

    #[test]
    fn normalizes_bare_subscriber_numbers() {
        assert_eq!(normalize_phone("712345678").unwrap(), "254712345678");
    }

    #[test]
    fn strips_punctuation_and_whitespace() {
        assert_eq!(normalize_phone("+254 712-345-678").unwrap(), "254712345678");
        assert_eq!(normalize_phone("(0712) 345 678").unwrap(), "254712345678");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = ["0712345678", "712345678", "254712345678", "+254712345678"];
        for input in inputs {
            let once = normalize_phone(input).unwrap();
            let twice = normalize_phone(&once).unwrap();
            assert_eq!(once, twice, "double-normalizing {input} changed the result");
        }
    }

    #[test]
    fn local_and_international_forms_agree() {
        assert_eq!(normalize_phone("0712345678").unwrap(), normalize_phone("254712345678").unwrap());
    }

    #[test]
    fn rejects_invalid_shapes() {
        for input in ["", "hello", "12345", "0812345678", "25412345678901", "254212345678"] {
            assert!(normalize_phone(input).is_err(), "{input} should be rejected");
        }
    }
}
