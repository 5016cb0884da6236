//! # Gateway signature datastrings
//!
//! Every message exchanged with the gateway is authenticated by an HMAC-SHA1 hex digest over a
//! fixed-order concatenation of field values (no separators), keyed with the merchant's shared
//! secret. The gateway re-derives the digest from the same field order, so the order is a wire
//! contract: a single transposed field makes every signature silently mismatch.
//!
//! This module is the *only* place where the field orders are defined. The callback verifier and
//! the outbound request builder both consume the same constants, which guarantees the
//! sign/verify symmetry by construction. The orders below follow the gateway's documentation:
//!
//! * Callback / initiation: `live oid inv ttl tel eml vid curr p1 p2 p3 p4 cbk cst crl`
//! * Status query / cancellation: `live vid txid`
//!
//! Verification is constant-time and fails closed: a missing field, an empty secret, or a
//! malformed digest all verify as `false` without revealing where the comparison diverged.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

/// The signed fields of an inbound callback or outbound initiation request, in signing order.
pub const CALLBACK_SIGNATURE_FIELDS: [&str; 15] =
    ["live", "oid", "inv", "ttl", "tel", "eml", "vid", "curr", "p1", "p2", "p3", "p4", "cbk", "cst", "crl"];

/// The signed fields of a status query or cancellation request, in signing order.
pub const TRANSACTION_SIGNATURE_FIELDS: [&str; 3] = ["live", "vid", "txid"];

/// Hex digest length of HMAC-SHA1.
const DIGEST_HEX_LEN: usize = 40;

#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    #[error("Cannot sign with an empty secret")]
    EmptySecret,
    #[error("HMAC keys of any length are accepted, so this cannot happen: {0}")]
    InvalidKey(String),
}

/// Compute the lowercase hex HMAC-SHA1 digest over the concatenation of `values` in the order
/// given. Used for outbound signing; the inverse of [`verify_signature`].
pub fn sign_fields(secret: &str, values: &[&str]) -> Result<String, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::EmptySecret);
    }
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    for value in values {
        mac.update(value.as_bytes());
    }
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a received hex digest against the digest of `values` concatenated in order.
///
/// The comparison runs in constant time over the full digest (via the MAC's own verifier). A
/// received value of the wrong length or with non-hex characters is rejected outright, which
/// reveals nothing beyond what the attacker already knows about their own input.
pub fn verify_signature(secret: &str, values: &[&str], received: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    if received.len() != DIGEST_HEX_LEN {
        return false;
    }
    let received = match hex::decode(received) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let mut mac = match HmacSha1::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    for value in values {
        mac.update(value.as_bytes());
    }
    mac.verify_slice(&received).is_ok()
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "demo-secret-key";

    fn callback_values() -> [&'static str; 15] {
        [
            "0",
            "W123456789",
            "W123456789",
            "10000",
            "254712345678",
            "jane@example.com",
            "demo",
            "KES",
            "",
            "",
            "",
            "",
            "https://shop.test/ipay/callback",
            "1",
            "2",
        ]
    }

    // Golden values generated with an independent HMAC-SHA1 implementation.
    const CALLBACK_DIGEST: &str = "f4f64867a7030e552be62f9975f1073b8b84a3a8";
    const TRANSACTION_DIGEST: &str = "6373314305902c02fdb0e4434cb69e8418641f1b";

    #[test]
    fn callback_golden_value() {
        let digest = sign_fields(SECRET, &callback_values()).unwrap();
        assert_eq!(digest, CALLBACK_DIGEST);
        assert!(verify_signature(SECRET, &callback_values(), CALLBACK_DIGEST));
    }

    #[test]
    fn transaction_golden_value() {
        let digest = sign_fields(SECRET, &["0", "demo", "TXN-001"]).unwrap();
        assert_eq!(digest, TRANSACTION_DIGEST);
        assert!(verify_signature(SECRET, &["0", "demo", "TXN-001"], TRANSACTION_DIGEST));
    }

    #[test]
    fn tampering_with_any_field_breaks_verification() {
        let mut values = callback_values();
        for i in 0..values.len() {
            let original = values[i];
            values[i] = "tampered";
            assert!(
                !verify_signature(SECRET, &values, CALLBACK_DIGEST),
                "tampering with field {i} should break verification"
            );
            values[i] = original;
        }
        // and the untampered set still verifies
        assert!(verify_signature(SECRET, &values, CALLBACK_DIGEST));
    }

    #[test]
    fn tampering_with_the_digest_breaks_verification() {
        let mut digest = CALLBACK_DIGEST.to_string();
        digest.replace_range(0..1, "0"); // golden digest starts with 'f'
        assert!(!verify_signature(SECRET, &callback_values(), &digest));
        assert!(!verify_signature(SECRET, &callback_values(), &CALLBACK_DIGEST[..39]));
        assert!(!verify_signature(SECRET, &callback_values(), &format!("{CALLBACK_DIGEST}00")));
        assert!(!verify_signature(SECRET, &callback_values(), "zz".repeat(20).as_str()));
    }

    #[test]
    fn wrong_secret_fails() {
        assert!(!verify_signature("wrong-secret", &callback_values(), CALLBACK_DIGEST));
    }

    #[test]
    fn empty_secret_fails_closed() {
        assert!(sign_fields("", &callback_values()).is_err());
        assert!(!verify_signature("", &callback_values(), CALLBACK_DIGEST));
    }
}
