//! Settled-amount validation. The outcome of this check can only ever downgrade a
//! gateway-reported success; it never turns a reported failure into a success.

use ipg_common::Cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountOutcome {
    Sufficient,
    Insufficient,
    Over,
}

/// Compare the amount the gateway reports as settled against the order total. A currency mismatch
/// is a hard failure and reports `Insufficient` regardless of the numeric comparison.
pub fn validate_amount(paid: Cents, paid_currency: &str, required: Cents, required_currency: &str) -> AmountOutcome {
    if !paid_currency.trim().eq_ignore_ascii_case(required_currency.trim()) {
        return AmountOutcome::Insufficient;
    }
    if paid < required {
        AmountOutcome::Insufficient
    } else if paid > required {
        AmountOutcome::Over
    } else {
        AmountOutcome::Sufficient
    }
}
