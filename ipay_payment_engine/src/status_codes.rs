//! The gateway reports transaction outcomes as opaque alphanumeric tokens. This module owns the
//! complete table of known tokens and folds everything else into [`CanonicalStatus::Unknown`],
//! which downstream code treats as a failure, never as a success.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The engine's stable classification of a payment outcome, decoupled from the gateway's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanonicalStatus {
    Success,
    Pending,
    Failed,
    /// The gateway flagged the transaction code as already used.
    Duplicate,
    InsufficientAmount,
    Overpaid,
    /// A token not in the vendor table. Surfaced for operator review and treated as a failure.
    Unknown,
}

impl CanonicalStatus {
    /// Translate a raw vendor token into a canonical status. The six known tokens map 1:1 onto the
    /// six known-distinct members; anything else is `Unknown`.
    pub fn from_vendor_code(raw: &str) -> CanonicalStatus {
        match raw.trim() {
            "aei7p7yrx4ae34" => CanonicalStatus::Success,
            "bdi6p2yy76etrs" => CanonicalStatus::Pending,
            "fe2707etr5s4wq" => CanonicalStatus::Failed,
            "cr5i3pgy9867e1" => CanonicalStatus::Duplicate,
            "dtfi4p7yty45wq" => CanonicalStatus::InsufficientAmount,
            "eq3i7p5yt7645e" => CanonicalStatus::Overpaid,
            _ => CanonicalStatus::Unknown,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CanonicalStatus::Success)
    }
}

impl Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CanonicalStatus::Success => "Success",
            CanonicalStatus::Pending => "Pending",
            CanonicalStatus::Failed => "Failed",
            CanonicalStatus::Duplicate => "Duplicate",
            CanonicalStatus::InsufficientAmount => "InsufficientAmount",
            CanonicalStatus::Overpaid => "Overpaid",
            CanonicalStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}
