//! Classification of free-text collaborator errors.
//!
//! The storage SDK and wallet report failures as plain messages. Everything
//! that reads those messages lives here as ordered pattern tables.

use std::sync::OnceLock;

use mdw_types::Network;
use regex::Regex;

use crate::error::{FailureKind, SaveFailure};
use crate::flow::StepFailure;

/// Native units per whole WAL.
pub const NATIVE_PER_WAL: u128 = 1_000_000_000;

/// Substrings marking an error as transient network trouble.
const NETWORK_MARKERS: &[&str] = &["too many failures", "network", "timeout", "connection", "fetch"];

/// Tried in order; the first capture wins.
const AMOUNT_PATTERNS: &[&str] = &[
    r"(?i)requested balance[^0-9]*([0-9]+)",
    r"(?i)balance[^0-9]*([0-9]+)",
    r"(?i)to satisfy[^0-9]*([0-9]+)",
    r"(?i)needed[^0-9]*([0-9]+)",
    r"(?i)required[^0-9]*([0-9]+)",
    r"(?i)([0-9]+)[^0-9]*balance",
];

pub const NETWORK_EXHAUSTED_MESSAGE: &str =
    "Storage node connection is unstable, please check your network and try again later";
pub const UPLOAD_TIMEOUT_MESSAGE: &str =
    "Upload timed out, check your network connection and try again";

fn amount_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        AMOUNT_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// How an attempt failure is treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retrying will not help. `required` is in native units.
    InsufficientBalance { required: Option<u128> },
    /// Transient; eligible for retry.
    Network,
    Other,
}

impl ErrorClass {
    /// Only network-class failures are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }
}

/// Whether the message reports too little WAL.
pub fn is_insufficient_balance(message: &str) -> bool {
    (message.contains("Not enough coins") && message.contains("WAL"))
        || message.to_lowercase().contains("insufficient balance")
}

/// Whether the message carries a network marker, case-insensitively.
pub fn is_network_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    NETWORK_MARKERS.iter().any(|m| lower.contains(m))
}

/// Amount captured by the first matching pattern, in native units. The
/// first match is final: a figure that does not fit yields `None`.
pub fn required_amount(message: &str) -> Option<u128> {
    let captures = amount_patterns().iter().find_map(|re| re.captures(message))?;
    captures.get(1)?.as_str().parse().ok()
}

/// Classify a raw message. Balance checks run before network checks, so a
/// balance error that mentions the network is still not retried.
pub fn classify_message(message: &str) -> ErrorClass {
    if is_insufficient_balance(message) {
        ErrorClass::InsufficientBalance {
            required: required_amount(message),
        }
    } else if is_network_error(message) {
        ErrorClass::Network
    } else {
        ErrorClass::Other
    }
}

/// Classify an attempt failure. Upload timeouts count as network errors.
pub fn classify(failure: &StepFailure) -> ErrorClass {
    match failure {
        StepFailure::UploadTimeout(_) => ErrorClass::Network,
        StepFailure::External(e) => classify_message(&e.message),
    }
}

/// The terminal, user-facing failure for an attempt error that will not be
/// retried.
pub fn to_save_failure(failure: &StepFailure, network: Network) -> SaveFailure {
    match (classify(failure), failure) {
        (ErrorClass::InsufficientBalance { required }, _) => {
            let guidance = format!(
                "Get WAL tokens for your wallet, then check your balance at https://walruscan.com/{network}"
            );
            let whole = required.map(|n| n / NATIVE_PER_WAL);
            let message = match whole {
                Some(n) => format!("Insufficient WAL balance, need: {n} WAL"),
                None => "Insufficient WAL balance, make sure your wallet holds enough WAL".to_string(),
            };
            SaveFailure {
                required_wal: whole,
                ..SaveFailure::new(FailureKind::InsufficientBalance, message).with_guidance(guidance)
            }
        }
        (ErrorClass::Network, StepFailure::UploadTimeout(_)) => {
            SaveFailure::new(FailureKind::UploadTimeout, UPLOAD_TIMEOUT_MESSAGE)
        }
        (ErrorClass::Network, StepFailure::External(_)) => {
            SaveFailure::new(FailureKind::NetworkExhausted, NETWORK_EXHAUSTED_MESSAGE)
        }
        (ErrorClass::Other, _) => SaveFailure::new(FailureKind::Other, format!("Save failed: {failure}")),
    }
}
