use std::time::Duration;

use mdw_chain::ChainError;

/// Errors from a single probe attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The endpoint did not answer within the per-request budget.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The request failed before any response arrived.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The ledger node answered, but not with a checkpoint.
    #[error(transparent)]
    Ledger(#[from] ChainError),

    /// A client could not be built from the configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type ProbeResult<T> = Result<T, ProbeError>;
